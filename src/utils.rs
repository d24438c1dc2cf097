use dirs::data_dir;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

static DEFAULT_DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("qrush")
});

pub fn default_data_root() -> PathBuf {
    DEFAULT_DATA_ROOT.clone()
}

pub fn database_path(root: &Path) -> PathBuf {
    root.join("qrush-local.sqlite")
}

pub fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            tracing::warn!(?parent, %err, "failed to create parent directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_lives_under_root() {
        let root = PathBuf::from("/tmp/qrush-test");
        assert_eq!(
            database_path(&root),
            PathBuf::from("/tmp/qrush-test/qrush-local.sqlite")
        );
    }
}
