use std::{path::PathBuf, time::Duration};

use crate::utils;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_USER_AGENT: &str = "qrush-client/0.1";
const DEFAULT_MAX_CONCURRENT_UPDATES: usize = 4;

/// Runtime settings for the API client and the local preferences store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub user_agent: String,
    pub data_dir: PathBuf,
    /// `None` keeps requests unbounded, which is what the web client did.
    pub request_timeout: Option<Duration>,
    pub max_concurrent_updates: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: utils::default_data_root(),
            request_timeout: None,
            max_concurrent_updates: DEFAULT_MAX_CONCURRENT_UPDATES,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base_url = non_empty("QRUSH_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);
        let user_agent = non_empty("QRUSH_USER_AGENT").unwrap_or(defaults.user_agent);
        let data_dir = non_empty("QRUSH_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let request_timeout = non_empty("QRUSH_HTTP_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let max_concurrent_updates = non_empty("QRUSH_MAX_CONCURRENT_UPDATES")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.max_concurrent_updates);

        Self {
            api_base_url,
            user_agent,
            data_dir,
            request_timeout,
            max_concurrent_updates,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn database_path(&self) -> PathBuf {
        utils::database_path(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.max_concurrent_updates, 4);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("QRUSH_API_URL", "https://api.qrush.ph/api/"),
            ("QRUSH_DATA_DIR", "/var/lib/qrush"),
            ("QRUSH_HTTP_TIMEOUT_SECS", "15"),
            ("QRUSH_MAX_CONCURRENT_UPDATES", "zero"),
        ]));
        assert_eq!(config.api_base_url, "https://api.qrush.ph/api");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/qrush"));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.max_concurrent_updates, 4);
    }
}
