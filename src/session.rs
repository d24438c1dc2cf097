use crate::config::ClientConfig;
use crate::db::{Store, StoreError};
use crate::models::{Role, User};

pub const SESSION_USER_KEY: &str = "qrush_user";

/// The signed-in user, passed explicitly into every flow that needs one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().and_then(|user| user.id)
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|user| user.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Keeps the session user across runs of the terminal client.
pub struct SessionCache {
    store: Store,
}

impl SessionCache {
    pub fn open(config: &ClientConfig) -> Result<Self, StoreError> {
        Ok(Self {
            store: Store::open(&config.database_path())?,
        })
    }

    pub fn from_store(store: Store) -> Self {
        Self { store }
    }

    pub fn restore(&self) -> Result<Session, StoreError> {
        Ok(Session {
            user: self.store.get_json(SESSION_USER_KEY)?,
        })
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        match session.user() {
            Some(user) => self.store.put_json(SESSION_USER_KEY, user),
            None => self.store.remove(SESSION_USER_KEY),
        }
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(SESSION_USER_KEY)
    }
}
