pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod editor;
pub mod event;
pub mod models;
pub mod organizer;
pub mod prefs;
pub mod purchase;
pub mod session;
mod utils;
pub mod validators;
pub mod views;

pub use api::{ApiBody, ApiClient, ApiError};
pub use config::ClientConfig;
pub use db::{Store, StoreError};
pub use event::{EmbeddedList, Event, EventDescription, EventPayload, EventRecord};
pub use models::{PaymentMethod, Role, TicketType, User};
pub use organizer::{BatchReport, Compensation, ItemOutcome, Propagation};
pub use prefs::{PreferencesReader, PreferencesStore};
pub use session::{Session, SessionCache};

/// Everything the terminal front end needs for one run: the HTTP client, the
/// cached session and the preferences store.
pub struct Client {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub sessions: SessionCache,
    pub prefs: PreferencesStore,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unable to open local storage: {0}")]
    Store(#[from] StoreError),
}

impl Client {
    pub fn open(config: ClientConfig) -> Result<Self, SetupError> {
        let api = ApiClient::new(&config)?;
        let sessions = SessionCache::open(&config)?;
        let prefs = PreferencesStore::open(&config)?;
        tracing::debug!(api = %api.base_url(), data_dir = %config.data_dir.display(), "client ready");
        Ok(Self {
            config,
            api,
            sessions,
            prefs,
        })
    }

    pub fn session(&self) -> Result<Session, StoreError> {
        self.sessions.restore()
    }
}
