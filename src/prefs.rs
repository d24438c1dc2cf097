//! Locally persisted organizer and notification preferences.
//!
//! [`PreferencesStore`] is the only handle that can write and is not `Clone`;
//! the settings flow owns it. Screens that only display preferences take a
//! [`PreferencesReader`], which can be cloned freely.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::db::{Store, StoreError};
use crate::models::OrganizerEventSummary;

pub const ORGANIZER_PROFILE_KEY: &str = "qrush_organizer_profile";
pub const ORGANIZER_DEFAULTS_KEY: &str = "qrush_organizer_defaults";
pub const NOTIFICATION_SETTINGS_KEY: &str = "qrush_notification_settings";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizerProfile {
    pub organization_name: String,
    pub email: String,
    pub contact_number: String,
    pub user_id: Option<i64>,
    pub updated_at: Option<String>,
}

impl OrganizerProfile {
    /// Trims the form values, falling back to the account name and email.
    pub fn from_form(
        organization_name: &str,
        email: &str,
        contact_number: &str,
        user: &crate::models::User,
    ) -> Self {
        let pick = |value: &str, fallback: &str| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                fallback.trim().to_string()
            } else {
                trimmed.to_string()
            }
        };
        Self {
            organization_name: pick(organization_name, &user.name),
            email: pick(email, &user.email),
            contact_number: contact_number.trim().to_string(),
            user_id: user.id,
            updated_at: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct EventDefaults {
    pub location: String,
    #[serde(deserialize_with = "lenient_price")]
    pub price: Option<f64>,
}

impl EventDefaults {
    /// Prefills defaults from an existing event, keeping current values for
    /// anything the event does not carry.
    pub fn prefilled_from(&self, event: &OrganizerEventSummary) -> Self {
        let location = event
            .location
            .as_deref()
            .map(str::trim)
            .filter(|loc| !loc.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.location.clone());
        Self {
            location,
            price: event.ticket_price.or(self.price),
        }
    }
}

/// Older clients stored the price straight from a text input.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub event_reminders: bool,
    pub promotions: bool,
    pub sound: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            event_reminders: true,
            promotions: false,
            sound: true,
        }
    }
}

type SharedStore = Arc<Mutex<Store>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct PreferencesReader {
    store: SharedStore,
}

impl PreferencesReader {
    /// The stored organizer profile, unless it belongs to a different user
    /// than `active_user`.
    pub fn organizer_profile_for(
        &self,
        active_user: Option<i64>,
    ) -> Result<Option<OrganizerProfile>, StoreError> {
        let profile: Option<OrganizerProfile> = lock(&self.store).get_json(ORGANIZER_PROFILE_KEY)?;
        Ok(profile.filter(|stored| match (stored.user_id, active_user) {
            (Some(owner), Some(active)) => owner == active,
            _ => true,
        }))
    }

    pub fn event_defaults(&self) -> Result<Option<EventDefaults>, StoreError> {
        lock(&self.store).get_json(ORGANIZER_DEFAULTS_KEY)
    }

    pub fn notification_settings(&self) -> Result<NotificationSettings, StoreError> {
        Ok(lock(&self.store)
            .get_json(NOTIFICATION_SETTINGS_KEY)?
            .unwrap_or_default())
    }
}

pub struct PreferencesStore {
    store: SharedStore,
}

impl PreferencesStore {
    pub fn open(config: &ClientConfig) -> Result<Self, StoreError> {
        Ok(Self::from_store(Store::open(&config.database_path())?))
    }

    pub fn from_store(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    pub fn reader(&self) -> PreferencesReader {
        PreferencesReader {
            store: Arc::clone(&self.store),
        }
    }

    pub fn save_organizer_profile(
        &mut self,
        mut profile: OrganizerProfile,
    ) -> Result<OrganizerProfile, StoreError> {
        profile.updated_at = Some(Utc::now().to_rfc3339());
        lock(&self.store).put_json(ORGANIZER_PROFILE_KEY, &profile)?;
        tracing::debug!(user_id = ?profile.user_id, "organizer profile saved");
        Ok(profile)
    }

    pub fn save_event_defaults(&mut self, defaults: &EventDefaults) -> Result<(), StoreError> {
        lock(&self.store).put_json(ORGANIZER_DEFAULTS_KEY, defaults)
    }

    pub fn save_notification_settings(
        &mut self,
        settings: &NotificationSettings,
    ) -> Result<(), StoreError> {
        lock(&self.store).put_json(NOTIFICATION_SETTINGS_KEY, settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PreferencesStore {
        PreferencesStore::from_store(Store::open_in_memory().expect("store"))
    }

    fn profile(user_id: Option<i64>) -> OrganizerProfile {
        OrganizerProfile {
            organization_name: "Ana Events".into(),
            email: "hello@anaevents.ph".into(),
            contact_number: "09171234567".into(),
            user_id,
            updated_at: None,
        }
    }

    #[test]
    fn profile_is_scoped_to_its_owner() {
        let mut prefs = store();
        let reader = prefs.reader();
        assert_eq!(reader.organizer_profile_for(Some(7)).expect("read"), None);

        let saved = prefs.save_organizer_profile(profile(Some(7))).expect("save");
        assert!(saved.updated_at.is_some());
        assert!(reader.organizer_profile_for(Some(7)).expect("read").is_some());
        assert!(reader.organizer_profile_for(Some(8)).expect("read").is_none());
        assert!(reader.organizer_profile_for(None).expect("read").is_some());
    }

    #[test]
    fn defaults_accept_legacy_string_prices() {
        let raw = Store::open_in_memory().expect("store");
        raw.put_raw(ORGANIZER_DEFAULTS_KEY, r#"{"location":"Cebu","price":"350"}"#)
            .expect("put");
        let prefs = PreferencesStore::from_store(raw);
        let defaults = prefs.reader().event_defaults().expect("read").expect("present");
        assert_eq!(defaults.price, Some(350.0));

        let cleared: EventDefaults =
            serde_json::from_str(r#"{"location":"","price":""}"#).expect("json");
        assert_eq!(cleared.price, None);
    }

    #[test]
    fn notification_settings_default_until_saved() {
        let mut prefs = store();
        let reader = prefs.reader();
        let mut settings = reader.notification_settings().expect("read");
        assert!(!settings.promotions);

        settings.promotions = true;
        prefs.save_notification_settings(&settings).expect("save");
        assert!(reader.notification_settings().expect("read").promotions);
    }

    #[test]
    fn prefill_keeps_current_values_for_gaps() {
        let current = EventDefaults {
            location: "Cebu".into(),
            price: Some(100.0),
        };
        let summary = OrganizerEventSummary {
            ticket_price: Some(250.0),
            ..Default::default()
        };
        let next = current.prefilled_from(&summary);
        assert_eq!(next.location, "Cebu");
        assert_eq!(next.price, Some(250.0));
    }
}
