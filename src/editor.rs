//! Create and edit form state for events, and the write body built from it.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::event::{
    encode, parse_local_datetime, sanitize, EventDescription, EventPayload, EventRecord,
};
use crate::models::{AgendaItem, TicketType, User};
use crate::prefs::{EventDefaults, OrganizerProfile};
use crate::session::Session;

const DEFAULT_CATEGORY: &str = "technology";
const DEFAULT_PRICE: f64 = 1.0;
const DEFAULT_CAPACITY: u32 = 100;

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("Please fill in all required fields")]
    MissingFields(Vec<&'static str>),
    #[error("invalid {field}: {value}")]
    InvalidSchedule { field: &'static str, value: String },
    #[error("You must be signed in to create an event")]
    NotSignedIn,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("Failed to publish event. Please try again.")]
    Create(#[source] ApiError),
    #[error("Failed to update event. Please try again.")]
    Update(#[source] ApiError),
    #[error("We could not find the event you want to edit.")]
    NotFound,
    #[error("Failed to load event details.")]
    Load(#[source] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    Created,
    Updated,
}

impl Published {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created => "Event published successfully!",
            Self::Updated => "Event updated successfully!",
        }
    }
}

fn default_ticket_types() -> Vec<TicketType> {
    vec![TicketType {
        name: "Regular".to_string(),
        price: 100.0,
        description: "Standard admission".to_string(),
        features: vec![
            "General admission".to_string(),
            "Access to main event".to_string(),
        ],
    }]
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub summary: String,
    pub full_description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub end_time: String,
    pub location: String,
    pub address: String,
    pub category: String,
    pub price: f64,
    pub capacity: u32,
    pub image: Option<String>,
    pub features: Vec<String>,
    pub agenda: Vec<AgendaItem>,
    pub ticket_types: Vec<TicketType>,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            summary: String::new(),
            full_description: String::new(),
            date: String::new(),
            time: String::new(),
            end_time: String::new(),
            location: String::new(),
            address: String::new(),
            category: DEFAULT_CATEGORY.to_string(),
            price: DEFAULT_PRICE,
            capacity: DEFAULT_CAPACITY,
            image: None,
            features: Vec::new(),
            agenda: vec![AgendaItem::default()],
            ticket_types: default_ticket_types(),
        }
    }
}

impl EventDraft {
    /// A blank draft with the organizer's saved location and price applied.
    pub fn new_with_defaults(defaults: Option<&EventDefaults>) -> Self {
        let mut draft = Self::default();
        if let Some(defaults) = defaults {
            if !defaults.location.trim().is_empty() {
                draft.location = defaults.location.trim().to_string();
            }
            if let Some(price) = defaults.price {
                draft.price = price;
            }
        }
        draft
    }

    /// An edit draft for an event as the backend stored it. Blank fields stay
    /// blank so they fail validation instead of picking up display text.
    pub fn from_record(record: &EventRecord) -> Self {
        let start = record.start_date.as_deref().and_then(parse_local_datetime);
        let end = record.end_date.as_deref().and_then(parse_local_datetime);
        let description = EventDescription::parse(record.description.as_deref().unwrap_or(""));

        let mut agenda: Vec<AgendaItem> = record.agenda.decode();
        if agenda.is_empty() {
            agenda.push(AgendaItem::default());
        }
        let mut ticket_types: Vec<TicketType> = record.ticket_types.decode();
        if ticket_types.is_empty() {
            ticket_types = default_ticket_types();
        }

        let defaults = Self::default();
        Self {
            title: record.name.clone().unwrap_or_default(),
            summary: description.summary,
            full_description: description.full,
            date: start
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            time: start.map(|dt| dt.format("%H:%M").to_string()).unwrap_or_default(),
            end_time: end.map(|dt| dt.format("%H:%M").to_string()).unwrap_or_default(),
            location: record.location.clone().unwrap_or_default(),
            address: description.address,
            category: record
                .category
                .clone()
                .filter(|category| !category.trim().is_empty())
                .unwrap_or(defaults.category),
            price: record.ticket_price.unwrap_or(defaults.price),
            capacity: record.capacity.unwrap_or(defaults.capacity),
            image: record.image.clone().filter(|image| !image.trim().is_empty()),
            features: record.features.decode(),
            agenda,
            ticket_types,
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.date.trim().is_empty() {
            missing.push("date");
        }
        if self.time.trim().is_empty() {
            missing.push("time");
        }
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        if self.capacity == 0 {
            missing.push("capacity");
        }
        if !missing.is_empty() {
            return Err(DraftError::MissingFields(missing));
        }

        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            DraftError::InvalidSchedule {
                field: "date",
                value: self.date.clone(),
            }
        })?;
        for (field, value) in [("time", &self.time), ("end time", &self.end_time)] {
            if !value.trim().is_empty() && NaiveTime::parse_from_str(value.trim(), "%H:%M").is_err() {
                return Err(DraftError::InvalidSchedule {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn description(&self) -> EventDescription {
        EventDescription {
            summary: self.summary.clone(),
            full: self.full_description.clone(),
            address: self.address.clone(),
        }
    }

    /// Builds the write body. Organizer contact fields come from the stored
    /// profile when it has them, then from the account.
    pub fn to_payload(
        &self,
        user: &User,
        profile: Option<&OrganizerProfile>,
    ) -> Result<EventPayload, DraftError> {
        self.validate()?;

        let date = self.date.trim();
        let start_time = self.time.trim();
        let end_time = match self.end_time.trim() {
            "" => start_time,
            other => other,
        };

        let ticket_types = sanitize(&self.ticket_types);
        let ticket_price = ticket_types
            .iter()
            .map(|ticket| ticket.price)
            .reduce(f64::min)
            .unwrap_or(self.price);

        let organizer_display_name =
            non_blank(profile.map(|p| p.organization_name.as_str()))
                .unwrap_or(user.name.trim())
                .to_string();
        let organizer_email = non_blank(profile.map(|p| p.email.as_str()))
            .unwrap_or(user.email.trim())
            .to_string();
        let organizer_phone = non_blank(profile.map(|p| p.contact_number.as_str()))
            .unwrap_or_default()
            .to_string();

        Ok(EventPayload {
            name: Some(self.title.trim().to_string()),
            location: Some(self.location.trim().to_string()),
            category: Some(self.category.clone()),
            start_date: Some(format!("{date}T{start_time}:00")),
            end_date: Some(format!("{date}T{end_time}:00")),
            ticket_price: Some(ticket_price),
            capacity: Some(self.capacity),
            organizer: Some(user.name.clone()),
            organizer_display_name: Some(organizer_display_name),
            organizer_email: Some(organizer_email),
            organizer_phone: Some(organizer_phone),
            organizer_user_id: user.id,
            description: Some(self.description().compose()),
            image: self.image.clone().filter(|image| !image.trim().is_empty()),
            features: Some(encode(&self.features)),
            agenda: Some(encode(&self.agenda)),
            ticket_types: Some(encode(&ticket_types)),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Loads an existing event into an edit draft.
pub async fn load_draft(client: &ApiClient, event_id: i64) -> Result<EventDraft, PublishError> {
    let record = client
        .get_event(event_id)
        .await
        .map_err(PublishError::Load)?
        .ok_or(PublishError::NotFound)?;
    Ok(EventDraft::from_record(&record))
}

/// Creates the event, or updates `edit_id` when editing.
pub async fn publish(
    client: &ApiClient,
    session: &Session,
    draft: &EventDraft,
    profile: Option<&OrganizerProfile>,
    edit_id: Option<i64>,
) -> Result<Published, PublishError> {
    let user = session.user().ok_or(DraftError::NotSignedIn)?;
    let payload = draft.to_payload(user, profile)?;

    match edit_id {
        Some(event_id) => {
            client
                .update_event(event_id, &payload)
                .await
                .map_err(PublishError::Update)?;
            tracing::info!(event_id, "event updated");
            Ok(Published::Updated)
        }
        None => {
            client
                .create_event(&payload)
                .await
                .map_err(PublishError::Create)?;
            tracing::info!(name = %draft.title.trim(), "event published");
            Ok(Published::Created)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::EmbeddedList;
    use crate::models::Role;

    fn user() -> User {
        User {
            id: Some(7),
            name: "ana".into(),
            email: "ana@qrush.ph".into(),
            role: Some(Role::Organizer),
            contact: None,
            birthdate: None,
            gender: None,
            avatar: None,
        }
    }

    fn filled() -> EventDraft {
        EventDraft {
            title: "Manila Tech Summit".into(),
            summary: "Talks".into(),
            address: "SMX Convention Center".into(),
            date: "2026-11-20".into(),
            time: "09:00".into(),
            location: "Pasay".into(),
            ..EventDraft::default()
        }
    }

    #[test]
    fn new_drafts_use_saved_defaults() {
        let draft = EventDraft::new_with_defaults(Some(&EventDefaults {
            location: " Cebu ".into(),
            price: Some(350.0),
        }));
        assert_eq!(draft.location, "Cebu");
        assert_eq!(draft.price, 350.0);
        assert_eq!(draft.category, "technology");
        assert_eq!(draft.agenda, vec![AgendaItem::default()]);
        assert_eq!(draft.ticket_types[0].features.len(), 2);
    }

    #[test]
    fn missing_fields_are_listed() {
        let err = EventDraft::default().validate().expect_err("invalid");
        assert_eq!(
            err,
            DraftError::MissingFields(vec!["title", "date", "time", "location"])
        );
        assert_eq!(err.to_string(), "Please fill in all required fields");

        let bad_time = EventDraft {
            time: "9am".into(),
            ..filled()
        };
        assert!(matches!(
            bad_time.validate(),
            Err(DraftError::InvalidSchedule { field: "time", .. })
        ));
    }

    #[test]
    fn payload_uses_start_time_when_end_is_blank() {
        let payload = filled().to_payload(&user(), None).expect("payload");
        assert_eq!(payload.start_date.as_deref(), Some("2026-11-20T09:00:00"));
        assert_eq!(payload.end_date.as_deref(), Some("2026-11-20T09:00:00"));
        assert_eq!(
            payload.description.as_deref(),
            Some("Talks\n\nSMX Convention Center")
        );
        assert_eq!(payload.ticket_price, Some(100.0));
        assert_eq!(payload.organizer_display_name.as_deref(), Some("ana"));
        assert_eq!(payload.organizer_phone.as_deref(), Some(""));
        assert_eq!(payload.agenda.as_deref(), Some("[]"));
        assert_eq!(payload.organizer_user_id, Some(7));
    }

    #[test]
    fn payload_prefers_profile_and_cheapest_ticket() {
        let mut draft = filled();
        draft.end_time = "17:30".into();
        draft.ticket_types.push(TicketType {
            name: "Student".into(),
            price: 50.0,
            ..TicketType::default()
        });
        draft.ticket_types.push(TicketType {
            name: "  ".into(),
            price: 1.0,
            ..TicketType::default()
        });
        let profile = OrganizerProfile {
            organization_name: "Ana Events".into(),
            email: String::new(),
            contact_number: "09171234567".into(),
            user_id: Some(7),
            updated_at: None,
        };
        let payload = draft.to_payload(&user(), Some(&profile)).expect("payload");
        assert_eq!(payload.end_date.as_deref(), Some("2026-11-20T17:30:00"));
        assert_eq!(payload.ticket_price, Some(50.0));
        assert_eq!(payload.organizer.as_deref(), Some("ana"));
        assert_eq!(payload.organizer_display_name.as_deref(), Some("Ana Events"));
        assert_eq!(payload.organizer_email.as_deref(), Some("ana@qrush.ph"));
        assert_eq!(payload.organizer_phone.as_deref(), Some("09171234567"));

        let types: Vec<TicketType> =
            EmbeddedList::Legacy(payload.ticket_types.unwrap_or_default()).decode();
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn no_ticket_types_falls_back_to_draft_price() {
        let draft = EventDraft {
            ticket_types: Vec::new(),
            price: 250.0,
            ..filled()
        };
        let payload = draft.to_payload(&user(), None).expect("payload");
        assert_eq!(payload.ticket_price, Some(250.0));
    }

    #[test]
    fn edit_drafts_round_trip_an_event() {
        let record: EventRecord = serde_json::from_value(json!({
            "eventID": 4,
            "name": "Expo",
            "description": "Short\n\nLong\n\nHall A",
            "location": "Cebu",
            "startDate": "2026-12-01T10:00:00",
            "endDate": "2026-12-01T18:15:00",
            "capacity": 50,
            "ticketPrice": 0,
            "ticketTypes": "[{\"name\":\"Early bird\",\"price\":0}]"
        }))
        .expect("record");
        let draft = EventDraft::from_record(&record);
        assert_eq!(draft.date, "2026-12-01");
        assert_eq!(draft.time, "10:00");
        assert_eq!(draft.end_time, "18:15");
        assert_eq!(draft.full_description, "Long");
        assert_eq!(draft.address, "Hall A");
        assert_eq!(draft.agenda.len(), 1);
        assert_eq!(draft.ticket_types[0].name, "Early bird");

        let payload = draft.to_payload(&user(), None).expect("payload");
        assert_eq!(payload.description.as_deref(), Some("Short\n\nLong\n\nHall A"));
        assert_eq!(payload.ticket_price, Some(0.0));
    }

    #[test]
    fn edit_drafts_keep_missing_fields_blank() {
        let record: EventRecord =
            serde_json::from_value(json!({"eventID": 9, "startDate": "2026-11-20T09:00:00"}))
                .expect("record");
        let draft = EventDraft::from_record(&record);
        assert_eq!(draft.title, "");
        assert_eq!(draft.category, "technology");
        assert_eq!(draft.ticket_types, default_ticket_types());
        assert_eq!(
            draft.validate(),
            Err(DraftError::MissingFields(vec!["title", "location"]))
        );
    }
}
