//! Event records as the backend sends them, and the strict [`Event`] the rest
//! of the crate works with.
//!
//! The backend stores `features`, `agenda` and `ticketTypes` as JSON text.
//! Depending on the server version they arrive as arrays, as JSON strings, or
//! not at all. [`EmbeddedList`] captures those shapes and is decoded exactly
//! once, in [`Event::from_record`].

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{AgendaItem, EventStatus, TicketType};
use crate::prefs::OrganizerProfile;
use crate::views::{self, Availability};

const DEFAULT_TITLE: &str = "Untitled Event";
const DEFAULT_CATEGORY: &str = "event";
const DEFAULT_LOCATION: &str = "Venue to be announced";
const DEFAULT_SUMMARY: &str = "Event details will be available soon.";
const PENDING_ORGANIZER: &str = "Organizer details pending";
const SEGMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum EmbeddedList {
    List(Vec<Value>),
    Legacy(String),
    #[default]
    Absent,
}

impl<'de> Deserialize<'de> for EmbeddedList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => Self::List(items),
            Value::String(text) => Self::Legacy(text),
            Value::Null => Self::Absent,
            other => {
                tracing::warn!(shape = %json_kind(&other), "ignoring embedded list with unexpected shape");
                Self::Absent
            }
        })
    }
}

impl EmbeddedList {
    pub fn decode<T: EmbeddedItem>(&self) -> Vec<T> {
        match self {
            Self::List(items) => decode_items(items),
            Self::Legacy(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Array(items)) => decode_items(&items),
                    Ok(Value::Object(map)) => match T::WRAPPER_KEY.and_then(|key| map.get(key)) {
                        Some(Value::Array(items)) => decode_items(items),
                        _ => {
                            tracing::warn!(kind = T::KIND, "legacy object carries no list");
                            Vec::new()
                        }
                    },
                    Ok(other) => {
                        tracing::warn!(kind = T::KIND, shape = %json_kind(&other), "unexpected legacy value");
                        Vec::new()
                    }
                    Err(err) => {
                        tracing::warn!(kind = T::KIND, %err, "unable to parse legacy data");
                        Vec::new()
                    }
                }
            }
            Self::Absent => Vec::new(),
        }
    }
}

fn decode_items<T: EmbeddedItem>(items: &[Value]) -> Vec<T> {
    items.iter().filter_map(T::from_value).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A record that travels inside an event as an element of a JSON-encoded list.
///
/// `normalized` is shared by the reader and the writer, which keeps
/// decode → encode → decode stable.
pub trait EmbeddedItem: Sized + Serialize {
    const KIND: &'static str;
    /// Key under which older servers wrapped the list in an object.
    const WRAPPER_KEY: Option<&'static str>;

    fn from_value(value: &Value) -> Option<Self>;
    fn normalized(&self) -> Option<Self>;
}

impl EmbeddedItem for String {
    const KIND: &'static str = "features";
    const WRAPPER_KEY: Option<&'static str> = Some("features");

    fn from_value(value: &Value) -> Option<Self> {
        let text = match value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return None,
        };
        text.normalized()
    }

    fn normalized(&self) -> Option<Self> {
        let trimmed = self.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

impl EmbeddedItem for AgendaItem {
    const KIND: &'static str = "agenda";
    const WRAPPER_KEY: Option<&'static str> = Some("agenda");

    fn from_value(value: &Value) -> Option<Self> {
        let item = AgendaItem {
            time: str_field(value, "time").unwrap_or_default(),
            title: str_field(value, "title").unwrap_or_default(),
            speaker: str_field(value, "speaker").unwrap_or_default(),
        };
        item.normalized()
    }

    fn normalized(&self) -> Option<Self> {
        let item = AgendaItem {
            time: self.time.trim().to_string(),
            title: self.title.trim().to_string(),
            speaker: self.speaker.trim().to_string(),
        };
        (!item.is_blank()).then_some(item)
    }
}

impl EmbeddedItem for TicketType {
    const KIND: &'static str = "ticketTypes";
    const WRAPPER_KEY: Option<&'static str> = None;

    fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let features = value
            .get("features")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|f| f.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        let item = TicketType {
            name: str_field(value, "name").unwrap_or_else(|| "Regular".to_string()),
            price: value.get("price").and_then(Value::as_f64).unwrap_or(0.0),
            description: str_field(value, "description").unwrap_or_default(),
            features,
        };
        item.normalized()
    }

    fn normalized(&self) -> Option<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(TicketType {
            name: name.to_string(),
            price: if self.price.is_finite() { self.price } else { 0.0 },
            description: self.description.trim().to_string(),
            features: self.features.iter().filter_map(|f| f.normalized()).collect(),
        })
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Applies the writer-side trim-and-filter funnel.
pub fn sanitize<T: EmbeddedItem>(items: &[T]) -> Vec<T> {
    items.iter().filter_map(EmbeddedItem::normalized).collect()
}

/// Serializes a sanitized list into the JSON text the backend stores.
pub fn encode<T: EmbeddedItem>(items: &[T]) -> String {
    let sanitized = sanitize(items);
    match serde_json::to_string(&sanitized) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(kind = T::KIND, %err, "unable to encode embedded list");
            "[]".to_string()
        }
    }
}

/// The three-part description packed into the single `description` column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct EventDescription {
    pub summary: String,
    pub full: String,
    pub address: String,
}

impl EventDescription {
    /// Splits on blank lines. The last of the trailing segments is taken as
    /// the address, so a description written without one reads back with the
    /// full text in `address`.
    pub fn parse(text: &str) -> Self {
        let segments: Vec<&str> = text
            .split(SEGMENT_SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();

        let summary = segments.first().copied().unwrap_or_default().to_string();
        let rest = segments.get(1..).unwrap_or_default();
        let address = rest.last().copied().unwrap_or_default().to_string();
        let full = if rest.len() > 1 {
            rest[..rest.len() - 1].join(SEGMENT_SEPARATOR)
        } else {
            String::new()
        };

        Self {
            summary,
            full,
            address,
        }
    }

    pub fn compose(&self) -> String {
        [&self.summary, &self.full, &self.address]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }

    pub fn summary_or_default(&self) -> &str {
        if self.summary.is_empty() {
            DEFAULT_SUMMARY
        } else {
            &self.summary
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "eventID", alias = "eventId", alias = "id")]
    pub event_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub ticket_price: Option<f64>,
    pub capacity: Option<u32>,
    pub registered: Option<u32>,
    pub tickets_sold: Option<u32>,
    pub organizer: Option<String>,
    pub organizer_display_name: Option<String>,
    pub organizer_email: Option<String>,
    pub organizer_phone: Option<String>,
    pub organizer_user_id: Option<i64>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub features: EmbeddedList,
    pub agenda: EmbeddedList,
    pub ticket_types: EmbeddedList,
    pub status: Option<EventStatus>,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: Option<i64>,
    pub title: String,
    pub description: EventDescription,
    pub category: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub location: String,
    pub ticket_price: f64,
    pub capacity: u32,
    pub registered: u32,
    /// Account name of the organizer as stored by the backend.
    pub organizer: Option<String>,
    pub organizer_name: String,
    pub organizer_email: String,
    pub organizer_phone: String,
    pub organizer_user_id: Option<i64>,
    pub image: Option<String>,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub features: Vec<String>,
    pub agenda: Vec<AgendaItem>,
    pub ticket_types: Vec<TicketType>,
    pub status: EventStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<String>,
}

impl Event {
    pub fn from_record(record: EventRecord) -> Self {
        let ticket_price = record.ticket_price.unwrap_or(0.0);
        let mut ticket_types: Vec<TicketType> = record.ticket_types.decode();
        if ticket_types.is_empty() {
            ticket_types.push(TicketType::regular(ticket_price));
        }

        let organizer_name = non_empty(record.organizer_display_name)
            .or_else(|| non_empty(record.organizer.clone()))
            .unwrap_or_else(|| PENDING_ORGANIZER.to_string());

        Self {
            id: record.event_id,
            title: non_empty(record.name).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: EventDescription::parse(record.description.as_deref().unwrap_or("")),
            category: non_empty(record.category).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            start: record.start_date.as_deref().and_then(parse_local_datetime),
            end: record.end_date.as_deref().and_then(parse_local_datetime),
            location: non_empty(record.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            ticket_price,
            capacity: record.capacity.unwrap_or(0),
            registered: record.registered.or(record.tickets_sold).unwrap_or(0),
            organizer: record.organizer,
            organizer_name,
            organizer_email: record.organizer_email.unwrap_or_default(),
            organizer_phone: record.organizer_phone.unwrap_or_default(),
            organizer_user_id: record.organizer_user_id,
            image: non_empty(record.image),
            rating: record.rating,
            reviews: record.reviews,
            features: record.features.decode(),
            agenda: record.agenda.decode(),
            ticket_types,
            status: record.status.unwrap_or_default(),
            cancellation_reason: non_empty(record.cancellation_reason),
            cancelled_at: non_empty(record.cancelled_at),
        }
    }

    /// Presents the locally stored organizer profile on this event when the
    /// event is owned by the profile's user. Returns whether it was applied.
    pub fn apply_profile(&mut self, profile: &OrganizerProfile) -> bool {
        let owned = matches!(
            (profile.user_id, self.organizer_user_id),
            (Some(owner), Some(organizer)) if owner == organizer
        );
        if !owned {
            return false;
        }
        if !profile.organization_name.trim().is_empty() {
            self.organizer_name = profile.organization_name.trim().to_string();
        }
        if !profile.email.trim().is_empty() {
            self.organizer_email = profile.email.trim().to_string();
        }
        if !profile.contact_number.trim().is_empty() {
            self.organizer_phone = profile.contact_number.trim().to_string();
        }
        true
    }

    pub fn availability(&self) -> Availability {
        views::availability(self.registered, self.capacity)
    }

    pub fn is_sold_out(&self) -> bool {
        self.availability() == Availability::SoldOut
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == EventStatus::Cancelled
    }

    pub fn starting_price(&self) -> f64 {
        views::starting_price(&self.ticket_types).unwrap_or(self.ticket_price)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

/// Parses the backend's `LocalDateTime` text. Offsets are dropped, keeping
/// the wall-clock time.
pub fn parse_local_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Body sent on create and update. Fields left `None` are omitted, so an
/// update never writes a value the backend did not have.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_types: Option<String>,
}

impl EventPayload {
    /// The write body for an event exactly as the backend stored it. Missing
    /// fields stay missing and legacy JSON text is passed back untouched.
    pub fn from_record(record: &EventRecord) -> Self {
        Self {
            name: record.name.clone(),
            location: record.location.clone(),
            category: record.category.clone(),
            start_date: record.start_date.clone(),
            end_date: record.end_date.clone(),
            ticket_price: record.ticket_price,
            capacity: record.capacity,
            organizer: record.organizer.clone(),
            organizer_display_name: record.organizer_display_name.clone(),
            organizer_email: record.organizer_email.clone(),
            organizer_phone: record.organizer_phone.clone(),
            organizer_user_id: record.organizer_user_id,
            description: record.description.clone(),
            image: record.image.clone(),
            features: passthrough::<String>(&record.features),
            agenda: passthrough::<AgendaItem>(&record.agenda),
            ticket_types: passthrough::<TicketType>(&record.ticket_types),
        }
    }
}

fn passthrough<T: EmbeddedItem>(list: &EmbeddedList) -> Option<String> {
    match list {
        EmbeddedList::List(items) => Some(encode(&decode_items::<T>(items))),
        EmbeddedList::Legacy(text) => Some(text.clone()),
        EmbeddedList::Absent => None,
    }
}
