use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Attendee,
    Organizer,
    Staff,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "attendee" => Some(Self::Attendee),
            "organizer" => Some(Self::Organizer),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attendee => "attendee",
            Self::Organizer => "organizer",
            Self::Staff => "staff",
        }
    }

    /// Role name as the backend expects it on signup.
    pub fn wire_name(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub contact: Option<String>,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub avatar: Option<String>,
}

impl User {
    pub fn from_login(response: LoginResponse) -> Self {
        let avatar = format!(
            "https://api.dicebear.com/7.x/avataaars/svg?seed={}",
            response.email
        );
        Self {
            id: response.user_id,
            name: response.name.unwrap_or_default(),
            role: response.role.as_deref().and_then(Role::parse),
            email: response.email,
            contact: response.contact,
            birthdate: None,
            gender: None,
            avatar: Some(avatar),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LoginResponse {
    #[serde(rename = "userID", alias = "userId", alias = "id")]
    pub user_id: Option<i64>,
    pub email: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub contact: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub contact: String,
    pub birthdate: String,
    pub gender: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SignupResponse {
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(default)]
pub struct TicketType {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
}

impl TicketType {
    pub fn regular(price: f64) -> Self {
        Self {
            name: "Regular".to_string(),
            price,
            description: String::new(),
            features: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AgendaItem {
    pub time: String,
    pub title: String,
    pub speaker: String,
}

impl AgendaItem {
    pub fn is_blank(&self) -> bool {
        self.time.is_empty() && self.title.is_empty() && self.speaker.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Active,
    Published,
    Draft,
    Cancelled,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Gcash,
    Maya,
    CreditCard,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Gcash,
        PaymentMethod::Maya,
        PaymentMethod::CreditCard,
        PaymentMethod::BankTransfer,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_uppercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|method| method.code() == normalized)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Gcash => "GCASH",
            Self::Maya => "MAYA",
            Self::CreditCard => "CREDIT_CARD",
            Self::BankTransfer => "BANK_TRANSFER",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gcash => "GCash",
            Self::Maya => "Maya",
            Self::CreditCard => "Credit/Debit Card",
            Self::BankTransfer => "Bank Transfer",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: i64,
    pub event_id: i64,
    pub quantity: u8,
    pub ticket_type: String,
    pub ticket_price: f64,
    pub payment_method: PaymentMethod,
}

#[derive(Serialize, Debug, Clone)]
pub struct CancelEventRequest<'a> {
    pub reason: &'a str,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct CancelEventResponse {
    pub success: bool,
    pub message: Option<String>,
    pub tickets_refunded: u32,
    pub total_refund_amount: f64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TicketScanRequest {
    pub qr_code: String,
    pub staff_user_id: Option<i64>,
    pub gate: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketScanResponse {
    pub status: String,
    pub message: Option<String>,
    pub ticket_id: Option<i64>,
    pub event_id: Option<i64>,
    pub ticket_number: Option<String>,
    pub attendee_name: Option<String>,
    pub attendee_email: Option<String>,
    pub event_title: Option<String>,
    pub event_start: Option<String>,
    pub event_end: Option<String>,
    pub gate: Option<String>,
    pub re_entry_count: Option<u32>,
    pub already_checked_in: bool,
    pub scanned_at: Option<String>,
    pub previous_scan_at: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendeeDashboard {
    pub active_tickets: u32,
    pub events_attended: u32,
    pub total_spent: f64,
    pub upcoming_tickets: Vec<TicketSummary>,
    pub past_events: Vec<EventHistorySummary>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketSummary {
    pub ticket_id: Option<i64>,
    pub event_id: Option<i64>,
    pub event_title: Option<String>,
    pub event_start: Option<String>,
    pub event_end: Option<String>,
    pub location: Option<String>,
    pub ticket_number: Option<String>,
    pub qr_code: Option<String>,
    pub price: Option<f64>,
    pub status: Option<String>,
    pub event_status: Option<String>,
    pub event_cancellation_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct EventHistorySummary {
    pub event_id: Option<i64>,
    pub event_title: Option<String>,
    pub event_date: Option<String>,
    pub location: Option<String>,
    pub attended: bool,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizerDashboard {
    pub total_events: u32,
    pub total_tickets_sold: u64,
    pub total_revenue: f64,
    pub average_attendance: u32,
    pub events: Vec<OrganizerEventSummary>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OrganizerEventSummary {
    pub event_id: Option<i64>,
    pub title: String,
    pub event_start: Option<String>,
    pub event_end: Option<String>,
    pub status: EventStatus,
    pub tickets_sold: u64,
    pub capacity: u32,
    pub revenue: f64,
    pub views: u64,
    pub cancellation_reason: Option<String>,
    pub location: Option<String>,
    pub ticket_price: Option<f64>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: Option<String>,
    pub related_event_id: Option<i64>,
    pub related_ticket_id: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(default)]
pub struct UnreadCount {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_login_response_to_user() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"userID":7,"email":"ana@qrush.ph","name":"Ana","role":"ORGANIZER","contact":"09123456789"}"#,
        )
        .expect("login json");
        let user = User::from_login(response);
        assert_eq!(user.id, Some(7));
        assert_eq!(user.role, Some(Role::Organizer));
        assert_eq!(
            user.avatar.as_deref(),
            Some("https://api.dicebear.com/7.x/avataaars/svg?seed=ana@qrush.ph")
        );
    }

    #[test]
    fn unknown_statuses_do_not_fail_decoding() {
        let summary: OrganizerEventSummary =
            serde_json::from_str(r#"{"eventId":3,"title":"Expo","status":"archived"}"#)
                .expect("summary json");
        assert_eq!(summary.status, EventStatus::Unknown);
        assert_eq!(summary.capacity, 0);
    }

    #[test]
    fn payment_methods_use_backend_codes() {
        assert_eq!(PaymentMethod::parse("credit-card"), Some(PaymentMethod::CreditCard));
        assert_eq!(PaymentMethod::parse("gcash"), Some(PaymentMethod::Gcash));
        assert_eq!(PaymentMethod::parse("cash"), None);
        assert_eq!(
            serde_json::to_string(&PaymentMethod::BankTransfer).expect("json"),
            "\"BANK_TRANSFER\""
        );
    }

    #[test]
    fn role_round_trips_through_wire_name() {
        assert_eq!(Role::parse("STAFF"), Some(Role::Staff));
        assert_eq!(Role::Attendee.wire_name(), "ATTENDEE");
        assert_eq!(Role::parse("admin"), None);
    }
}
