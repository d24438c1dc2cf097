use reqwest::{header::CONTENT_TYPE, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::event::{EventPayload, EventRecord};
use crate::models::{
    AttendeeDashboard, BookingRequest, CancelEventRequest, CancelEventResponse, LoginRequest,
    LoginResponse, Notification, OrganizerDashboard, Role, SignupRequest, TicketScanRequest,
    TicketScanResponse, UnreadCount,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("empty response from {endpoint}")]
    EmptyBody { endpoint: String },
    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// A successful response body. Bodies that are not valid JSON are kept as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Text(String),
}

impl ApiBody {
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }

    /// Human readable message carried by the body, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            Self::Text(text) => Some(text.clone()).filter(|t| !t.trim().is_empty()),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one request and applies the response policy: non-2xx fails with
    /// the body text, 204 and empty bodies yield `None`, anything else is
    /// parsed as JSON with a fallback to raw text.
    pub async fn request<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Option<ApiBody>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request_with_query(method, endpoint, &[], body).await
    }

    async fn request_with_query<B>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Option<ApiBody>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%method, %url, ?query, "api request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            tracing::error!(%method, %url, %err, "api request failed");
            ApiError::Http(err)
        })?;
        let status = response.status();

        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(%method, %url, %err, "failed to read error response body");
                    String::new()
                }
            };
            let message = if text.is_empty() {
                format!("HTTP error! status: {}", status.as_u16())
            } else {
                text
            };
            tracing::error!(%method, %url, status = status.as_u16(), "api request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let text = response.text().await?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(match serde_json::from_str(&text) {
            Ok(value) => ApiBody::Json(value),
            Err(_) => ApiBody::Text(text),
        }))
    }

    async fn send(&self, method: Method, endpoint: &str) -> Result<Option<ApiBody>, ApiError> {
        self.request::<()>(method, endpoint, None).await
    }

    async fn send_json<B>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<Option<ApiBody>, ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.request(method, endpoint, Some(body)).await
    }

    async fn get_value(&self, endpoint: &str) -> Result<Value, ApiError> {
        Ok(self
            .send(Method::GET, endpoint)
            .await?
            .map(ApiBody::into_value)
            .unwrap_or(Value::Null))
    }

    async fn get_typed<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let body = self.send(Method::GET, endpoint).await?;
        decode_body(endpoint, body)
    }

    // auth

    pub async fn signup(&self, request: &SignupRequest) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/auth/signup", request).await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let body = self.send_json(Method::POST, "/auth/login", credentials).await?;
        decode_body("/auth/login", body)
    }

    pub async fn get_user_profile(&self, user_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/users/{user_id}")).await
    }

    // events

    /// Records that fail to decode are logged and left out of the list.
    pub async fn get_events(&self) -> Result<Vec<EventRecord>, ApiError> {
        let body = self.send(Method::GET, "/events").await?;
        let items: Vec<Value> = match body {
            None => return Ok(Vec::new()),
            some => decode_body("/events", some)?,
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<EventRecord>(item) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(%err, "skipping event that failed to decode");
                    None
                }
            })
            .collect())
    }

    /// `None` when the backend answers with an empty body.
    pub async fn get_event(&self, event_id: i64) -> Result<Option<EventRecord>, ApiError> {
        let endpoint = format!("/events/{event_id}");
        match self.send(Method::GET, &endpoint).await? {
            None | Some(ApiBody::Json(Value::Null)) => Ok(None),
            some => decode_body(&endpoint, some).map(Some),
        }
    }

    pub async fn create_event(&self, payload: &EventPayload) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/events", payload).await
    }

    pub async fn update_event(
        &self,
        event_id: i64,
        payload: &EventPayload,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::PUT, &format!("/events/{event_id}"), payload)
            .await
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/events/{event_id}")).await
    }

    pub async fn track_event_view(
        &self,
        event_id: i64,
        user_id: Option<i64>,
        user_role: Option<Role>,
    ) -> Result<Option<ApiBody>, ApiError> {
        let mut query = Vec::new();
        if let Some(id) = user_id {
            query.push(("userId", id.to_string()));
        }
        if let Some(role) = user_role {
            query.push(("userRole", role.as_str().to_string()));
        }
        self.request_with_query::<()>(
            Method::POST,
            &format!("/events/{event_id}/track-view"),
            &query,
            None,
        )
        .await
    }

    pub async fn cancel_event(
        &self,
        event_id: i64,
        reason: &str,
    ) -> Result<CancelEventResponse, ApiError> {
        let endpoint = format!("/events/{event_id}/cancel");
        let body = self
            .send_json(Method::POST, &endpoint, &CancelEventRequest { reason })
            .await?;
        decode_body(&endpoint, body)
    }

    pub async fn can_delete_event(&self, event_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/events/{event_id}/can-delete"))
            .await
    }

    // tickets

    pub async fn book_tickets(&self, booking: &BookingRequest) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/tickets/book", booking).await
    }

    pub async fn get_ticket(&self, ticket_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/tickets/{ticket_id}")).await
    }

    pub async fn scan_ticket(
        &self,
        scan: &TicketScanRequest,
    ) -> Result<TicketScanResponse, ApiError> {
        let body = self.send_json(Method::POST, "/tickets/scan", scan).await?;
        decode_body("/tickets/scan", body)
    }

    pub async fn manual_verify_ticket<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/tickets/manual-verify", payload)
            .await
    }

    pub async fn bulk_check_in<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/tickets/bulk-check-in", payload)
            .await
    }

    // dashboards

    pub async fn get_attendee_dashboard(&self, user_id: i64) -> Result<AttendeeDashboard, ApiError> {
        self.get_typed(&format!("/dashboard/attendee/{user_id}")).await
    }

    pub async fn get_organizer_dashboard(
        &self,
        user_id: i64,
    ) -> Result<OrganizerDashboard, ApiError> {
        self.get_typed(&format!("/dashboard/organizer/{user_id}")).await
    }

    pub async fn get_staff_dashboard(&self, event_id: i64) -> Result<Value, ApiError> {
        let body = self
            .request_with_query::<()>(
                Method::GET,
                "/dashboard/staff",
                &[("eventId", event_id.to_string())],
                None,
            )
            .await?;
        Ok(body.map(ApiBody::into_value).unwrap_or(Value::Null))
    }

    // notifications

    pub async fn get_notifications(&self, user_id: i64) -> Result<Vec<Notification>, ApiError> {
        self.get_typed(&format!("/notifications/user/{user_id}")).await
    }

    pub async fn get_unread_notifications(
        &self,
        user_id: i64,
    ) -> Result<Vec<Notification>, ApiError> {
        self.get_typed(&format!("/notifications/user/{user_id}/unread"))
            .await
    }

    pub async fn get_unread_notification_count(&self, user_id: i64) -> Result<UnreadCount, ApiError> {
        self.get_typed(&format!("/notifications/user/{user_id}/unread-count"))
            .await
    }

    pub async fn mark_notification_as_read(
        &self,
        notification_id: i64,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::PUT, &format!("/notifications/{notification_id}/read"))
            .await
    }

    pub async fn mark_all_notifications_as_read(
        &self,
        user_id: i64,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::PUT, &format!("/notifications/user/{user_id}/read-all"))
            .await
    }

    pub async fn delete_notification(
        &self,
        notification_id: i64,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/notifications/{notification_id}"))
            .await
    }

    pub async fn delete_all_notifications(
        &self,
        user_id: i64,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/notifications/user/{user_id}"))
            .await
    }

    // roles

    pub async fn get_roles(&self) -> Result<Value, ApiError> {
        self.get_value("/roles").await
    }

    pub async fn get_role_by_id(&self, role_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/roles/{role_id}")).await
    }

    pub async fn get_role_by_name(&self, role_name: &str) -> Result<Value, ApiError> {
        self.get_value(&format!("/roles/name/{}", urlencoding::encode(role_name)))
            .await
    }

    pub async fn create_role<P: Serialize + ?Sized>(
        &self,
        role: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/roles", role).await
    }

    pub async fn update_role<P: Serialize + ?Sized>(
        &self,
        role_id: i64,
        role: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::PUT, &format!("/roles/{role_id}"), role)
            .await
    }

    pub async fn delete_role(&self, role_id: i64) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/roles/{role_id}")).await
    }

    pub async fn initialize_roles(&self) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::POST, "/roles/initialize").await
    }

    // payments

    pub async fn get_payments(&self) -> Result<Value, ApiError> {
        self.get_value("/payments").await
    }

    pub async fn get_payment_by_id(&self, payment_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/payments/{payment_id}")).await
    }

    pub async fn get_payments_by_user(&self, user_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/payments/user/{user_id}")).await
    }

    pub async fn get_payments_by_event(&self, event_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/payments/event/{event_id}")).await
    }

    pub async fn get_payment_by_reference(&self, reference: &str) -> Result<Value, ApiError> {
        self.get_value(&format!(
            "/payments/reference/{}",
            urlencoding::encode(reference)
        ))
        .await
    }

    pub async fn create_payment<P: Serialize + ?Sized>(
        &self,
        payment: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/payments", payment).await
    }

    pub async fn update_payment<P: Serialize + ?Sized>(
        &self,
        payment_id: i64,
        payment: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::PUT, &format!("/payments/{payment_id}"), payment)
            .await
    }

    pub async fn delete_payment(&self, payment_id: i64) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/payments/{payment_id}"))
            .await
    }

    // attendance logs

    pub async fn get_attendance_logs(&self) -> Result<Value, ApiError> {
        self.get_value("/attendance").await
    }

    pub async fn get_attendance_log_by_id(&self, log_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/attendance/{log_id}")).await
    }

    pub async fn get_attendance_logs_by_user(&self, user_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/attendance/user/{user_id}")).await
    }

    pub async fn get_attendance_logs_by_event(&self, event_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/attendance/event/{event_id}")).await
    }

    pub async fn get_recent_attendance_logs_by_event(
        &self,
        event_id: i64,
    ) -> Result<Value, ApiError> {
        self.get_value(&format!("/attendance/event/{event_id}/recent"))
            .await
    }

    pub async fn get_attendance_stats_by_event(&self, event_id: i64) -> Result<Value, ApiError> {
        self.get_value(&format!("/attendance/event/{event_id}/stats"))
            .await
    }

    pub async fn create_attendance_log<P: Serialize + ?Sized>(
        &self,
        log: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::POST, "/attendance", log).await
    }

    pub async fn update_attendance_log<P: Serialize + ?Sized>(
        &self,
        log_id: i64,
        log: &P,
    ) -> Result<Option<ApiBody>, ApiError> {
        self.send_json(Method::PUT, &format!("/attendance/{log_id}"), log)
            .await
    }

    pub async fn delete_attendance_log(&self, log_id: i64) -> Result<Option<ApiBody>, ApiError> {
        self.send(Method::DELETE, &format!("/attendance/{log_id}"))
            .await
    }
}

fn decode_body<T: DeserializeOwned>(endpoint: &str, body: Option<ApiBody>) -> Result<T, ApiError> {
    match body {
        Some(ApiBody::Json(value)) => {
            serde_json::from_value(value).map_err(|err| ApiError::Decode {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            })
        }
        Some(ApiBody::Text(text)) => Err(ApiError::Decode {
            endpoint: endpoint.to_string(),
            reason: format!("expected JSON, got text: {text}"),
        }),
        None => Err(ApiError::EmptyBody {
            endpoint: endpoint.to_string(),
        }),
    }
}
