//! Response policy and endpoint routing of the API client.


use fixtures::{client_for, event_json, json_response};
use reqwest::Method;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qrush_client::models::{LoginRequest, Role};
use qrush_client::{ApiBody, ApiError, Event};

#[tokio::test]
async fn error_status_carries_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/99"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Event not found"))
        .mount(&server)
        .await;

    let err = client_for(&server).get_event(99).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Event not found");
}

#[tokio::test]
async fn error_status_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/events/5"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_event(5).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn no_content_and_empty_bodies_are_none() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/notifications/4/read"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/events/8"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.mark_notification_as_read(4).await.expect("read"), None);
    assert!(client.get_event(8).await.expect("event").is_none());
}

#[tokio::test]
async fn non_json_success_falls_back_to_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/roles/initialize"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Roles initialized"))
        .mount(&server)
        .await;

    let body = client_for(&server).initialize_roles().await.expect("initialize");
    assert_eq!(body, Some(ApiBody::Text("Roles initialized".into())));
}

#[tokio::test]
async fn track_view_sends_identity_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/12/track-view"))
        .and(query_param("userId", "3"))
        .and(query_param("userRole", "attendee"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dashboard/staff"))
        .and(query_param("eventId", "12"))
        .respond_with(json_response(json!({"checkedIn": 4})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .track_event_view(12, Some(3), Some(Role::Attendee))
        .await
        .expect("track");
    let staff = client.get_staff_dashboard(12).await.expect("staff dashboard");
    assert_eq!(staff["checkedIn"], 4);
}

#[tokio::test]
async fn login_posts_credentials_and_maps_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ana@qrush.ph", "password": "Valid123"})))
        .respond_with(json_response(json!({
            "userID": 7,
            "email": "ana@qrush.ph",
            "name": "Ana",
            "role": "ORGANIZER"
        })))
        .mount(&server)
        .await;

    let response = client_for(&server)
        .login(&LoginRequest {
            email: "ana@qrush.ph".into(),
            password: "Valid123".into(),
        })
        .await
        .expect("login");
    assert_eq!(response.user_id, Some(7));
    assert_eq!(response.role.as_deref(), Some("ORGANIZER"));
}

#[tokio::test]
async fn events_decode_legacy_sub_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(json_response(json!([
            event_json(1, 7),
            {"eventID": 3, "capacity": 100.5},
            {"eventID": 2}
        ])))
        .mount(&server)
        .await;

    let records = client_for(&server).get_events().await.expect("events");
    let events: Vec<Event> = records.into_iter().map(Event::from_record).collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].id, Some(2));
    assert_eq!(events[0].ticket_types.len(), 2);
    assert_eq!(events[0].starting_price(), 250.0);
    assert_eq!(events[0].features, vec!["WiFi".to_string()]);
    assert_eq!(events[0].description.address, "SMX Convention Center");
    assert_eq!(events[1].title, "Untitled Event");
}

#[tokio::test]
async fn generic_request_uses_the_same_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/payments/reference/REF%2001"))
        .respond_with(json_response(json!({"reference": "REF 01"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/roles/name/GATE%2FSTAFF"))
        .respond_with(json_response(json!({"roleName": "GATE/STAFF"})))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/custom"))
        .respond_with(json_response(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let payment = client.get_payment_by_reference("REF 01").await.expect("payment");
    assert_eq!(payment["reference"], "REF 01");
    let role = client.get_role_by_name("GATE/STAFF").await.expect("role");
    assert_eq!(role["roleName"], "GATE/STAFF");

    let body = client
        .request(Method::PATCH, "/custom", Some(&json!({"a": 1})))
        .await
        .expect("patch");
    assert_eq!(body, Some(ApiBody::Json(json!({"ok": true}))));
}
