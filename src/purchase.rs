//! Event detail loading and ticket booking.

use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::db::StoreError;
use crate::event::Event;
use crate::models::{BookingRequest, PaymentMethod, TicketType};
use crate::prefs::PreferencesReader;
use crate::session::Session;
use crate::views;

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("Please sign in to purchase tickets")]
    NotSignedIn,
    #[error("Your profile is missing an identifier. Please sign out and sign back in.")]
    MissingUserId,
    #[error("We could not determine which event to book.")]
    MissingEventId,
    #[error("Please select a ticket type.")]
    NoTicketType,
    #[error("Please select a payment method.")]
    NoPaymentMethod,
    #[error("This event is sold out.")]
    SoldOut,
    #[error("This event has been cancelled.")]
    Cancelled,
    #[error("We could not find details for this event.")]
    NotFound,
    #[error("Unable to complete the booking. Please try again.")]
    Booking(#[source] ApiError),
    #[error("Unable to load event details right now.")]
    Load(#[from] ApiError),
    #[error("preferences unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Fetches one event and decodes it, presenting the stored organizer
/// profile when the active user owns the event.
pub async fn load_event(
    client: &ApiClient,
    event_id: i64,
    prefs: &PreferencesReader,
    session: &Session,
) -> Result<Event, PurchaseError> {
    let record = client
        .get_event(event_id)
        .await?
        .ok_or(PurchaseError::NotFound)?;
    let mut event = Event::from_record(record);

    if let Some(profile) = prefs.organizer_profile_for(session.user_id())? {
        if event.apply_profile(&profile) {
            tracing::debug!(event_id, "applied stored organizer profile");
        }
    }
    Ok(event)
}

/// Records a detail view. Failures are logged and otherwise ignored.
pub async fn track_view(client: &ApiClient, session: &Session, event_id: i64) {
    if let Err(err) = client
        .track_event_view(event_id, session.user_id(), session.role())
        .await
    {
        tracing::warn!(event_id, %err, "failed to record event view");
    }
}

/// Selections made on the purchase dialog.
#[derive(Debug, Clone, Default)]
pub struct TicketPurchase {
    pub ticket_type: Option<String>,
    pub quantity: i64,
    pub payment_method: Option<PaymentMethod>,
}

impl TicketPurchase {
    /// Preselects the event's first ticket type, as the dialog does when it opens.
    pub fn for_event(event: &Event) -> Self {
        Self {
            ticket_type: event.ticket_types.first().map(|ticket| ticket.name.clone()),
            quantity: 1,
            payment_method: None,
        }
    }

    fn selected_ticket<'a>(&self, event: &'a Event) -> Option<&'a TicketType> {
        let name = self.ticket_type.as_deref()?.trim();
        event.ticket_types.iter().find(|ticket| ticket.name == name)
    }

    /// Runs the booking checks in order and builds the request.
    pub fn prepare(&self, session: &Session, event: &Event) -> Result<BookingRequest, PurchaseError> {
        if !session.is_authenticated() {
            return Err(PurchaseError::NotSignedIn);
        }
        let user_id = session.user_id().ok_or(PurchaseError::MissingUserId)?;
        let event_id = event.id.ok_or(PurchaseError::MissingEventId)?;
        let ticket = self.selected_ticket(event).ok_or(PurchaseError::NoTicketType)?;
        let payment_method = self.payment_method.ok_or(PurchaseError::NoPaymentMethod)?;
        if event.is_cancelled() {
            return Err(PurchaseError::Cancelled);
        }
        if event.is_sold_out() {
            return Err(PurchaseError::SoldOut);
        }

        Ok(BookingRequest {
            user_id,
            event_id,
            quantity: views::clamp_quantity(self.quantity),
            ticket_type: ticket.name.clone(),
            ticket_price: ticket.price,
            payment_method,
        })
    }
}

pub fn success_message(booking: &BookingRequest) -> String {
    let plural = if booking.quantity > 1 { "s" } else { "" };
    format!(
        "Successfully booked {} {} ticket{plural}!",
        booking.quantity, booking.ticket_type
    )
}

/// Books the selected tickets and returns the confirmation message.
pub async fn purchase(
    client: &ApiClient,
    session: &Session,
    event: &Event,
    selection: &TicketPurchase,
) -> Result<String, PurchaseError> {
    let booking = selection.prepare(session, event)?;
    client
        .book_tickets(&booking)
        .await
        .map_err(PurchaseError::Booking)?;
    tracing::info!(
        event_id = booking.event_id,
        quantity = booking.quantity,
        ticket_type = %booking.ticket_type,
        "tickets booked"
    );
    Ok(success_message(&booking))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::event::EventRecord;
    use crate::models::{Role, User};

    fn event(extra: serde_json::Value) -> Event {
        let mut value = json!({
            "eventID": 12,
            "name": "Expo",
            "capacity": 100,
            "ticketsSold": 10,
            "ticketTypes": [
                {"name": "Regular", "price": 250},
                {"name": "VIP", "price": 900}
            ]
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        let record: EventRecord = serde_json::from_value(value).expect("record");
        Event::from_record(record)
    }

    fn session(id: Option<i64>) -> Session {
        Session::signed_in(User {
            id,
            name: "Ana".into(),
            email: "ana@qrush.ph".into(),
            role: Some(Role::Attendee),
            contact: None,
            birthdate: None,
            gender: None,
            avatar: None,
        })
    }

    fn selection() -> TicketPurchase {
        TicketPurchase {
            ticket_type: Some("VIP".into()),
            quantity: 25,
            payment_method: Some(PaymentMethod::Gcash),
        }
    }

    #[test]
    fn builds_a_clamped_booking() {
        let booking = selection().prepare(&session(Some(3)), &event(json!({}))).expect("booking");
        assert_eq!(booking.quantity, 10);
        assert_eq!(booking.ticket_price, 900.0);
        assert_eq!(
            serde_json::to_value(&booking).expect("json"),
            json!({
                "userId": 3,
                "eventId": 12,
                "quantity": 10,
                "ticketType": "VIP",
                "ticketPrice": 900.0,
                "paymentMethod": "GCASH"
            })
        );
        assert_eq!(success_message(&booking), "Successfully booked 10 VIP tickets!");
    }

    #[test]
    fn checks_run_in_order() {
        let ev = event(json!({}));
        let err = selection().prepare(&Session::anonymous(), &ev).unwrap_err();
        assert!(matches!(err, PurchaseError::NotSignedIn));
        let err = selection().prepare(&session(None), &ev).unwrap_err();
        assert!(matches!(err, PurchaseError::MissingUserId));

        let no_type = TicketPurchase {
            ticket_type: Some("Backstage".into()),
            ..selection()
        };
        assert!(matches!(
            no_type.prepare(&session(Some(3)), &ev),
            Err(PurchaseError::NoTicketType)
        ));

        let no_payment = TicketPurchase {
            payment_method: None,
            ..selection()
        };
        let err = no_payment.prepare(&session(Some(3)), &ev).unwrap_err();
        assert_eq!(err.to_string(), "Please select a payment method.");
    }

    #[test]
    fn sold_out_and_cancelled_events_are_refused() {
        let sold_out = event(json!({"ticketsSold": 100}));
        assert!(matches!(
            selection().prepare(&session(Some(3)), &sold_out),
            Err(PurchaseError::SoldOut)
        ));

        let cancelled = event(json!({"status": "cancelled"}));
        assert!(matches!(
            selection().prepare(&session(Some(3)), &cancelled),
            Err(PurchaseError::Cancelled)
        ));
    }

    #[test]
    fn dialog_preselects_first_ticket_type() {
        let picked = TicketPurchase::for_event(&event(json!({})));
        assert_eq!(picked.ticket_type.as_deref(), Some("Regular"));
        assert_eq!(picked.quantity, 1);

        let booking = TicketPurchase {
            payment_method: Some(PaymentMethod::Maya),
            ..picked
        }
        .prepare(&session(Some(3)), &event(json!({})))
        .expect("booking");
        assert_eq!(success_message(&booking), "Successfully booked 1 Regular ticket!");
    }
}
