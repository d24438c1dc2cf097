//! Organizer dashboard actions: cancellation, default settings, the
//! organizer profile and its propagation onto owned events.

use futures_util::stream::{self, StreamExt};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::config::ClientConfig;
use crate::db::StoreError;
use crate::event::EventPayload;
use crate::models::{OrganizerDashboard, OrganizerEventSummary};
use crate::prefs::{EventDefaults, OrganizerProfile, PreferencesReader, PreferencesStore};
use crate::session::Session;
use crate::views;

const DEFAULT_CANCEL_REASON: &str = "Unforeseen circumstances";

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("You must be signed in as an organizer")]
    NotSignedIn,
    #[error("Your profile is missing an identifier. Please sign out and sign back in.")]
    MissingUserId,
    #[error("{0}")]
    CancelRejected(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Unable to update profile right now.")]
    Store(#[from] StoreError),
}

fn organizer_id(session: &Session) -> Result<i64, OrganizerError> {
    if !session.is_authenticated() {
        return Err(OrganizerError::NotSignedIn);
    }
    session.user_id().ok_or(OrganizerError::MissingUserId)
}

pub async fn fetch_dashboard(
    client: &ApiClient,
    session: &Session,
) -> Result<OrganizerDashboard, OrganizerError> {
    let user_id = organizer_id(session)?;
    let dashboard = client.get_organizer_dashboard(user_id).await?;
    tracing::debug!(user_id, events = dashboard.events.len(), "organizer dashboard loaded");
    Ok(dashboard)
}

/// Event ids listed on the dashboard, without duplicates.
pub fn dashboard_event_ids(dashboard: &OrganizerDashboard) -> Vec<i64> {
    let mut ids: Vec<i64> = Vec::with_capacity(dashboard.events.len());
    for id in dashboard.events.iter().filter_map(|event| event.event_id) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Cancels an event and returns the refund summary shown to the organizer.
/// A blank reason is replaced with a generic one.
pub async fn cancel_event(
    client: &ApiClient,
    event_id: i64,
    title: &str,
    reason: &str,
) -> Result<String, OrganizerError> {
    let reason = match reason.trim() {
        "" => DEFAULT_CANCEL_REASON,
        given => given,
    };
    let response = client.cancel_event(event_id, reason).await?;
    if !response.success {
        let message = response
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "Failed to cancel event.".to_string());
        return Err(OrganizerError::CancelRejected(message));
    }

    tracing::info!(event_id, refunded = response.tickets_refunded, "event cancelled");
    Ok(format!(
        "\"{title}\" has been cancelled. {} tickets refunded ({}).",
        response.tickets_refunded,
        views::format_currency(response.total_refund_amount)
    ))
}

/// Current defaults overlaid with what `event` carries.
pub fn prefill_defaults(
    prefs: &PreferencesReader,
    event: &OrganizerEventSummary,
) -> Result<EventDefaults, OrganizerError> {
    let current = prefs.event_defaults()?.unwrap_or_default();
    Ok(current.prefilled_from(event))
}

pub fn save_defaults(
    prefs: &mut PreferencesStore,
    defaults: &EventDefaults,
) -> Result<&'static str, OrganizerError> {
    prefs.save_event_defaults(defaults)?;
    Ok("Default event settings saved.")
}

/// What to do with events that were already updated when a sibling fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compensation {
    #[default]
    Keep,
    Revert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    pub max_concurrent: usize,
    pub compensation: Compensation,
}

impl Propagation {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_concurrent: config.max_concurrent_updates.max(1),
            compensation: Compensation::Keep,
        }
    }

    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        self.compensation = compensation;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Updated,
    Failed(String),
    Reverted,
    RevertFailed(String),
}

/// One outcome per event, in the order the ids were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub items: Vec<(i64, ItemOutcome)>,
}

impl BatchReport {
    pub fn outcome(&self, event_id: i64) -> Option<&ItemOutcome> {
        self.items
            .iter()
            .find(|(id, _)| *id == event_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|(_, outcome)| predicate(outcome)).count()
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, ItemOutcome::Failed(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    pub fn message(&self) -> &'static str {
        if self.is_complete() {
            "Profile and event details updated."
        } else {
            "Profile saved, but some events could not be updated. Please retry later."
        }
    }
}

enum Step {
    Updated(EventPayload),
    Done(ItemOutcome),
}

async fn update_one(client: &ApiClient, event_id: i64, profile: &OrganizerProfile) -> Step {
    let record = match client.get_event(event_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Step::Done(ItemOutcome::Failed("event not found".to_string())),
        Err(err) => return Step::Done(ItemOutcome::Failed(err.to_string())),
    };
    let previous = EventPayload::from_record(&record);

    let mut next = previous.clone();
    next.organizer = record
        .organizer
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| Some(profile.organization_name.clone()));
    next.organizer_display_name = Some(profile.organization_name.clone());
    next.organizer_email = Some(profile.email.clone());
    next.organizer_phone = Some(profile.contact_number.clone());
    next.organizer_user_id = record.organizer_user_id.or(profile.user_id);

    match client.update_event(event_id, &next).await {
        Ok(_) => Step::Updated(previous),
        Err(err) => {
            tracing::error!(event_id, %err, "failed to propagate organizer profile");
            Step::Done(ItemOutcome::Failed(err.to_string()))
        }
    }
}

/// Writes the organizer fields of `profile` onto every event in `event_ids`,
/// at most `max_concurrent` requests at a time. With
/// [`Compensation::Revert`], a failure anywhere restores the previous body of
/// each event that had already been updated.
pub async fn propagate_profile(
    client: &ApiClient,
    profile: &OrganizerProfile,
    event_ids: &[i64],
    propagation: Propagation,
) -> BatchReport {
    let limit = propagation.max_concurrent.max(1);
    let mut steps: Vec<(usize, i64, Step)> = stream::iter(event_ids.iter().copied().enumerate())
        .map(|(position, event_id)| async move {
            (position, event_id, update_one(client, event_id, profile).await)
        })
        .buffer_unordered(limit)
        .collect()
        .await;
    steps.sort_by_key(|(position, _, _)| *position);

    let any_failed = steps
        .iter()
        .any(|(_, _, step)| matches!(step, Step::Done(ItemOutcome::Failed(_))));
    let revert = any_failed && propagation.compensation == Compensation::Revert;

    let items: Vec<(i64, ItemOutcome)> = stream::iter(steps)
        .map(|(_, event_id, step)| async move {
            let outcome = match step {
                Step::Done(outcome) => outcome,
                Step::Updated(_) if !revert => ItemOutcome::Updated,
                Step::Updated(previous) => match client.update_event(event_id, &previous).await {
                    Ok(_) => ItemOutcome::Reverted,
                    Err(err) => {
                        tracing::error!(event_id, %err, "failed to restore event after partial update");
                        ItemOutcome::RevertFailed(err.to_string())
                    }
                },
            };
            (event_id, outcome)
        })
        .buffered(limit)
        .collect()
        .await;

    let report = BatchReport { items };
    if report.is_complete() {
        tracing::info!(events = report.items.len(), "organizer profile propagated");
    } else {
        tracing::warn!(
            failed = report.failed(),
            events = report.items.len(),
            reverted = revert,
            "organizer profile propagated partially"
        );
    }
    report
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub profile: OrganizerProfile,
    pub report: BatchReport,
}

/// Saves the profile locally, then pushes it to the listed events. The
/// local save stands even when propagation fails.
pub async fn save_profile(
    client: &ApiClient,
    prefs: &mut PreferencesStore,
    session: &Session,
    form: &OrganizerProfile,
    event_ids: &[i64],
    propagation: Propagation,
) -> Result<ProfileUpdate, OrganizerError> {
    organizer_id(session)?;
    let user = session.user().ok_or(OrganizerError::NotSignedIn)?;
    let profile = OrganizerProfile::from_form(
        &form.organization_name,
        &form.email,
        &form.contact_number,
        user,
    );
    let profile = prefs.save_organizer_profile(profile)?;
    let report = propagate_profile(client, &profile, event_ids, propagation).await;
    Ok(ProfileUpdate { profile, report })
}
