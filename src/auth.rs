use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDate};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::db::StoreError;
use crate::models::{LoginRequest, Role, SignupRequest, User};
use crate::session::{Session, SessionCache};
use crate::validators::{self, FieldCheck};

const DEFAULT_SIGNUP_MESSAGE: &str = "Account created successfully. Please sign in.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0}")]
    Invalid(FieldErrors),
    #[error("session cache error: {0}")]
    Store(#[from] StoreError),
}

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    fn check(&mut self, field: &'static str, result: FieldCheck) {
        if !result.is_valid {
            self.0.insert(field, result.message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact: String,
    pub birthdate: String,
    pub gender: String,
    pub role: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<SignupRequest, FieldErrors> {
        self.validate_on(Local::now().date_naive())
    }

    /// Runs every field validator so all messages can be shown at once.
    pub fn validate_on(&self, today: NaiveDate) -> Result<SignupRequest, FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.check("name", validators::validate_name(&self.name));
        errors.check("email", validators::validate_email(&self.email));
        errors.check("password", validators::validate_password(&self.password));
        errors.check("contact", validators::validate_contact(&self.contact));
        errors.check(
            "birthdate",
            validators::validate_birthdate_on(&self.birthdate, today),
        );
        errors.check("gender", validators::validate_gender(&self.gender));
        errors.check("role", validators::validate_role(&self.role));

        let role = match Role::parse(&self.role) {
            Some(role) if errors.is_empty() => role,
            _ => return Err(errors),
        };

        Ok(SignupRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role: role.wire_name(),
            contact: self.contact.clone(),
            birthdate: self.birthdate.clone(),
            gender: self.gender.clone(),
        })
    }
}

/// Registers a new account and returns the server's confirmation message.
pub async fn signup(client: &ApiClient, form: &SignupForm) -> Result<String, AuthError> {
    let request = form.validate().map_err(AuthError::Invalid)?;
    let body = client.signup(&request).await?;
    tracing::info!(email = %request.email, role = %request.role, "account created");
    Ok(body
        .and_then(|body| body.message())
        .unwrap_or_else(|| DEFAULT_SIGNUP_MESSAGE.to_string()))
}

pub async fn login(
    client: &ApiClient,
    email: &str,
    password: &str,
    cache: Option<&SessionCache>,
) -> Result<Session, AuthError> {
    let credentials = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    let response = client.login(&credentials).await?;
    let session = Session::signed_in(User::from_login(response));
    if let Some(cache) = cache {
        cache.save(&session)?;
    }
    tracing::info!(user_id = ?session.user_id(), "signed in");
    Ok(session)
}

pub fn logout(cache: &SessionCache) -> Result<Session, AuthError> {
    cache.clear()?;
    Ok(Session::anonymous())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    fn valid_form() -> SignupForm {
        SignupForm {
            name: "Ana Cruz".into(),
            email: "ana@qrush.ph".into(),
            password: "Valid123".into(),
            contact: "0917-123-4567".into(),
            birthdate: "1998-02-14".into(),
            gender: "female".into(),
            role: "Organizer".into(),
        }
    }

    #[test]
    fn valid_form_builds_request_with_upper_case_role() {
        let request = valid_form().validate_on(today()).expect("valid");
        assert_eq!(request.role, "ORGANIZER");
        assert_eq!(request.contact, "0917-123-4567");
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let form = SignupForm {
            password: "short".into(),
            birthdate: "2020-01-01".into(),
            role: String::new(),
            ..valid_form()
        };
        let errors = form.validate_on(today()).expect_err("invalid");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("role"), Some("Please select a role"));
        assert_eq!(errors.get("birthdate"), Some("You must be at least 13 years old"));
        assert!(errors.get("email").is_none());
    }
}
