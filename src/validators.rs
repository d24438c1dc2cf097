//! Stateless field validators shared by the signup, profile and settings flows.

use chrono::{DateTime, Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static CONTACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^09[0-9]{9}$").expect("valid contact regex"));

const VALID_ROLES: [&str; 3] = ["attendee", "organizer", "staff"];
const VALID_GENDERS: [&str; 4] = ["male", "female", "other", "prefer-not-to-say"];
const STRENGTH_SYMBOLS: &str = "@$!%*?&";
const STRENGTH_LABELS: [&str; 6] = ["Very Weak", "Weak", "Fair", "Good", "Strong", "Very Strong"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCheck {
    pub is_valid: bool,
    pub message: &'static str,
}

impl FieldCheck {
    const fn ok() -> Self {
        Self {
            is_valid: true,
            message: "",
        }
    }

    const fn fail(message: &'static str) -> Self {
        Self {
            is_valid: false,
            message,
        }
    }

    pub fn into_result(self) -> Result<(), &'static str> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.message)
        }
    }
}

pub fn validate_email(email: &str) -> FieldCheck {
    if email.is_empty() {
        return FieldCheck::fail("Email is required");
    }
    if !EMAIL_RE.is_match(email) {
        return FieldCheck::fail("Please enter a valid email address");
    }
    FieldCheck::ok()
}

pub fn validate_password(password: &str) -> FieldCheck {
    if password.is_empty() {
        return FieldCheck::fail("Password is required");
    }
    if password.chars().count() < 8 {
        return FieldCheck::fail("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return FieldCheck::fail("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return FieldCheck::fail("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return FieldCheck::fail("Password must contain at least one number");
    }
    FieldCheck::ok()
}

pub fn validate_name(name: &str) -> FieldCheck {
    if name.is_empty() {
        return FieldCheck::fail("Full name is required");
    }
    let length = name.chars().count();
    if length < 2 {
        return FieldCheck::fail("Name must be at least 2 characters long");
    }
    if length > 50 {
        return FieldCheck::fail("Name must be less than 50 characters");
    }
    FieldCheck::ok()
}

pub fn validate_role(role: &str) -> FieldCheck {
    if role.is_empty() {
        return FieldCheck::fail("Please select a role");
    }
    if !VALID_ROLES.contains(&role.to_lowercase().as_str()) {
        return FieldCheck::fail("Please select a valid role");
    }
    FieldCheck::ok()
}

/// Philippine mobile numbers: `09` followed by nine digits, spaces and dashes ignored.
pub fn validate_contact(contact: &str) -> FieldCheck {
    if contact.is_empty() {
        return FieldCheck::fail("Contact number is required");
    }
    let cleaned = normalize_contact(contact);
    if !CONTACT_RE.is_match(&cleaned) {
        return FieldCheck::fail(
            "Contact must be 11 digits starting with 09 (e.g., 09123456789)",
        );
    }
    FieldCheck::ok()
}

pub fn normalize_contact(contact: &str) -> String {
    contact
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

pub fn validate_birthdate(birthdate: &str) -> FieldCheck {
    validate_birthdate_on(birthdate, Local::now().date_naive())
}

pub fn validate_birthdate_on(birthdate: &str, today: NaiveDate) -> FieldCheck {
    if birthdate.is_empty() {
        return FieldCheck::fail("Birthdate is required");
    }
    let Some(date) = parse_birthdate(birthdate) else {
        return FieldCheck::fail("Please enter a valid date");
    };
    if date > today {
        return FieldCheck::fail("Birthdate cannot be in the future");
    }

    let age = age_on(date, today);
    if age < 13 {
        return FieldCheck::fail("You must be at least 13 years old");
    }
    if age > 120 {
        return FieldCheck::fail("Please enter a valid birthdate");
    }
    FieldCheck::ok()
}

pub fn validate_gender(gender: &str) -> FieldCheck {
    if gender.is_empty() {
        return FieldCheck::fail("Please select your gender");
    }
    if !VALID_GENDERS.contains(&gender.to_lowercase().as_str()) {
        return FieldCheck::fail("Please select a valid gender option");
    }
    FieldCheck::ok()
}

pub fn parse_birthdate(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Whole years elapsed between `born` and `today`.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    age
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: &'static str,
}

/// Strength meter shown next to the password field. It counts a symbol class
/// that [`validate_password`] does not require.
pub fn password_strength(password: &str) -> PasswordStrength {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| STRENGTH_SYMBOLS.contains(c)),
    ];
    let score = checks.iter().filter(|passed| **passed).count() as u8;
    PasswordStrength {
        score,
        label: STRENGTH_LABELS[score as usize],
    }
}
