//! Request field validation rules and their user-facing messages.
//!
//! The functions here plug into `#[validate(custom(function = ...))]` on the
//! HTTP request DTOs. Each returns a [`ValidationError`] whose message is
//! already rendered, so [`field_messages`] can flatten a
//! [`ValidationErrors`] into the `{ field: [message, ...] }` map returned to
//! clients.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationError, ValidationErrors};

use crate::roles::is_known_role;

/// Minimum accepted password length for login, signup and reset.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,4}$";

const PHONE_PATTERN: &str =
    r"^\+[0-9]{1,3}[\s.-]?[(]?[0-9]{3}[)]?[-\s\.]?[0-9]{3}([-\s\.]?[0-9]){4,6}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("valid regex"));

/// Message shown when both passwords in a signup form differ.
pub const PASSWORDS_DO_NOT_MATCH: &str = "Password and Confirm Password do not match";

pub fn required(field: &str) -> String {
    format!("{field} not provided")
}

pub fn invalid_format(field: &str) -> String {
    format!("{field} has invalid format")
}

pub fn min_length(field: &str, length: usize) -> String {
    format!("{field} must be at least {length} characters long")
}

pub fn invalid_value(field: &str) -> String {
    format!("{field} has invalid value")
}

fn rejection(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone_number(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Email must be present and well formed.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(rejection("required", required("Email")));
    }
    if !is_valid_email(email) {
        return Err(rejection("invalid_format", invalid_format("Email")));
    }
    Ok(())
}

/// Password must be present and at least [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(rejection("required", required("Password")));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(rejection(
            "min_length",
            min_length("Password", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Phone number must be present and in international `+<cc> ...` form.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(rejection("required", required("Phone Number")));
    }
    if !is_valid_phone_number(phone) {
        return Err(rejection("invalid_format", invalid_format("Phone Number")));
    }
    Ok(())
}

/// Only called when a role was supplied. A blank role is accepted and, like
/// an absent one, falls back to the default.
pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    if !role.is_empty() && !is_known_role(role) {
        return Err(rejection("invalid_value", invalid_value("Role")));
    }
    Ok(())
}

/// Per-field rendered messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Flatten field-level validation failures into rendered messages.
///
/// Errors without a message fall back to their code so nothing is dropped.
pub fn field_messages(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}
