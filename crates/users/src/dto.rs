//! Request payloads and their validation.
//!
//! Payload fields are optional at the serde level so that a missing field is
//! reported as a validation error (422) instead of a JSON decode failure.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserRole;

pub const NAME_MAX_LEN: usize = 255;
pub const EMAIL_MAX_LEN: usize = 255;
pub const ROLE_MAX_LEN: usize = 64;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});

/// Field → messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("invalid fields: {}", .errors.keys().cloned().collect::<Vec<_>>().join(", "))]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Validated input for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Validated partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required(&mut errors, "name", self.name).and_then(|v| check_name(&mut errors, v));
        let email =
            required(&mut errors, "email", self.email).and_then(|v| check_email(&mut errors, v));
        let role = required(&mut errors, "role", self.role).and_then(|v| check_role(&mut errors, &v));

        match (name, email, role) {
            (Some(name), Some(email), Some(role)) => errors.into_result(NewUser { name, email, role }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let changes = UserChanges {
            name: self.name.and_then(|v| check_name(&mut errors, v)),
            email: self.email.and_then(|v| check_email(&mut errors, v)),
            role: self.role.and_then(|v| check_role(&mut errors, &v)),
        };
        errors.into_result(changes)
    }
}

fn required(errors: &mut ValidationErrors, field: &str, value: Option<String>) -> Option<String> {
    if value.is_none() {
        errors.add(field, "is required");
    }
    value
}

fn check_name(errors: &mut ValidationErrors, value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        errors.add("name", "must not be empty");
        return None;
    }
    if value.chars().count() > NAME_MAX_LEN {
        errors.add("name", format!("must be at most {NAME_MAX_LEN} characters"));
        return None;
    }
    Some(value)
}

fn check_email(errors: &mut ValidationErrors, value: String) -> Option<String> {
    let value = value.trim().to_lowercase();
    if value.chars().count() > EMAIL_MAX_LEN {
        errors.add("email", format!("must be at most {EMAIL_MAX_LEN} characters"));
        return None;
    }
    if !EMAIL_REGEX.is_match(&value) {
        errors.add("email", "must be a valid email address");
        return None;
    }
    Some(value)
}

fn check_role(errors: &mut ValidationErrors, value: &str) -> Option<UserRole> {
    if value.chars().count() > ROLE_MAX_LEN {
        errors.add("role", format!("must be at most {ROLE_MAX_LEN} characters"));
        return None;
    }
    match value.parse() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.add("role", "must be one of: admin, staff");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, email: &str, role: &str) -> CreateUserRequest {
        CreateUserRequest {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
        }
    }

    #[test]
    fn create_normalizes_valid_input() {
        let user = create("  Alice ", " Alice@Example.COM ", "staff").validate().unwrap();
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, UserRole::Staff);
    }

    #[test]
    fn create_reports_every_bad_field() {
        let errors = create("", "not-an-email", "superuser").validate().unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "name", "role"]);
        assert_eq!(errors.messages("role"), ["must be one of: admin, staff"]);
    }

    #[test]
    fn create_requires_all_fields() {
        let errors = CreateUserRequest::default().validate().unwrap_err();
        for field in ["name", "email", "role"] {
            assert_eq!(errors.messages(field), ["is required"]);
        }
    }

    #[test]
    fn create_enforces_length_limits() {
        let long_name = "x".repeat(NAME_MAX_LEN + 1);
        let errors = create(&long_name, "a@b.io", &"r".repeat(ROLE_MAX_LEN + 1))
            .validate()
            .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["name", "role"]);
    }

    #[test]
    fn update_accepts_partial_payloads() {
        let changes = UpdateUserRequest {
            email: Some("new@example.org".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();

        assert_eq!(changes.email.as_deref(), Some("new@example.org"));
        assert!(changes.name.is_none());
        assert!(!changes.is_empty());
        assert!(UpdateUserRequest::default().validate().unwrap().is_empty());
    }

    #[test]
    fn update_still_validates_present_fields() {
        let errors = UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.messages("email"), ["must be a valid email address"]);
    }

    #[test]
    fn errors_serialize_as_a_field_map() {
        let mut errors = ValidationErrors::default();
        errors.add("email", "must be a valid email address");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({ "email": ["must be a valid email address"] }));
    }
}
