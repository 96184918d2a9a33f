//! crates/feedback_core/src/forms.rs
//!
//! Pure validation of submitted form fields. Each form has a raw input
//! struct (deserialized straight from the request body) and a `validate_*`
//! function returning either the trimmed, validated fields or a map of
//! per-field error messages for inline re-rendering.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Length caps matching the column widths in the schema.
const USERNAME_MAX: usize = 20;
const EMAIL_MAX: usize = 50;
const NAME_MAX: usize = 30;
const TITLE_MAX: usize = 100;

//=========================================================================================
// Field Errors
//=========================================================================================

/// Validation errors keyed by field name, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, ok: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(ok)
        } else {
            Err(self)
        }
    }
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, max: Option<usize>) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(field, "This field is required");
    } else if let Some(max) = max {
        if trimmed.chars().count() > max {
            errors.push(field, format!("Must be at most {max} characters"));
        }
    }
    trimmed.to_string()
}

//=========================================================================================
// Registration
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Trimmed, validated registration fields. The password is deliberately
/// left untrimmed; it is hashed exactly as typed.
#[derive(Debug, Clone)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub fn validate_register(input: &RegisterInput) -> Result<RegisterForm, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = require(&mut errors, "username", &input.username, Some(USERNAME_MAX));
    if input.password.is_empty() {
        errors.push("password", "This field is required");
    }
    let email = require(&mut errors, "email", &input.email, Some(EMAIL_MAX));
    if !email.is_empty() && !email.contains('@') {
        errors.push("email", "Not a valid email address");
    }
    let first_name = require(&mut errors, "first_name", &input.first_name, Some(NAME_MAX));
    let last_name = require(&mut errors, "last_name", &input.last_name, Some(NAME_MAX));

    errors.into_result(RegisterForm {
        username,
        password: input.password.clone(),
        email,
        first_name,
        last_name,
    })
}

//=========================================================================================
// Login
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn validate_login(input: &LoginInput) -> Result<LoginForm, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = require(&mut errors, "username", &input.username, None);
    if input.password.is_empty() {
        errors.push("password", "This field is required");
    }

    errors.into_result(LoginForm {
        username,
        password: input.password.clone(),
    })
}

//=========================================================================================
// Feedback
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
}

pub fn validate_feedback(input: &FeedbackInput) -> Result<FeedbackForm, FieldErrors> {
    let mut errors = FieldErrors::new();
    let title = require(&mut errors, "title", &input.title, Some(TITLE_MAX));
    let content = require(&mut errors, "content", &input.content, None);

    errors.into_result(FeedbackForm { title, content })
}
