//! crates/feedback_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use uuid::Uuid;

/// Represents a registered user as seen by the rest of the application.
/// Never carries the password hash.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub username: String,
    pub password_hash: String,
}

/// A fully-formed but not yet persisted user record. Produced by
/// registration once the password has been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// A single feedback entry, owned by exactly one user.
#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub username: String,
}

/// Severity tag attached to a flash message, mirroring the CSS classes
/// the views render them with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Danger,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Danger => "danger",
            Severity::Warning => "warning",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Severity::Success),
            "danger" => Some(Severity::Danger),
            "warning" => Some(Severity::Warning),
            _ => None,
        }
    }
}

/// A one-time notification, queued per session and drained on the next
/// rendered view.
#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub severity: Severity,
    pub message: String,
}
