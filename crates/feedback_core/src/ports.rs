//! crates/feedback_core/src/ports.rs
//!
//! Defines the service contract (trait) for the application's persistence.
//! The trait forms the boundary of the hexagonal architecture, keeping the
//! handlers independent of the concrete database implementation.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Feedback, FlashMessage, NewUser, Severity, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the underlying store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The referenced row does not exist. Kept distinct so handlers can
    /// turn it into a 404 or a flash-and-redirect rather than a 500.
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was violated, e.g. a duplicate username on
    /// registration. The only store failure handlers recover from.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port (Trait)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    /// Persists a registered user. A duplicate username yields
    /// `PortError::Conflict` and leaves the store unchanged.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user(&self, username: &str) -> PortResult<User>;

    /// Username plus stored password hash, for login only.
    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials>;

    /// Deletes a user together with all feedback they own.
    async fn delete_user(&self, username: &str) -> PortResult<()>;

    // --- Feedback ---
    async fn create_feedback(
        &self,
        title: &str,
        content: &str,
        username: &str,
    ) -> PortResult<Feedback>;

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback>;

    /// Owner lookup for the authorization check, without loading the whole
    /// record.
    async fn get_feedback_owner(&self, feedback_id: Uuid) -> PortResult<String>;

    /// Mutates title and content in place; the owner never changes.
    async fn update_feedback(&self, feedback_id: Uuid, title: &str, content: &str)
        -> PortResult<()>;

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()>;

    async fn list_feedback_for_user(&self, username: &str) -> PortResult<Vec<Feedback>>;

    // --- Sessions and Flash Messages ---
    async fn create_session(&self, session_id: &str) -> PortResult<()>;

    /// The authenticated username for a session, `None` when anonymous.
    /// An unknown session id is `NotFound`.
    async fn session_username(&self, session_id: &str) -> PortResult<Option<String>>;

    /// Login sets the username, logout clears it. Clearing an already
    /// anonymous session is a no-op.
    async fn set_session_username(
        &self,
        session_id: &str,
        username: Option<&str>,
    ) -> PortResult<()>;

    async fn push_flash(
        &self,
        session_id: &str,
        severity: Severity,
        message: &str,
    ) -> PortResult<()>;

    /// Returns and removes the session's queued flash messages, oldest
    /// first.
    async fn take_flashes(&self, session_id: &str) -> PortResult<Vec<FlashMessage>>;
}
