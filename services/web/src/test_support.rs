//! services/web/src/test_support.rs
//!
//! An in-memory `DatabaseService` for handler tests, mirroring the schema
//! semantics of the Postgres adapter: unique usernames, feedback cascading
//! with its owner, session rows that survive logout, and a per-session
//! flash queue.

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use feedback_core::domain::{Feedback, FlashMessage, NewUser, Severity, User, UserCredentials};
use feedback_core::forms::RegisterForm;
use feedback_core::ports::{DatabaseService, PortError, PortResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::credentials;
use crate::web::session::SessionContext;
use crate::web::state::AppState;

#[derive(Default)]
struct Inner {
    users: HashMap<String, NewUser>,
    feedback: Vec<Feedback>,
    sessions: HashMap<String, Option<String>>,
    flashes: HashMap<String, Vec<FlashMessage>>,
}

#[derive(Default)]
pub struct InMemoryDb {
    inner: Mutex<Inner>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Inspection helpers for assertions ---

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn feedback_rows(&self) -> Vec<Feedback> {
        self.inner.lock().unwrap().feedback.clone()
    }

    /// The username a session is logged in as, `None` when anonymous or
    /// unknown.
    pub fn session_user(&self, session_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .cloned()
            .flatten()
    }

    /// A snapshot of the queued flash messages, without draining them.
    pub fn queued_flashes(&self, session_id: &str) -> Vec<FlashMessage> {
        self.inner
            .lock()
            .unwrap()
            .flashes
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_session(&self, session_id: &str, username: Option<&str>) {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), username.map(str::to_owned));
    }
}

fn to_user(row: &NewUser) -> User {
    User {
        username: row.username.clone(),
        email: row.email.clone(),
        first_name: row.first_name.clone(),
        last_name: row.last_name.clone(),
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.contains_key(&new_user.username) {
            return Err(PortError::Conflict(format!(
                "Username {} already taken",
                new_user.username
            )));
        }
        let user = to_user(&new_user);
        inner.users.insert(new_user.username.clone(), new_user);
        Ok(user)
    }

    async fn get_user(&self, username: &str) -> PortResult<User> {
        self.inner
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(to_user)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials> {
        self.inner
            .lock()
            .unwrap()
            .users
            .get(username)
            .map(|row| UserCredentials {
                username: row.username.clone(),
                password_hash: row.password_hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", username)))
    }

    async fn delete_user(&self, username: &str) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.remove(username).is_none() {
            return Err(PortError::NotFound(format!("User {} not found", username)));
        }
        // ON DELETE CASCADE on feedback, ON DELETE SET NULL on sessions.
        inner.feedback.retain(|f| f.username != username);
        for session in inner.sessions.values_mut() {
            if session.as_deref() == Some(username) {
                *session = None;
            }
        }
        Ok(())
    }

    async fn create_feedback(
        &self,
        title: &str,
        content: &str,
        username: &str,
    ) -> PortResult<Feedback> {
        let feedback = Feedback {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            username: username.to_string(),
        };
        self.inner.lock().unwrap().feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback> {
        self.inner
            .lock()
            .unwrap()
            .feedback
            .iter()
            .find(|f| f.id == feedback_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Feedback {} not found", feedback_id)))
    }

    async fn get_feedback_owner(&self, feedback_id: Uuid) -> PortResult<String> {
        self.get_feedback(feedback_id).await.map(|f| f.username)
    }

    async fn update_feedback(
        &self,
        feedback_id: Uuid,
        title: &str,
        content: &str,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let row = inner
            .feedback
            .iter_mut()
            .find(|f| f.id == feedback_id)
            .ok_or_else(|| PortError::NotFound(format!("Feedback {} not found", feedback_id)))?;
        row.title = title.to_string();
        row.content = content.to_string();
        Ok(())
    }

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.feedback.len();
        inner.feedback.retain(|f| f.id != feedback_id);
        if inner.feedback.len() == before {
            return Err(PortError::NotFound(format!(
                "Feedback {} not found",
                feedback_id
            )));
        }
        Ok(())
    }

    async fn list_feedback_for_user(&self, username: &str) -> PortResult<Vec<Feedback>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .feedback
            .iter()
            .filter(|f| f.username == username)
            .cloned()
            .collect())
    }

    async fn create_session(&self, session_id: &str) -> PortResult<()> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(session_id.to_string(), None);
        Ok(())
    }

    async fn session_username(&self, session_id: &str) -> PortResult<Option<String>> {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn set_session_username(
        &self,
        session_id: &str,
        username: Option<&str>,
    ) -> PortResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let session = inner
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        *session = username.map(str::to_owned);
        Ok(())
    }

    async fn push_flash(
        &self,
        session_id: &str,
        severity: Severity,
        message: &str,
    ) -> PortResult<()> {
        self.inner
            .lock()
            .unwrap()
            .flashes
            .entry(session_id.to_string())
            .or_default()
            .push(FlashMessage {
                severity,
                message: message.to_string(),
            });
        Ok(())
    }

    async fn take_flashes(&self, session_id: &str) -> PortResult<Vec<FlashMessage>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .flashes
            .remove(session_id)
            .unwrap_or_default())
    }
}

//=========================================================================================
// Fixture Helpers
//=========================================================================================

pub fn app_state(db: Arc<InMemoryDb>) -> Arc<AppState> {
    Arc::new(AppState { db })
}

/// A fresh anonymous session, registered in the store the way the
/// middleware would.
pub async fn anon_session(state: &AppState) -> SessionContext {
    let id = Uuid::new_v4().to_string();
    state.db.create_session(&id).await.unwrap();
    SessionContext { id, username: None }
}

pub async fn logged_in_session(state: &AppState, username: &str) -> SessionContext {
    let ctx = anon_session(state).await;
    state
        .db
        .set_session_username(&ctx.id, Some(username))
        .await
        .unwrap();
    SessionContext {
        username: Some(username.to_string()),
        ..ctx
    }
}

/// Registers a user through the real hashing path. The first name is the
/// username with its first letter capitalized ("alice" -> "Alice").
pub async fn insert_user(state: &AppState, username: &str, password: &str) {
    let mut chars = username.chars();
    let first_name = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    let new_user = credentials::register(RegisterForm {
        username: username.to_string(),
        password: password.to_string(),
        email: format!("{username}@example.com"),
        first_name,
        last_name: "Example".to_string(),
    })
    .unwrap();
    state.db.create_user(new_user).await.unwrap();
}

pub async fn insert_feedback(
    state: &AppState,
    username: &str,
    title: &str,
    content: &str,
) -> Feedback {
    state
        .db
        .create_feedback(title, content, username)
        .await
        .unwrap()
}

/// Collects a response body into a string for content assertions.
pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
