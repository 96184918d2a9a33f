//! services/web/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedback_core::domain::{Feedback, FlashMessage, NewUser, Severity, User, UserCredentials};
use feedback_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::error::ErrorKind;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err)
        if matches!(db_err.kind(), ErrorKind::UniqueViolation))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    username: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            username: self.username,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    title: String,
    content: String,
    username: String,
}
impl FeedbackRecord {
    fn to_domain(self) -> Feedback {
        Feedback {
            id: self.id,
            title: self.title,
            content: self.content,
            username: self.username,
        }
    }
}

#[derive(FromRow)]
struct FlashRecord {
    severity: String,
    message: String,
    created_at: DateTime<Utc>,
}
impl FlashRecord {
    fn to_domain(self) -> PortResult<FlashMessage> {
        let severity = Severity::parse(&self.severity).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown flash severity '{}'", self.severity))
        })?;
        Ok(FlashMessage {
            severity,
            message: self.message,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        sqlx::query(
            "INSERT INTO users (username, password_hash, email, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::Conflict(format!("Username {} already taken", new_user.username))
            } else {
                unexpected(e)
            }
        })?;

        Ok(User {
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
        })
    }

    async fn get_user(&self, username: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT username, email, first_name, last_name FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_credentials(&self, username: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", username)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn delete_user(&self, username: &str) -> PortResult<()> {
        // Feedback rows go with the user via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", username)));
        }
        Ok(())
    }

    async fn create_feedback(
        &self,
        title: &str,
        content: &str,
        username: &str,
    ) -> PortResult<Feedback> {
        let record = sqlx::query_as::<_, FeedbackRecord>(
            "INSERT INTO feedback (id, title, content, username) VALUES ($1, $2, $3, $4) \
             RETURNING id, title, content, username",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(content)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_feedback(&self, feedback_id: Uuid) -> PortResult<Feedback> {
        let record = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT id, title, content, username FROM feedback WHERE id = $1",
        )
        .bind(feedback_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Feedback {} not found", feedback_id))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_feedback_owner(&self, feedback_id: Uuid) -> PortResult<String> {
        sqlx::query_scalar::<_, String>("SELECT username FROM feedback WHERE id = $1")
            .bind(feedback_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Feedback {} not found", feedback_id))
                }
                _ => unexpected(e),
            })
    }

    async fn update_feedback(
        &self,
        feedback_id: Uuid,
        title: &str,
        content: &str,
    ) -> PortResult<()> {
        let result = sqlx::query("UPDATE feedback SET title = $1, content = $2 WHERE id = $3")
            .bind(title)
            .bind(content)
            .bind(feedback_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Feedback {} not found",
                feedback_id
            )));
        }
        Ok(())
    }

    async fn delete_feedback(&self, feedback_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Feedback {} not found",
                feedback_id
            )));
        }
        Ok(())
    }

    async fn list_feedback_for_user(&self, username: &str) -> PortResult<Vec<Feedback>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT id, title, content, username FROM feedback \
             WHERE username = $1 ORDER BY created_at ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("INSERT INTO sessions (id) VALUES ($1)")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn session_username(&self, session_id: &str) -> PortResult<Option<String>> {
        let row = sqlx::query_scalar::<_, Option<String>>(
            "SELECT username FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        match row {
            Some(username) => Ok(username),
            None => Err(PortError::NotFound(format!(
                "Session {} not found",
                session_id
            ))),
        }
    }

    async fn set_session_username(
        &self,
        session_id: &str,
        username: Option<&str>,
    ) -> PortResult<()> {
        let result = sqlx::query("UPDATE sessions SET username = $1 WHERE id = $2")
            .bind(username)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Session {} not found",
                session_id
            )));
        }
        Ok(())
    }

    async fn push_flash(
        &self,
        session_id: &str,
        severity: Severity,
        message: &str,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO flash_messages (session_id, severity, message) VALUES ($1, $2, $3)",
        )
        .bind(session_id)
        .bind(severity.as_str())
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn take_flashes(&self, session_id: &str) -> PortResult<Vec<FlashMessage>> {
        // Single statement keeps the drain atomic; RETURNING carries no
        // ordering guarantee, so sort on the timestamp afterwards.
        let mut records = sqlx::query_as::<_, FlashRecord>(
            "DELETE FROM flash_messages WHERE session_id = $1 \
             RETURNING severity, message, created_at",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.sort_by_key(|r| r.created_at);
        records.into_iter().map(|r| r.to_domain()).collect()
    }
}
