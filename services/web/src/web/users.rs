//! services/web/src/web/users.rs
//!
//! The home page plus the user detail and self-service delete handlers.
//! Authorization is a plain equality check between the session's username
//! and the username in the path.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use feedback_core::domain::Severity;
use std::sync::Arc;
use tracing::error;

use feedback_core::ports::PortError;

use crate::web::session::{drain_flashes, flash, flash_redirect, SessionContext};
use crate::web::state::AppState;
use crate::web::views;

/// GET /
pub async fn home(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response, (StatusCode, String)> {
    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::home_page(&flashes).into_response())
}

/// GET /user/{username}
pub async fn user_info(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(username): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(
            &state,
            &ctx,
            Severity::Warning,
            "Please log in to view this page",
            "/login",
        )
        .await;
    };
    if current != username {
        // Same message whether or not the requested account exists.
        return flash_redirect(&state, &ctx, Severity::Warning, "Invalid username", "/").await;
    }

    let user = match state.db.get_user(&username).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            return Ok((StatusCode::NOT_FOUND, "User not found".to_string()).into_response())
        }
        Err(e) => {
            error!("Failed to load user: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load user".to_string(),
            ));
        }
    };

    let feedback = state
        .db
        .list_feedback_for_user(&username)
        .await
        .map_err(|e| {
            error!("Failed to list feedback: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list feedback".to_string(),
            )
        })?;

    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::user_page(&user, &feedback, &flashes).into_response())
}

/// POST /user/{username}/delete
///
/// Deletes the account and everything it owns, then bounces through
/// logout so the session ends up anonymous.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(username): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(
            &state,
            &ctx,
            Severity::Warning,
            "Please log in to view this page",
            "/login",
        )
        .await;
    };
    if current != username {
        return flash_redirect(
            &state,
            &ctx,
            Severity::Warning,
            "You don't have permission",
            "/",
        )
        .await;
    }

    match state.db.delete_user(&username).await {
        Ok(()) => {}
        Err(PortError::NotFound(_)) => {
            return Ok((StatusCode::NOT_FOUND, "User not found".to_string()).into_response())
        }
        Err(e) => {
            error!("Failed to delete user: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete user".to_string(),
            ));
        }
    }

    flash(&state, &ctx, Severity::Success, "User deleted").await?;
    Ok(Redirect::to("/logout").into_response())
}
