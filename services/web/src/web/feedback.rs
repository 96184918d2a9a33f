//! services/web/src/web/feedback.rs
//!
//! Handlers for adding, updating, and deleting feedback entries. New
//! entries are owned by whoever the session says is logged in; update and
//! delete check that same username against the stored owner before
//! touching the row.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use feedback_core::domain::Severity;
use feedback_core::forms::{self, FeedbackInput, FieldErrors};
use feedback_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::session::{drain_flashes, flash, flash_redirect, SessionContext};
use crate::web::state::AppState;
use crate::web::views;

/// Outcome of the owner check shared by the update and delete handlers.
enum OwnerCheck {
    Owned(String),
    Reply(Response),
}

/// Resolves the feedback owner and compares it to the session user.
/// A missing row answers with `missing` (a 404 or a flash-and-redirect,
/// depending on the route); a mismatch always flashes and goes home.
async fn check_owner(
    state: &AppState,
    ctx: &SessionContext,
    current: &str,
    feedback_id: Uuid,
    missing: MissingFeedback,
) -> Result<OwnerCheck, (StatusCode, String)> {
    let owner = match state.db.get_feedback_owner(feedback_id).await {
        Ok(owner) => owner,
        Err(PortError::NotFound(_)) => {
            let reply = match missing {
                MissingFeedback::NotFound => {
                    (StatusCode::NOT_FOUND, "Feedback not found".to_string()).into_response()
                }
                MissingFeedback::FlashHome => {
                    flash_redirect(state, ctx, Severity::Warning, "Feedback doesn't exist", "/")
                        .await?
                }
            };
            return Ok(OwnerCheck::Reply(reply));
        }
        Err(e) => {
            error!("Failed to load feedback owner: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load feedback".to_string(),
            ));
        }
    };

    if owner != current {
        let reply = flash_redirect(
            state,
            ctx,
            Severity::Warning,
            "You can only change your own feedback",
            "/",
        )
        .await?;
        return Ok(OwnerCheck::Reply(reply));
    }
    Ok(OwnerCheck::Owned(owner))
}

enum MissingFeedback {
    NotFound,
    FlashHome,
}

/// GET /user/{username}/feedback/add
pub async fn show_add_feedback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(username): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    if ctx.username.is_none() {
        return flash_redirect(&state, &ctx, Severity::Warning, "Please login first", "/").await;
    }
    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::feedback_form_page(
        "Add feedback",
        &format!("/user/{username}/feedback/add"),
        &FeedbackInput::default(),
        &FieldErrors::new(),
        &flashes,
    )
    .into_response())
}

/// POST /user/{username}/feedback/add
///
/// The new entry is owned by the session user regardless of the username
/// in the path.
pub async fn add_feedback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(username): Path<String>,
    Form(input): Form<FeedbackInput>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(&state, &ctx, Severity::Warning, "Please login first", "/").await;
    };

    let form = match forms::validate_feedback(&input) {
        Ok(form) => form,
        Err(errors) => {
            let flashes = drain_flashes(&state, &ctx).await?;
            return Ok(views::feedback_form_page(
                "Add feedback",
                &format!("/user/{username}/feedback/add"),
                &input,
                &errors,
                &flashes,
            )
            .into_response());
        }
    };

    state
        .db
        .create_feedback(&form.title, &form.content, &current)
        .await
        .map_err(|e| {
            error!("Failed to create feedback: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create feedback".to_string(),
            )
        })?;

    flash(&state, &ctx, Severity::Success, "Feedback added").await?;
    Ok(Redirect::to(&format!("/user/{current}")).into_response())
}

/// GET /feedback/{feedback_id}/update
pub async fn show_update_feedback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(feedback_id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(&state, &ctx, Severity::Warning, "Please login first", "/").await;
    };
    match check_owner(&state, &ctx, &current, feedback_id, MissingFeedback::FlashHome).await? {
        OwnerCheck::Reply(reply) => return Ok(reply),
        OwnerCheck::Owned(_) => {}
    }

    let feedback = match state.db.get_feedback(feedback_id).await {
        Ok(feedback) => feedback,
        Err(PortError::NotFound(_)) => {
            return flash_redirect(&state, &ctx, Severity::Warning, "Feedback doesn't exist", "/")
                .await
        }
        Err(e) => {
            error!("Failed to load feedback: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load feedback".to_string(),
            ));
        }
    };

    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::feedback_form_page(
        "Update feedback",
        &format!("/feedback/{feedback_id}/update"),
        &FeedbackInput {
            title: feedback.title,
            content: feedback.content,
        },
        &FieldErrors::new(),
        &flashes,
    )
    .into_response())
}

/// POST /feedback/{feedback_id}/update
pub async fn update_feedback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(feedback_id): Path<Uuid>,
    Form(input): Form<FeedbackInput>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(&state, &ctx, Severity::Warning, "Please login first", "/").await;
    };
    let owner =
        match check_owner(&state, &ctx, &current, feedback_id, MissingFeedback::FlashHome).await? {
            OwnerCheck::Reply(reply) => return Ok(reply),
            OwnerCheck::Owned(owner) => owner,
        };

    let form = match forms::validate_feedback(&input) {
        Ok(form) => form,
        Err(errors) => {
            let flashes = drain_flashes(&state, &ctx).await?;
            return Ok(views::feedback_form_page(
                "Update feedback",
                &format!("/feedback/{feedback_id}/update"),
                &input,
                &errors,
                &flashes,
            )
            .into_response());
        }
    };

    match state
        .db
        .update_feedback(feedback_id, &form.title, &form.content)
        .await
    {
        Ok(()) => {}
        Err(PortError::NotFound(_)) => {
            return flash_redirect(&state, &ctx, Severity::Warning, "Feedback doesn't exist", "/")
                .await
        }
        Err(e) => {
            error!("Failed to update feedback: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update feedback".to_string(),
            ));
        }
    }

    flash(&state, &ctx, Severity::Success, "Feedback updated").await?;
    Ok(Redirect::to(&format!("/user/{owner}")).into_response())
}

/// POST /feedback/{feedback_id}/delete
///
/// A direct lookup, so a missing row is a plain 404 rather than a flash.
pub async fn delete_feedback(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Path(feedback_id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let Some(current) = ctx.username.clone() else {
        return flash_redirect(&state, &ctx, Severity::Warning, "Please login first", "/").await;
    };
    match check_owner(&state, &ctx, &current, feedback_id, MissingFeedback::NotFound).await? {
        OwnerCheck::Reply(reply) => return Ok(reply),
        OwnerCheck::Owned(_) => {}
    }

    match state.db.delete_feedback(feedback_id).await {
        Ok(()) => {}
        Err(PortError::NotFound(_)) => {
            return Ok((StatusCode::NOT_FOUND, "Feedback not found".to_string()).into_response())
        }
        Err(e) => {
            error!("Failed to delete feedback: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete feedback".to_string(),
            ));
        }
    }

    flash(&state, &ctx, Severity::Success, "Feedback deleted").await?;
    Ok(Redirect::to("/").into_response())
}
