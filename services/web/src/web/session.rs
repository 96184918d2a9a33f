//! services/web/src/web/session.rs
//!
//! Session plumbing: a middleware that resolves (or mints) the server-side
//! session row behind the `session` cookie and threads it through handlers
//! as an explicit per-request context, plus helpers for the per-session
//! flash message queue.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use feedback_core::domain::{FlashMessage, Severity};
use feedback_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;

/// Per-request session context. `username` is `None` for anonymous
/// visitors; handlers do all authorization against this one field.
#[derive(Clone, Debug)]
pub struct SessionContext {
    pub id: String,
    pub username: Option<String>,
}

/// Middleware that attaches a `SessionContext` to every request.
///
/// A missing or stale cookie gets a fresh session row; the `Set-Cookie`
/// header goes out with the response in that case.
pub async fn session_layer(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the session id from the cookie header, if any.
    let cookie_id = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| {
            h.split(';')
                .find_map(|c| c.trim().strip_prefix("session="))
        })
        .map(str::to_owned);

    // 2. Resolve it against the store, minting a new session when needed.
    let mut minted = None;
    let ctx = match cookie_id {
        Some(id) => match state.db.session_username(&id).await {
            Ok(username) => SessionContext { id, username },
            Err(PortError::NotFound(_)) => mint_session(&state, &mut minted).await?,
            Err(e) => {
                error!("Failed to load session: {:?}", e);
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        },
        None => mint_session(&state, &mut minted).await?,
    };

    // 3. Make the context available to handlers and run them.
    req.extensions_mut().insert(ctx);
    let mut response = next.run(req).await;

    // 4. Hand the browser its cookie when a session was just minted.
    if let Some(id) = minted {
        let cookie = format!("session={id}; HttpOnly; SameSite=Lax; Path=/");
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    Ok(response)
}

async fn mint_session(
    state: &AppState,
    minted: &mut Option<String>,
) -> Result<SessionContext, StatusCode> {
    let id = Uuid::new_v4().to_string();
    state.db.create_session(&id).await.map_err(|e| {
        error!("Failed to create session: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    *minted = Some(id.clone());
    Ok(SessionContext { id, username: None })
}

//=========================================================================================
// Flash Message Helpers
//=========================================================================================

/// Queues a one-time message for the next rendered view.
pub async fn flash(
    state: &AppState,
    ctx: &SessionContext,
    severity: Severity,
    message: &str,
) -> Result<(), (StatusCode, String)> {
    state
        .db
        .push_flash(&ctx.id, severity, message)
        .await
        .map_err(|e| {
            error!("Failed to queue flash message: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to queue flash message".to_string(),
            )
        })
}

/// Queues a message and answers with a 303 redirect.
pub async fn flash_redirect(
    state: &AppState,
    ctx: &SessionContext,
    severity: Severity,
    message: &str,
    to: &str,
) -> Result<Response, (StatusCode, String)> {
    flash(state, ctx, severity, message).await?;
    Ok(Redirect::to(to).into_response())
}

/// Drains the session's flash queue for rendering.
pub async fn drain_flashes(
    state: &AppState,
    ctx: &SessionContext,
) -> Result<Vec<FlashMessage>, (StatusCode, String)> {
    state.db.take_flashes(&ctx.id).await.map_err(|e| {
        error!("Failed to drain flash messages: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to drain flash messages".to_string(),
        )
    })
}
