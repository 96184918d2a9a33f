//! services/web/src/web/auth.rs
//!
//! Handlers for user registration, login, and logout.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use feedback_core::domain::Severity;
use feedback_core::forms::{self, FieldErrors, LoginInput, RegisterInput};
use feedback_core::ports::PortError;
use std::sync::Arc;
use tracing::error;

use crate::credentials;
use crate::web::session::{drain_flashes, flash, SessionContext};
use crate::web::state::AppState;
use crate::web::views;

/// GET /register
pub async fn show_register(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response, (StatusCode, String)> {
    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::register_page(&RegisterInput::default(), &FieldErrors::new(), &flashes)
        .into_response())
}

/// POST /register
///
/// Creates the account and logs the new user straight in. A duplicate
/// username comes back from the store as a conflict and is surfaced as an
/// inline field error rather than a failed request.
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Form(input): Form<RegisterInput>,
) -> Result<Response, (StatusCode, String)> {
    let form = match forms::validate_register(&input) {
        Ok(form) => form,
        Err(errors) => {
            let flashes = drain_flashes(&state, &ctx).await?;
            return Ok(views::register_page(&input, &errors, &flashes).into_response());
        }
    };

    let new_user = credentials::register(form).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password".to_string(),
        )
    })?;

    let user = match state.db.create_user(new_user).await {
        Ok(user) => user,
        Err(PortError::Conflict(_)) => {
            let mut errors = FieldErrors::new();
            errors.push("username", "Username already taken");
            let flashes = drain_flashes(&state, &ctx).await?;
            return Ok(views::register_page(&input, &errors, &flashes).into_response());
        }
        Err(e) => {
            error!("Failed to create user: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create user".to_string(),
            ));
        }
    };

    state
        .db
        .set_session_username(&ctx.id, Some(&user.username))
        .await
        .map_err(|e| {
            error!("Failed to store login in session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store login".to_string(),
            )
        })?;

    flash(&state, &ctx, Severity::Success, "Created new account").await?;
    Ok(Redirect::to("/").into_response())
}

/// GET /login
pub async fn show_login(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response, (StatusCode, String)> {
    let flashes = drain_flashes(&state, &ctx).await?;
    Ok(views::login_page(&LoginInput::default(), &FieldErrors::new(), &flashes).into_response())
}

/// POST /login
///
/// A failed login re-renders the form with HTTP 200 and a generic error;
/// whether the username exists is never revealed.
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
    Form(input): Form<LoginInput>,
) -> Result<Response, (StatusCode, String)> {
    let form = match forms::validate_login(&input) {
        Ok(form) => form,
        Err(errors) => {
            let flashes = drain_flashes(&state, &ctx).await?;
            return Ok(views::login_page(&input, &errors, &flashes).into_response());
        }
    };

    let user = credentials::authenticate(state.db.as_ref(), &form.username, &form.password)
        .await
        .map_err(|e| {
            error!("Failed to authenticate: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to authenticate".to_string(),
            )
        })?;

    let Some(user) = user else {
        let mut errors = FieldErrors::new();
        errors.push("username", "Invalid username/password");
        let flashes = drain_flashes(&state, &ctx).await?;
        return Ok(views::login_page(&input, &errors, &flashes).into_response());
    };

    state
        .db
        .set_session_username(&ctx.id, Some(&user.username))
        .await
        .map_err(|e| {
            error!("Failed to store login in session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store login".to_string(),
            )
        })?;

    flash(
        &state,
        &ctx,
        Severity::Success,
        &format!("Welcome {}", user.first_name),
    )
    .await?;
    Ok(Redirect::to(&format!("/user/{}", user.username)).into_response())
}

/// GET /logout
///
/// Clearing an already-anonymous session is a no-op, so visiting twice is
/// harmless.
pub async fn logout_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<SessionContext>,
) -> Result<Response, (StatusCode, String)> {
    state
        .db
        .set_session_username(&ctx.id, None)
        .await
        .map_err(|e| {
            error!("Failed to clear session: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to clear session".to_string(),
            )
        })?;
    flash(&state, &ctx, Severity::Success, "You are now logged out").await?;
    Ok(Redirect::to("/").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{anon_session, app_state, body_string, insert_user, InMemoryDb};

    fn register_input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            password: "pw1".into(),
            email: "a@x.com".into(),
            first_name: "Alice".into(),
            last_name: "A".into(),
        }
    }

    #[tokio::test]
    async fn registration_logs_in_and_redirects_home() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;

        let res = register_user(
            State(state.clone()),
            Extension(ctx.clone()),
            Form(register_input("alice")),
        )
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/");
        assert_eq!(db.session_user(&ctx.id), Some("alice".to_string()));
        assert_eq!(db.user_count(), 1);
        let flashes = db.queued_flashes(&ctx.id);
        assert_eq!(flashes[0].message, "Created new account");
        assert_eq!(flashes[0].severity, Severity::Success);
    }

    #[tokio::test]
    async fn duplicate_registration_rerenders_with_inline_error() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;
        insert_user(&state, "alice", "pw1").await;

        let res = register_user(
            State(state.clone()),
            Extension(ctx.clone()),
            Form(register_input("alice")),
        )
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Username already taken"));
        assert_eq!(db.user_count(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_reports_field_errors_without_redirect() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;

        let res = register_user(
            State(state.clone()),
            Extension(ctx.clone()),
            Form(RegisterInput::default()),
        )
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("This field is required"));
        assert_eq!(db.user_count(), 0);
    }

    #[tokio::test]
    async fn wrong_password_rerenders_login_and_leaves_session_anonymous() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;
        insert_user(&state, "alice", "pw1").await;

        let res = login_user(
            State(state.clone()),
            Extension(ctx.clone()),
            Form(LoginInput {
                username: "alice".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(body_string(res).await.contains("Invalid username/password"));
        assert_eq!(db.session_user(&ctx.id), None);
    }

    #[tokio::test]
    async fn login_redirects_to_the_user_page_with_a_welcome() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;
        insert_user(&state, "alice", "pw1").await;

        let res = login_user(
            State(state.clone()),
            Extension(ctx.clone()),
            Form(LoginInput {
                username: "alice".into(),
                password: "pw1".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()["location"], "/user/alice");
        assert_eq!(db.session_user(&ctx.id), Some("alice".to_string()));
        assert_eq!(db.queued_flashes(&ctx.id)[0].message, "Welcome Alice");
    }

    #[tokio::test]
    async fn logging_out_twice_is_harmless() {
        let db = Arc::new(InMemoryDb::new());
        let state = app_state(db.clone());
        let ctx = anon_session(&state).await;
        insert_user(&state, "alice", "pw1").await;
        db.set_session(&ctx.id, Some("alice"));

        for _ in 0..2 {
            let res = logout_user(State(state.clone()), Extension(ctx.clone()))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::SEE_OTHER);
            assert_eq!(res.headers()["location"], "/");
        }
        assert_eq!(db.session_user(&ctx.id), None);
    }
}
