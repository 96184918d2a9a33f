//! services/web/src/bin/web.rs

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use web_lib::{
    adapters::DbAdapter,
    config::Config,
    error::WebError,
    web::{
        auth::{login_user, logout_user, register_user, show_login, show_register},
        feedback::{
            add_feedback, delete_feedback, show_add_feedback, show_update_feedback,
            update_feedback,
        },
        session_layer,
        users::{delete_user, home, user_info},
        AppState,
    },
};

#[tokio::main]
async fn main() -> Result<(), WebError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState { db: db_adapter });

    // --- 4. Create the Web Router ---
    let app = Router::new()
        .route("/", get(home))
        .route("/register", get(show_register).post(register_user))
        .route("/login", get(show_login).post(login_user))
        .route("/logout", get(logout_user))
        .route("/user/{username}", get(user_info))
        .route("/user/{username}/delete", post(delete_user))
        .route(
            "/user/{username}/feedback/add",
            get(show_add_feedback).post(add_feedback),
        )
        .route(
            "/feedback/{feedback_id}/update",
            get(show_update_feedback).post(update_feedback),
        )
        .route("/feedback/{feedback_id}/delete", post(delete_feedback))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_layer,
        ))
        .with_state(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
