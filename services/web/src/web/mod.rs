pub mod auth;
pub mod feedback;
pub mod session;
pub mod state;
pub mod users;
pub mod views;

// Re-export the pieces the server binary wires together.
pub use session::{session_layer, SessionContext};
pub use state::AppState;
