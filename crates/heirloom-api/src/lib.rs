//! Heirloom API crate - axum HTTP server for the questionnaire backend.
//!
//! Serves submission and answer reads, answer upserts, explicit deletion,
//! the timer beacon endpoint, and health checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
