//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use heirloom_store::SqliteStore;

/// Shared application state, cloned per handler task.
#[derive(Clone)]
pub struct AppState {
    /// Persistent store for submissions and answers.
    pub store: Arc<SqliteStore>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Arc::new(store),
            start_time: Instant::now(),
        }
    }
}
