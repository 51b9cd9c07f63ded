//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use heirloom_core::error::HeirloomError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// Uses WAL mode for concurrent read/write safety. The connection is
/// wrapped in a Mutex since rusqlite Connection is not Sync.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs
    /// all pending migrations.
    pub fn new(path: &Path) -> Result<Self, HeirloomError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| HeirloomError::Store(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| HeirloomError::Store(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, HeirloomError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| HeirloomError::Store(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| HeirloomError::Store(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.with_conn(migrations::run_migrations)?;

        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// This is the primary way to interact with the database. The mutex
    /// is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, HeirloomError>
    where
        F: FnOnce(&Connection) -> Result<T, HeirloomError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| HeirloomError::Store(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
