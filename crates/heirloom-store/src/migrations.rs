//! Database schema migrations.
//!
//! Applies the initial schema: submissions, answers, and the
//! schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use heirloom_core::error::HeirloomError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// are added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), HeirloomError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HeirloomError::Store(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HeirloomError::Store(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), HeirloomError> {
    conn.execute_batch(
        "
        -- One questionnaire submission per user.
        CREATE TABLE IF NOT EXISTS submissions (
            id                   TEXT PRIMARY KEY NOT NULL,
            user_id              TEXT NOT NULL UNIQUE,
            current_section      INTEGER NOT NULL DEFAULT 1,
            status               TEXT NOT NULL DEFAULT 'in_progress'
                                 CHECK (status IN ('in_progress', 'completed')),
            time_remaining_secs  INTEGER NOT NULL DEFAULT 0,
            submitted_at         INTEGER,
            created_at           INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_submissions_user
            ON submissions (user_id);

        -- Answers, one row per (submission, question). Re-saving a question
        -- overwrites via upsert on this unique pair.
        CREATE TABLE IF NOT EXISTS answers (
            submission_id   TEXT NOT NULL,
            question_id     TEXT NOT NULL,
            answer_text     TEXT NOT NULL DEFAULT '',
            updated_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            PRIMARY KEY (submission_id, question_id),
            FOREIGN KEY (submission_id) REFERENCES submissions(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_answers_submission
            ON answers (submission_id);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HeirloomError::Store(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_answers_unique_pair() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO submissions (id, user_id) VALUES ('s1', 'u1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO answers (submission_id, question_id, answer_text)
             VALUES ('s1', 'q1', 'first')",
            [],
        )
        .unwrap();

        // A plain second insert of the same pair must violate the key.
        let result = conn.execute(
            "INSERT INTO answers (submission_id, question_id, answer_text)
             VALUES ('s1', 'q1', 'second')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO submissions (id, user_id) VALUES ('s1', 'u1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO answers (submission_id, question_id, answer_text)
             VALUES ('s1', 'q1', 'x')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM submissions WHERE id = 's1'", [])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM answers", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
