//! SQLite-backed implementation of the questionnaire store contract.
//!
//! Operates on the [`Database`] wrapper using raw SQL. Answer writes use
//! `INSERT ... ON CONFLICT DO UPDATE` keyed on the
//! `(submission_id, question_id)` primary key, so re-saving a question
//! overwrites rather than duplicates.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use heirloom_core::error::HeirloomError;
use heirloom_core::types::{AnswerRecord, Submission, SubmissionStatus};

use crate::db::Database;
use crate::store::QuestionnaireStore;

/// Questionnaire store backed by SQLite.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn row_to_submission(row: &Row<'_>) -> rusqlite::Result<Result<Submission, HeirloomError>> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let current_section: i64 = row.get(2)?;
    let status: String = row.get(3)?;
    let time_remaining: i64 = row.get(4)?;
    let submitted_at: Option<i64> = row.get(5)?;

    Ok(build_submission(
        id,
        user_id,
        current_section,
        status,
        time_remaining,
        submitted_at,
    ))
}

fn build_submission(
    id: String,
    user_id: String,
    current_section: i64,
    status: String,
    time_remaining: i64,
    submitted_at: Option<i64>,
) -> Result<Submission, HeirloomError> {
    let id = Uuid::parse_str(&id)
        .map_err(|e| HeirloomError::Store(format!("bad submission id: {}", e)))?;
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|e| HeirloomError::Store(format!("bad user id: {}", e)))?;
    let submitted_at = match submitted_at {
        Some(ts) => Some(epoch_to_datetime(ts)?),
        None => None,
    };

    Ok(Submission {
        id,
        user_id,
        current_section: current_section.max(1) as u32,
        status: SubmissionStatus::parse(&status),
        time_remaining_secs: time_remaining.max(0) as u32,
        submitted_at,
    })
}

fn epoch_to_datetime(ts: i64) -> Result<DateTime<Utc>, HeirloomError> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| HeirloomError::Store(format!("bad timestamp: {}", ts)))
}

const SUBMISSION_COLUMNS: &str =
    "id, user_id, current_section, status, time_remaining_secs, submitted_at";

impl QuestionnaireStore for SqliteStore {
    async fn fetch_submission_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Submission>, HeirloomError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    &format!(
                        "SELECT {} FROM submissions WHERE user_id = ?1",
                        SUBMISSION_COLUMNS
                    ),
                    rusqlite::params![user_id.to_string()],
                    row_to_submission,
                )
                .optional()
                .map_err(|e| HeirloomError::Store(e.to_string()))?;

            match result {
                Some(submission) => Ok(Some(submission?)),
                None => Ok(None),
            }
        })
    }

    async fn fetch_submission(&self, id: Uuid) -> Result<Option<Submission>, HeirloomError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    &format!("SELECT {} FROM submissions WHERE id = ?1", SUBMISSION_COLUMNS),
                    rusqlite::params![id.to_string()],
                    row_to_submission,
                )
                .optional()
                .map_err(|e| HeirloomError::Store(e.to_string()))?;

            match result {
                Some(submission) => Ok(Some(submission?)),
                None => Ok(None),
            }
        })
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO submissions
                     (id, user_id, current_section, status, time_remaining_secs, submitted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    submission.id.to_string(),
                    submission.user_id.to_string(),
                    submission.current_section as i64,
                    submission.status.as_str(),
                    submission.time_remaining_secs as i64,
                    submission.submitted_at.map(|t| t.timestamp()),
                ],
            )
            .map_err(|e| HeirloomError::Store(format!("Failed to insert submission: {}", e)))?;
            Ok(())
        })
    }

    async fn update_section(&self, id: Uuid, section: u32) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE submissions SET current_section = ?2 WHERE id = ?1",
                    rusqlite::params![id.to_string(), section as i64],
                )
                .map_err(|e| HeirloomError::Store(format!("Failed to update section: {}", e)))?;
            if changed == 0 {
                return Err(HeirloomError::Store(format!("no submission {}", id)));
            }
            Ok(())
        })
    }

    async fn complete_submission(
        &self,
        id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE submissions SET status = 'completed', submitted_at = ?2 WHERE id = ?1",
                    rusqlite::params![id.to_string(), submitted_at.timestamp()],
                )
                .map_err(|e| {
                    HeirloomError::Store(format!("Failed to complete submission: {}", e))
                })?;
            if changed == 0 {
                return Err(HeirloomError::Store(format!("no submission {}", id)));
            }
            Ok(())
        })
    }

    async fn save_time_remaining(&self, id: Uuid, secs: u32) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE submissions SET time_remaining_secs = ?2 WHERE id = ?1",
                    rusqlite::params![id.to_string(), secs as i64],
                )
                .map_err(|e| {
                    HeirloomError::Store(format!("Failed to save time remaining: {}", e))
                })?;
            if changed == 0 {
                return Err(HeirloomError::Store(format!("no submission {}", id)));
            }
            Ok(())
        })
    }

    async fn upsert_answer(
        &self,
        submission_id: Uuid,
        question_id: &str,
        answer_text: &str,
    ) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO answers (submission_id, question_id, answer_text, updated_at)
                 VALUES (?1, ?2, ?3, strftime('%s', 'now'))
                 ON CONFLICT (submission_id, question_id)
                 DO UPDATE SET answer_text = excluded.answer_text,
                               updated_at = excluded.updated_at",
                rusqlite::params![submission_id.to_string(), question_id, answer_text],
            )
            .map_err(|e| HeirloomError::Store(format!("Failed to upsert answer: {}", e)))?;
            Ok(())
        })
    }

    async fn fetch_answers(
        &self,
        submission_id: Uuid,
    ) -> Result<Vec<AnswerRecord>, HeirloomError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT question_id, answer_text FROM answers
                     WHERE submission_id = ?1
                     ORDER BY question_id ASC",
                )
                .map_err(|e| HeirloomError::Store(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![submission_id.to_string()], |row| {
                    Ok(AnswerRecord {
                        submission_id,
                        question_id: row.get(0)?,
                        answer_text: row.get(1)?,
                    })
                })
                .map_err(|e| HeirloomError::Store(e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(|e| HeirloomError::Store(e.to_string()))?);
            }
            Ok(records)
        })
    }

    async fn delete_submission(&self, id: Uuid) -> Result<(), HeirloomError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM submissions WHERE id = ?1",
                rusqlite::params![id.to_string()],
            )
            .map_err(|e| HeirloomError::Store(format!("Failed to delete submission: {}", e)))?;
            Ok(())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
