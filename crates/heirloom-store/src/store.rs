//! The persistence contract the questionnaire engine is written against.
//!
//! The hosted product talks to a remote relational store; locally and in
//! tests the same contract is satisfied by [`MemoryStore`] or the SQLite
//! implementation. Answer writes are upserts keyed on
//! `(submission_id, question_id)`: last write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use heirloom_core::error::HeirloomError;
use heirloom_core::types::{AnswerRecord, Submission, SubmissionStatus};

/// Persistence operations for submissions and answers.
pub trait QuestionnaireStore: Send + Sync {
    /// Look up the live submission for a user, if any.
    fn fetch_submission_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Submission>, HeirloomError>> + Send;

    /// Look up a submission by id.
    fn fetch_submission(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Submission>, HeirloomError>> + Send;

    /// Insert a freshly created submission.
    fn insert_submission(
        &self,
        submission: &Submission,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;

    /// Persist a new current-section index.
    fn update_section(
        &self,
        id: Uuid,
        section: u32,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;

    /// Mark a submission completed with its submission timestamp.
    fn complete_submission(
        &self,
        id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;

    /// Persist the timer's remaining seconds.
    fn save_time_remaining(
        &self,
        id: Uuid,
        secs: u32,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;

    /// Upsert one answer, keyed on `(submission_id, question_id)`.
    fn upsert_answer(
        &self,
        submission_id: Uuid,
        question_id: &str,
        answer_text: &str,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;

    /// All answers stored for a submission.
    fn fetch_answers(
        &self,
        submission_id: Uuid,
    ) -> impl Future<Output = Result<Vec<AnswerRecord>, HeirloomError>> + Send;

    /// Delete a submission and, by cascade, all of its answers.
    fn delete_submission(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<(), HeirloomError>> + Send;
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-memory store for tests and offline runs.
///
/// Writes can be switched to fail on demand, for exercising the engine's
/// log-and-continue policy around persistence errors.
#[derive(Clone, Default)]
pub struct MemoryStore {
    submissions: Arc<Mutex<HashMap<Uuid, Submission>>>,
    answers: Arc<Mutex<HashMap<(Uuid, String), String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a store error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), HeirloomError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(HeirloomError::Store("simulated write failure".to_string()))
        } else {
            Ok(())
        }
    }

    /// Number of stored answer rows, across all submissions.
    pub fn answer_count(&self) -> usize {
        self.answers.lock().expect("answers mutex poisoned").len()
    }
}

impl QuestionnaireStore for MemoryStore {
    async fn fetch_submission_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Submission>, HeirloomError> {
        let submissions = self.submissions.lock().expect("submissions mutex poisoned");
        Ok(submissions.values().find(|s| s.user_id == user_id).cloned())
    }

    async fn fetch_submission(&self, id: Uuid) -> Result<Option<Submission>, HeirloomError> {
        let submissions = self.submissions.lock().expect("submissions mutex poisoned");
        Ok(submissions.get(&id).cloned())
    }

    async fn insert_submission(&self, submission: &Submission) -> Result<(), HeirloomError> {
        self.check_writable()?;
        let mut submissions = self.submissions.lock().expect("submissions mutex poisoned");
        if submissions.values().any(|s| s.user_id == submission.user_id) {
            return Err(HeirloomError::Store(format!(
                "user {} already has a submission",
                submission.user_id
            )));
        }
        submissions.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn update_section(&self, id: Uuid, section: u32) -> Result<(), HeirloomError> {
        self.check_writable()?;
        let mut submissions = self.submissions.lock().expect("submissions mutex poisoned");
        match submissions.get_mut(&id) {
            Some(s) => {
                s.current_section = section;
                Ok(())
            }
            None => Err(HeirloomError::Store(format!("no submission {}", id))),
        }
    }

    async fn complete_submission(
        &self,
        id: Uuid,
        submitted_at: DateTime<Utc>,
    ) -> Result<(), HeirloomError> {
        self.check_writable()?;
        let mut submissions = self.submissions.lock().expect("submissions mutex poisoned");
        match submissions.get_mut(&id) {
            Some(s) => {
                s.status = SubmissionStatus::Completed;
                s.submitted_at = Some(submitted_at);
                Ok(())
            }
            None => Err(HeirloomError::Store(format!("no submission {}", id))),
        }
    }

    async fn save_time_remaining(&self, id: Uuid, secs: u32) -> Result<(), HeirloomError> {
        self.check_writable()?;
        let mut submissions = self.submissions.lock().expect("submissions mutex poisoned");
        match submissions.get_mut(&id) {
            Some(s) => {
                s.time_remaining_secs = secs;
                Ok(())
            }
            None => Err(HeirloomError::Store(format!("no submission {}", id))),
        }
    }

    async fn upsert_answer(
        &self,
        submission_id: Uuid,
        question_id: &str,
        answer_text: &str,
    ) -> Result<(), HeirloomError> {
        self.check_writable()?;
        let mut answers = self.answers.lock().expect("answers mutex poisoned");
        answers.insert(
            (submission_id, question_id.to_string()),
            answer_text.to_string(),
        );
        Ok(())
    }

    async fn fetch_answers(
        &self,
        submission_id: Uuid,
    ) -> Result<Vec<AnswerRecord>, HeirloomError> {
        let answers = self.answers.lock().expect("answers mutex poisoned");
        let mut records: Vec<AnswerRecord> = answers
            .iter()
            .filter(|((sid, _), _)| *sid == submission_id)
            .map(|((sid, qid), text)| AnswerRecord {
                submission_id: *sid,
                question_id: qid.clone(),
                answer_text: text.clone(),
            })
            .collect();
        records.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        Ok(records)
    }

    async fn delete_submission(&self, id: Uuid) -> Result<(), HeirloomError> {
        self.check_writable()?;
        self.submissions
            .lock()
            .expect("submissions mutex poisoned")
            .remove(&id);
        self.answers
            .lock()
            .expect("answers mutex poisoned")
            .retain(|(sid, _), _| *sid != id);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_fetch_by_user() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        let found = store
            .fetch_submission_for_user(sub.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, sub);
    }

    #[tokio::test]
    async fn test_one_submission_per_user() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .insert_submission(&Submission::new(user, 7200))
            .await
            .unwrap();
        let result = store.insert_submission(&Submission::new(user, 7200)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_answer_upsert_overwrites() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        store.upsert_answer(sub.id, "q1", "v1").await.unwrap();
        store.upsert_answer(sub.id, "q1", "v2").await.unwrap();

        let answers = store.fetch_answers(sub.id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer_text, "v2");
    }

    #[tokio::test]
    async fn test_complete_submission() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        let now = Utc::now();
        store.complete_submission(sub.id, now).await.unwrap();

        let found = store.fetch_submission(sub.id).await.unwrap().unwrap();
        assert_eq!(found.status, SubmissionStatus::Completed);
        assert_eq!(found.submitted_at, Some(now));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_answers() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();
        store.upsert_answer(sub.id, "q1", "a").await.unwrap();
        store.upsert_answer(sub.id, "q2", "b").await.unwrap();

        store.delete_submission(sub.id).await.unwrap();

        assert!(store.fetch_submission(sub.id).await.unwrap().is_none());
        assert_eq!(store.answer_count(), 0);
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        store.set_fail_writes(true);
        assert!(store.upsert_answer(sub.id, "q1", "a").await.is_err());
        assert!(store.update_section(sub.id, 2).await.is_err());

        store.set_fail_writes(false);
        assert!(store.upsert_answer(sub.id, "q1", "a").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_section() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        store.update_section(sub.id, 3).await.unwrap();
        let found = store.fetch_submission(sub.id).await.unwrap().unwrap();
        assert_eq!(found.current_section, 3);
    }

    #[tokio::test]
    async fn test_save_time_remaining() {
        let store = MemoryStore::new();
        let sub = Submission::new(Uuid::new_v4(), 7200);
        store.insert_submission(&sub).await.unwrap();

        store.save_time_remaining(sub.id, 65).await.unwrap();
        let found = store.fetch_submission(sub.id).await.unwrap().unwrap();
        assert_eq!(found.time_remaining_secs, 65);
    }

    #[tokio::test]
    async fn test_update_missing_submission_errors() {
        let store = MemoryStore::new();
        assert!(store.update_section(Uuid::new_v4(), 2).await.is_err());
        assert!(store
            .complete_submission(Uuid::new_v4(), Utc::now())
            .await
            .is_err());
    }
}
