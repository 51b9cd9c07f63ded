//! Questionnaire engine: the authoritative in-session view of section
//! position and answers, synchronized with the store.
//!
//! Phases: Initializing -> Active -> Submitting -> Done. The in-memory state
//! is the source of truth for the session. Per-field saves are optimistic
//! and never block or revert user input on a store failure; only the two
//! durable checkpoints (section advance, final submission) propagate
//! persistence errors to the caller.

use std::collections::HashMap;
use std::fmt;

use chrono::Utc;

use heirloom_core::error::HeirloomError;
use heirloom_core::identity::IdentityProvider;
use heirloom_core::types::{AnswerValue, Submission};
use heirloom_store::QuestionnaireStore;

use crate::catalog::Catalog;
use crate::keys::{derived_count, entity_key, EntityKind};

/// Lifecycle phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnginePhase {
    /// Resolving the user and loading or creating the submission.
    Initializing,
    /// The user is answering; sub-navigation happens inside this phase.
    Active,
    /// Final submission persistence is in flight.
    Submitting,
    /// The submission is completed.
    Done,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Initializing => write!(f, "Initializing"),
            EnginePhase::Active => write!(f, "Active"),
            EnginePhase::Submitting => write!(f, "Submitting"),
            EnginePhase::Done => write!(f, "Done"),
        }
    }
}

/// Outcome of initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// No authenticated user; the caller hands off to the auth flow.
    RedirectToAuth,
    /// Submission loaded or created; the engine is Active.
    Ready,
}

/// Outcome of forward navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the given 1-based section index.
    Moved(u32),
    /// The last section was submitted; the caller navigates to the
    /// completion view.
    Completed,
}

/// Outcome of backward navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetreatOutcome {
    /// Moved to the given 1-based section index.
    Moved(u32),
    /// Already on the first section; the caller exits to the entry page.
    ExitToEntry,
}

/// The questionnaire engine, generic over the store implementation.
pub struct QuestionnaireEngine<S: QuestionnaireStore> {
    store: S,
    catalog: Catalog,
    phase: EnginePhase,
    submission: Option<Submission>,
    answers: HashMap<String, AnswerValue>,
    time_budget_secs: u32,
}

impl<S: QuestionnaireStore> QuestionnaireEngine<S> {
    pub fn new(store: S, catalog: Catalog, time_budget_secs: u32) -> Self {
        Self {
            store,
            catalog,
            phase: EnginePhase::Initializing,
            submission: None,
            answers: HashMap::new(),
            time_budget_secs,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The loaded submission. `None` until initialization succeeds.
    pub fn submission(&self) -> Option<&Submission> {
        self.submission.as_ref()
    }

    /// Current 1-based section index. 1 until initialized.
    pub fn current_section(&self) -> u32 {
        self.submission
            .as_ref()
            .map(|s| s.current_section)
            .unwrap_or(1)
    }

    /// The in-memory value for a question, if any.
    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    fn require_active(&self) -> Result<(), HeirloomError> {
        if self.phase != EnginePhase::Active {
            return Err(HeirloomError::Questionnaire(format!(
                "operation requires Active phase, engine is {}",
                self.phase
            )));
        }
        Ok(())
    }

    fn require_submission(&self) -> Result<&Submission, HeirloomError> {
        self.submission
            .as_ref()
            .ok_or_else(|| HeirloomError::Questionnaire("no submission loaded".to_string()))
    }

    /// Resolve the user and load or create their submission.
    ///
    /// Returns `RedirectToAuth` without touching the store when no user is
    /// signed in. Stored list answers are decoded with a raw-string
    /// fallback; a corrupt row never aborts the load.
    pub async fn initialize<I: IdentityProvider>(
        &mut self,
        identity: &I,
    ) -> Result<InitOutcome, HeirloomError> {
        if self.phase != EnginePhase::Initializing {
            return Err(HeirloomError::Questionnaire(format!(
                "already initialized (phase {})",
                self.phase
            )));
        }

        let Some(user_id) = identity.current_user().await else {
            tracing::info!("No authenticated user; redirecting to auth");
            return Ok(InitOutcome::RedirectToAuth);
        };

        let submission = match self.store.fetch_submission_for_user(user_id).await? {
            Some(existing) => {
                let records = self.store.fetch_answers(existing.id).await?;
                self.answers = records
                    .into_iter()
                    .map(|r| (r.question_id, AnswerValue::decode(&r.answer_text)))
                    .collect();
                tracing::info!(
                    submission_id = %existing.id,
                    section = existing.current_section,
                    answers = self.answers.len(),
                    "Resumed submission"
                );
                existing
            }
            None => {
                let fresh = Submission::new(user_id, self.time_budget_secs);
                self.store.insert_submission(&fresh).await?;
                tracing::info!(submission_id = %fresh.id, "Created submission");
                fresh
            }
        };

        self.submission = Some(submission);
        self.phase = EnginePhase::Active;
        Ok(InitOutcome::Ready)
    }

    /// Save an answer: optimistic in-memory update, then a best-effort
    /// upsert to the store.
    ///
    /// Safe to call at keystroke frequency. A store failure is logged and
    /// swallowed; the in-memory value stands either way.
    pub async fn save_answer(
        &mut self,
        question_id: &str,
        value: AnswerValue,
    ) -> Result<(), HeirloomError> {
        self.require_active()?;
        let submission_id = self.require_submission()?.id;

        let encoded = value.encode();
        self.answers.insert(question_id.to_string(), value);

        if let Err(e) = self
            .store
            .upsert_answer(submission_id, question_id, &encoded)
            .await
        {
            tracing::warn!(question_id, error = %e, "Answer save failed; keeping local value");
        }
        Ok(())
    }

    /// Append transcribed speech to an answer field, as if it were typed.
    pub async fn append_transcript(
        &mut self,
        question_id: &str,
        text: &str,
    ) -> Result<(), HeirloomError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let combined = match self.answers.get(question_id) {
            Some(existing) if !existing.is_empty() => {
                format!("{} {}", existing.as_display(), text)
            }
            _ => text.to_string(),
        };
        self.save_answer(question_id, AnswerValue::Text(combined))
            .await
    }

    /// Move to the next section, or submit when on the last.
    ///
    /// Both paths are durable checkpoints: the store write is awaited and
    /// its failure propagates. The local index still advances on a failed
    /// section write so the user is not interrupted; the caller decides
    /// whether to retry or alert.
    pub async fn advance_section(&mut self) -> Result<AdvanceOutcome, HeirloomError> {
        self.require_active()?;
        let submission = self.require_submission()?;
        let current = submission.current_section;
        let submission_id = submission.id;

        if current < self.catalog.last_index() {
            let next = current + 1;
            if let Some(s) = self.submission.as_mut() {
                s.current_section = next;
            }
            self.store.update_section(submission_id, next).await?;
            tracing::debug!(section = next, "Advanced section");
            return Ok(AdvanceOutcome::Moved(next));
        }

        // Final submit.
        self.phase = EnginePhase::Submitting;
        let submitted_at = Utc::now();
        match self.store.complete_submission(submission_id, submitted_at).await {
            Ok(()) => {
                if let Some(s) = self.submission.as_mut() {
                    s.status = heirloom_core::types::SubmissionStatus::Completed;
                    s.submitted_at = Some(submitted_at);
                }
                self.phase = EnginePhase::Done;
                tracing::info!(submission_id = %submission_id, "Submission completed");
                Ok(AdvanceOutcome::Completed)
            }
            Err(e) => {
                // Back to Active so the user can retry the submit.
                self.phase = EnginePhase::Active;
                tracing::warn!(error = %e, "Final submission failed");
                Err(e)
            }
        }
    }

    /// Move back one section. Backward navigation is local only; only
    /// forward progress is durably checkpointed.
    pub fn retreat_section(&mut self) -> Result<RetreatOutcome, HeirloomError> {
        self.require_active()?;
        let submission = self
            .submission
            .as_mut()
            .ok_or_else(|| HeirloomError::Questionnaire("no submission loaded".to_string()))?;

        if submission.current_section <= 1 {
            return Ok(RetreatOutcome::ExitToEntry);
        }
        submission.current_section -= 1;
        Ok(RetreatOutcome::Moved(submission.current_section))
    }

    /// Jump to any catalog section, without validating completion. The new
    /// index is persisted best-effort so a resume lands in the same place.
    pub async fn jump_to_section(&mut self, index: u32) -> Result<u32, HeirloomError> {
        self.require_active()?;
        if self.catalog.section(index).is_none() {
            return Err(HeirloomError::Questionnaire(format!(
                "no section {}",
                index
            )));
        }
        let submission_id = self.require_submission()?.id;
        if let Some(s) = self.submission.as_mut() {
            s.current_section = index;
        }
        if let Err(e) = self.store.update_section(submission_id, index).await {
            tracing::warn!(section = index, error = %e, "Section jump not persisted");
        }
        Ok(index)
    }

    /// Number of rendered blocks for a repeatable family, derived from the
    /// answer keys present.
    pub fn entity_count(&self, kind: EntityKind) -> usize {
        derived_count(self.answers.keys().map(|k| k.as_str()), kind.prefix())
    }

    /// Add the next block for a repeatable family.
    ///
    /// Writes a sentinel empty answer at the new index's first field so
    /// later derivations (and a resumed session) see the block. Returns the
    /// new block's zero-based index. Blocks are never removed here;
    /// deletion of a single entity is not supported.
    pub async fn add_entity(&mut self, kind: EntityKind) -> Result<usize, HeirloomError> {
        self.require_active()?;
        let next = self.entity_count(kind);
        let sentinel = entity_key(kind.prefix(), next, kind.first_field());
        self.save_answer(&sentinel, AnswerValue::Text(String::new()))
            .await?;
        tracing::debug!(kind = ?kind, index = next, "Added entity block");
        Ok(next)
    }

    pub async fn add_child(&mut self) -> Result<usize, HeirloomError> {
        self.add_entity(EntityKind::Child).await
    }

    pub async fn add_spouse(&mut self) -> Result<usize, HeirloomError> {
        self.add_entity(EntityKind::Spouse).await
    }

    pub async fn add_asset(&mut self) -> Result<usize, HeirloomError> {
        self.add_entity(EntityKind::Asset).await
    }

    pub async fn add_story(&mut self) -> Result<usize, HeirloomError> {
        self.add_entity(EntityKind::Story).await
    }

    /// Explicit user-initiated deletion of the submission and all answers.
    /// Resets the engine so a new submission can be created.
    pub async fn delete_all_data(&mut self) -> Result<(), HeirloomError> {
        let submission_id = self.require_submission()?.id;
        self.store.delete_submission(submission_id).await?;
        tracing::info!(submission_id = %submission_id, "Submission deleted on user request");
        self.submission = None;
        self.answers.clear();
        self.phase = EnginePhase::Initializing;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
