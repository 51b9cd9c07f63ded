//! Heirloom Questionnaire crate - the section flow, answer state, and
//! navigation logic of the legacy letter.
//!
//! The engine owns the in-session state and talks to the store through the
//! [`heirloom_store::QuestionnaireStore`] contract. The catalog describes
//! the static section and question structure; keys handles the synthesized
//! ids of repeatable sub-forms; progress renders the jump-anywhere overlay.

pub mod catalog;
pub mod engine;
pub mod keys;
pub mod progress;

pub use catalog::{default_catalog, Catalog, Question, QuestionKind, Section};
pub use engine::{
    AdvanceOutcome, EnginePhase, InitOutcome, QuestionnaireEngine, RetreatOutcome,
};
pub use keys::{derived_count, entity_index, entity_key, EntityKind};
pub use progress::{ProgressEntry, ProgressPanel};
