//! Heirloom Store crate - persistence for submissions and answers.
//!
//! Defines the store contract the questionnaire engine runs against, a
//! WAL-mode SQLite implementation with migrations, and an in-memory
//! implementation for tests and offline use.

pub mod db;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use db::Database;
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, QuestionnaireStore};
