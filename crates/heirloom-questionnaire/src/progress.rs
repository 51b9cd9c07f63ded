//! Progress panel: an open/close overlay listing every section, marking
//! the current one, and jumping on selection.

use heirloom_core::error::HeirloomError;
use heirloom_store::QuestionnaireStore;

use crate::engine::QuestionnaireEngine;

/// One row in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    /// 1-based section index.
    pub index: u32,
    pub title: String,
    /// Whether this is the section the user is on.
    pub current: bool,
}

/// Overlay visibility plus the selection behavior. Selecting an entry
/// closes the panel and navigates, in that order, so the panel is never
/// left open over a failed jump.
#[derive(Debug, Default)]
pub struct ProgressPanel {
    open: bool,
}

impl ProgressPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// The rows to render, in catalog order.
    pub fn entries<S: QuestionnaireStore>(
        &self,
        engine: &QuestionnaireEngine<S>,
    ) -> Vec<ProgressEntry> {
        let current = engine.current_section();
        engine
            .catalog()
            .sections()
            .iter()
            .map(|s| ProgressEntry {
                index: s.id,
                title: s.title.clone(),
                current: s.id == current,
            })
            .collect()
    }

    /// Close the panel and jump to the chosen section.
    pub async fn select<S: QuestionnaireStore>(
        &mut self,
        engine: &mut QuestionnaireEngine<S>,
        index: u32,
    ) -> Result<u32, HeirloomError> {
        self.close();
        engine.jump_to_section(index).await
    }
}

// =============================================================================
// Tests
// =============================================================================
