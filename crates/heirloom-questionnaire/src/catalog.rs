//! Static section and question catalog.
//!
//! The questionnaire's structure is immutable configuration data: an ordered
//! list of sections, each holding ordered question definitions. Nothing here
//! is persisted per user; answers reference questions by id.

use serde::{Deserialize, Serialize};

use crate::keys::EntityKind;

/// The kind of input widget a question renders as.
///
/// One variant per widget type, dispatched through a single interface,
/// instead of duplicating open/close/selection logic per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum QuestionKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    LongText,
    /// Pick one from a list.
    SingleChoice,
    /// Pick several from a list, optionally capped.
    MultiChoice { max_selections: Option<usize> },
    /// Pick several, plus a free-text "other" entry.
    MultiChoiceWithOther { max_selections: Option<usize> },
    /// Free-form narrative, typed.
    Story,
    /// Free-form narrative with voice capture; transcripts append to the
    /// same answer field as typed input.
    VoiceStory,
    /// A repeatable sub-form block (children, spouses, assets, stories).
    Repeatable { entity: EntityKind },
}

/// One question definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier; answer rows are keyed on this.
    pub id: String,
    pub kind: QuestionKind,
    /// The prompt shown to the user.
    pub prompt: String,
    /// Options for choice questions; empty otherwise.
    #[serde(default)]
    pub options: Vec<String>,
    /// Optional placeholder / help text.
    #[serde(default)]
    pub placeholder: Option<String>,
}

impl Question {
    pub fn text(id: &str, prompt: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: QuestionKind::Text,
            prompt: prompt.to_string(),
            options: Vec::new(),
            placeholder: None,
        }
    }

    pub fn long_text(id: &str, prompt: &str) -> Self {
        Self {
            kind: QuestionKind::LongText,
            ..Self::text(id, prompt)
        }
    }

    pub fn single_choice(id: &str, prompt: &str, options: &[&str]) -> Self {
        Self {
            kind: QuestionKind::SingleChoice,
            options: options.iter().map(|s| s.to_string()).collect(),
            ..Self::text(id, prompt)
        }
    }

    pub fn multi_choice(
        id: &str,
        prompt: &str,
        options: &[&str],
        max_selections: Option<usize>,
    ) -> Self {
        Self {
            kind: QuestionKind::MultiChoice { max_selections },
            options: options.iter().map(|s| s.to_string()).collect(),
            ..Self::text(id, prompt)
        }
    }

    pub fn multi_choice_with_other(
        id: &str,
        prompt: &str,
        options: &[&str],
        max_selections: Option<usize>,
    ) -> Self {
        Self {
            kind: QuestionKind::MultiChoiceWithOther { max_selections },
            options: options.iter().map(|s| s.to_string()).collect(),
            ..Self::text(id, prompt)
        }
    }

    pub fn story(id: &str, prompt: &str) -> Self {
        Self {
            kind: QuestionKind::Story,
            ..Self::text(id, prompt)
        }
    }

    pub fn voice_story(id: &str, prompt: &str) -> Self {
        Self {
            kind: QuestionKind::VoiceStory,
            ..Self::text(id, prompt)
        }
    }

    pub fn repeatable(id: &str, prompt: &str, entity: EntityKind) -> Self {
        Self {
            kind: QuestionKind::Repeatable { entity },
            ..Self::text(id, prompt)
        }
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }
}

/// A named, ordered group of questions presented together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// 1-based position in the flow.
    pub id: u32,
    pub title: String,
    pub questions: Vec<Question>,
}

/// The full ordered catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    sections: Vec<Section>,
}

impl Catalog {
    /// Build a catalog, renumbering sections 1..N in the given order.
    pub fn new(mut sections: Vec<Section>) -> Self {
        for (i, section) in sections.iter_mut().enumerate() {
            section.id = i as u32 + 1;
        }
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The 1-based index of the final section.
    pub fn last_index(&self) -> u32 {
        self.sections.len() as u32
    }

    /// Look up a section by its 1-based index.
    pub fn section(&self, index: u32) -> Option<&Section> {
        if index == 0 {
            return None;
        }
        self.sections.get(index as usize - 1)
    }
}

/// The built-in legacy-letter flow.
pub fn default_catalog() -> Catalog {
    Catalog::new(vec![
        Section {
            id: 0,
            title: "About You".to_string(),
            questions: vec![
                Question::text("q1_full_name", "What is your full name?"),
                Question::text("q1_birth_year", "What year were you born?"),
                Question::single_choice(
                    "q1_writing_for",
                    "Who are you writing this letter for?",
                    &["My children", "My spouse or partner", "My whole family", "Someone else"],
                ),
                Question::multi_choice(
                    "q1_values",
                    "Which values matter most to you?",
                    &[
                        "Honesty",
                        "Kindness",
                        "Perseverance",
                        "Faith",
                        "Humor",
                        "Generosity",
                        "Curiosity",
                    ],
                    Some(3),
                ),
                Question::multi_choice_with_other(
                    "q1_traditions",
                    "Which family traditions do you hope will continue?",
                    &[
                        "Holiday gatherings",
                        "Family recipes",
                        "Religious observances",
                        "Annual trips",
                        "Storytelling",
                    ],
                    None,
                )
                .with_placeholder("Add your own tradition"),
            ],
        },
        Section {
            id: 0,
            title: "Your Life Story".to_string(),
            questions: vec![
                Question::voice_story(
                    "q2_story_childhood",
                    "Tell the story of where you grew up.",
                )
                .with_placeholder("Speak or type — start anywhere."),
                Question::voice_story(
                    "q2_story_turning_point",
                    "Describe a moment that changed the direction of your life.",
                ),
                Question::long_text(
                    "q2_proudest",
                    "What are you proudest of?",
                ),
            ],
        },
        Section {
            id: 0,
            title: "Your Children".to_string(),
            questions: vec![Question::repeatable(
                "q3_children",
                "Add a message for each of your children.",
                EntityKind::Child,
            )],
        },
        Section {
            id: 0,
            title: "Your Spouse or Partner".to_string(),
            questions: vec![Question::repeatable(
                "q4_spouses",
                "Add a message for your spouse or partner.",
                EntityKind::Spouse,
            )],
        },
        Section {
            id: 0,
            title: "Meaningful Possessions".to_string(),
            questions: vec![Question::repeatable(
                "q5_assets",
                "Describe possessions with a story you want remembered.",
                EntityKind::Asset,
            )],
        },
        Section {
            id: 0,
            title: "More Stories".to_string(),
            questions: vec![Question::repeatable(
                "q6_stories",
                "Anything else you want to tell?",
                EntityKind::Story,
            )],
        },
        Section {
            id: 0,
            title: "Final Words".to_string(),
            questions: vec![
                Question::voice_story("q7_final_words", "If this letter had to end in one paragraph, what would it say?"),
                Question::single_choice(
                    "q7_delivery",
                    "When should your letter be shared?",
                    &["Right away", "On a date I choose", "After I'm gone"],
                ),
            ],
        },
    ])
}

// =============================================================================
// Tests
// =============================================================================
