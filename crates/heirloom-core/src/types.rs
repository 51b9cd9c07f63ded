use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Lifecycle status of a questionnaire submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// The user is still working through the sections.
    #[default]
    InProgress,
    /// The final section was submitted; `submitted_at` is set.
    Completed,
}

impl SubmissionStatus {
    /// Stable string form used by the store layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::InProgress => "in_progress",
            SubmissionStatus::Completed => "completed",
        }
    }

    /// Parse the store's string form. Unknown values map to `InProgress`
    /// so a corrupt row never aborts a load.
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => SubmissionStatus::Completed,
            _ => SubmissionStatus::InProgress,
        }
    }
}

// =============================================================================
// Submission
// =============================================================================

/// One user's in-progress or completed questionnaire record.
///
/// At most one live submission exists per user. The section index is 1-based
/// and advances only on forward navigation; backward navigation is local to
/// the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier for this submission.
    pub id: Uuid,
    /// The owning user.
    pub user_id: Uuid,
    /// 1-based index of the section the user is currently on.
    pub current_section: u32,
    /// Lifecycle status.
    pub status: SubmissionStatus,
    /// Remaining soft time budget in whole seconds.
    pub time_remaining_secs: u32,
    /// Set once, when the final section is submitted.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Create a fresh submission at section 1 with the full time budget.
    pub fn new(user_id: Uuid, time_budget_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            current_section: 1,
            status: SubmissionStatus::InProgress,
            time_remaining_secs: time_budget_secs,
            submitted_at: None,
        }
    }
}

// =============================================================================
// Answers
// =============================================================================

/// A stored answer row, keyed by `(submission_id, question_id)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub submission_id: Uuid,
    pub question_id: String,
    pub answer_text: String,
}

/// The in-memory value of a single answer.
///
/// Multi-select questions hold a list of chosen options; everything else is
/// plain text. Lists round-trip through JSON in the store's single text
/// column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Encode for storage: lists serialize to JSON, plain text is stored
    /// as-is.
    pub fn encode(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            // Serializing Vec<String> cannot fail.
            AnswerValue::List(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| String::new())
            }
        }
    }

    /// Decode a stored text payload.
    ///
    /// A payload that parses as a JSON array of strings becomes a `List`;
    /// anything else (including malformed JSON) is treated as plain text.
    /// This never fails, so a corrupt row degrades to its raw form instead
    /// of aborting the submission load.
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') {
            if let Ok(items) = serde_json::from_str::<Vec<String>>(raw) {
                return AnswerValue::List(items);
            }
        }
        AnswerValue::Text(raw.to_string())
    }

    /// The answer as display text (lists joined with ", ").
    pub fn as_display(&self) -> String {
        match self {
            AnswerValue::Text(s) => s.clone(),
            AnswerValue::List(items) => items.join(", "),
        }
    }

    /// Whether the answer holds no content.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.is_empty(),
            AnswerValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(items: Vec<String>) -> Self {
        AnswerValue::List(items)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_new() {
        let user = Uuid::new_v4();
        let sub = Submission::new(user, 3600);

        assert!(!sub.id.is_nil());
        assert_eq!(sub.user_id, user);
        assert_eq!(sub.current_section, 1);
        assert_eq!(sub.status, SubmissionStatus::InProgress);
        assert_eq!(sub.time_remaining_secs, 3600);
        assert!(sub.submitted_at.is_none());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            SubmissionStatus::parse(SubmissionStatus::InProgress.as_str()),
            SubmissionStatus::InProgress
        );
        assert_eq!(
            SubmissionStatus::parse(SubmissionStatus::Completed.as_str()),
            SubmissionStatus::Completed
        );
    }

    #[test]
    fn test_status_parse_unknown_is_in_progress() {
        assert_eq!(SubmissionStatus::parse("paused"), SubmissionStatus::InProgress);
        assert_eq!(SubmissionStatus::parse(""), SubmissionStatus::InProgress);
    }

    #[test]
    fn test_answer_value_text_round_trip() {
        let value = AnswerValue::Text("I want them to know I tried.".to_string());
        let decoded = AnswerValue::decode(&value.encode());
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_answer_value_list_round_trip() {
        let value = AnswerValue::List(vec!["A".to_string(), "B".to_string()]);
        let encoded = value.encode();
        assert_eq!(encoded, "[\"A\",\"B\"]");
        assert_eq!(AnswerValue::decode(&encoded), value);
    }

    #[test]
    fn test_answer_value_empty_list_round_trip() {
        let value = AnswerValue::List(vec![]);
        assert_eq!(AnswerValue::decode(&value.encode()), value);
    }

    #[test]
    fn test_answer_value_decode_plain_string() {
        let decoded = AnswerValue::decode("just some text");
        assert_eq!(decoded, AnswerValue::Text("just some text".to_string()));
    }

    #[test]
    fn test_answer_value_decode_malformed_json_falls_back() {
        // Starts like an array but is not valid JSON; must degrade to text.
        let raw = "[\"A\", \"B\"";
        let decoded = AnswerValue::decode(raw);
        assert_eq!(decoded, AnswerValue::Text(raw.to_string()));
    }

    #[test]
    fn test_answer_value_decode_non_string_array_falls_back() {
        let raw = "[1, 2, 3]";
        let decoded = AnswerValue::decode(raw);
        assert_eq!(decoded, AnswerValue::Text(raw.to_string()));
    }

    #[test]
    fn test_answer_value_decode_bracket_in_prose() {
        let raw = "[unfinished thought";
        assert_eq!(AnswerValue::decode(raw), AnswerValue::Text(raw.to_string()));
    }

    #[test]
    fn test_answer_value_display() {
        assert_eq!(AnswerValue::Text("hi".into()).as_display(), "hi");
        assert_eq!(
            AnswerValue::List(vec!["A".into(), "B".into()]).as_display(),
            "A, B"
        );
    }

    #[test]
    fn test_answer_value_is_empty() {
        assert!(AnswerValue::Text(String::new()).is_empty());
        assert!(AnswerValue::List(vec![]).is_empty());
        assert!(!AnswerValue::Text("x".into()).is_empty());
    }

    #[test]
    fn test_answer_value_from_impls() {
        assert_eq!(AnswerValue::from("a"), AnswerValue::Text("a".into()));
        assert_eq!(
            AnswerValue::from(vec!["a".to_string()]),
            AnswerValue::List(vec!["a".into()])
        );
    }
}
