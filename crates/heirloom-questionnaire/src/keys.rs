//! Repeatable-entity answer keys.
//!
//! Sections with a variable number of sub-forms (children, spouses, assets,
//! extra stories) synthesize question ids as `<prefix>_<index>_<field>`,
//! e.g. `q3_child_0_name`. The entity count is never stored; it is derived
//! from the keys present: `1 + max(index)`, defaulting to 1 when no key
//! matches. The UI only ever appends the next index, but the derivation
//! tolerates gaps by taking the maximum.

use serde::{Deserialize, Serialize};

/// The four repeatable sub-form families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Child,
    Spouse,
    Asset,
    Story,
}

impl EntityKind {
    /// The key prefix for this family.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Child => "q3_child",
            EntityKind::Spouse => "q4_spouse",
            EntityKind::Asset => "q5_asset",
            EntityKind::Story => "q6_story",
        }
    }

    /// The field written as a sentinel when a new entity block is added, so
    /// that subsequent count derivations see the block.
    pub fn first_field(&self) -> &'static str {
        match self {
            EntityKind::Child => "name",
            EntityKind::Spouse => "name",
            EntityKind::Asset => "description",
            EntityKind::Story => "text",
        }
    }

    /// All fields of one entity block, in display order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Child => &["name", "wishes", "message"],
            EntityKind::Spouse => &["name", "message"],
            EntityKind::Asset => &["description", "recipient", "reason"],
            EntityKind::Story => &["text"],
        }
    }
}

/// Synthesize the question id for one field of one entity block.
pub fn entity_key(prefix: &str, index: usize, field: &str) -> String {
    format!("{}_{}_{}", prefix, index, field)
}

/// Extract the entity index from a question id, if the id belongs to the
/// given prefix. Malformed ids (missing index segment, non-numeric index)
/// yield `None` and are ignored by the count derivation.
pub fn entity_index(question_id: &str, prefix: &str) -> Option<usize> {
    let rest = question_id.strip_prefix(prefix)?.strip_prefix('_')?;
    let (index, field) = rest.split_once('_')?;
    if field.is_empty() {
        return None;
    }
    index.parse().ok()
}

/// Derive how many entity blocks exist for a prefix given the stored
/// question ids: `1 + max(index)`, or 1 when no key matches.
pub fn derived_count<'a>(question_ids: impl IntoIterator<Item = &'a str>, prefix: &str) -> usize {
    question_ids
        .into_iter()
        .filter_map(|id| entity_index(id, prefix))
        .max()
        .map(|max| max + 1)
        .unwrap_or(1)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_shape() {
        assert_eq!(entity_key("q3_child", 0, "name"), "q3_child_0_name");
        assert_eq!(entity_key("q5_asset", 12, "reason"), "q5_asset_12_reason");
    }

    #[test]
    fn test_entity_index_parses() {
        assert_eq!(entity_index("q3_child_0_name", "q3_child"), Some(0));
        assert_eq!(entity_index("q3_child_7_message", "q3_child"), Some(7));
    }

    #[test]
    fn test_entity_index_rejects_other_prefix() {
        assert_eq!(entity_index("q4_spouse_0_name", "q3_child"), None);
        assert_eq!(entity_index("q1_full_name", "q3_child"), None);
    }

    #[test]
    fn test_entity_index_rejects_malformed() {
        assert_eq!(entity_index("q3_child", "q3_child"), None);
        assert_eq!(entity_index("q3_child_", "q3_child"), None);
        assert_eq!(entity_index("q3_child_x_name", "q3_child"), None);
        assert_eq!(entity_index("q3_child_0_", "q3_child"), None);
    }

    #[test]
    fn test_derived_count_default_is_one() {
        let ids: Vec<&str> = vec![];
        assert_eq!(derived_count(ids, "q3_child"), 1);
        assert_eq!(derived_count(["q1_full_name"], "q3_child"), 1);
    }

    #[test]
    fn test_derived_count_is_max_plus_one() {
        let ids = [
            "q3_child_0_name",
            "q3_child_0_wishes",
            "q3_child_1_name",
            "q3_child_2_message",
        ];
        assert_eq!(derived_count(ids, "q3_child"), 3);
    }

    #[test]
    fn test_derived_count_tolerates_gaps() {
        // Index 1 missing; the maximum still rules.
        let ids = ["q3_child_0_name", "q3_child_4_name"];
        assert_eq!(derived_count(ids, "q3_child"), 5);
    }

    #[test]
    fn test_derived_count_ignores_other_families() {
        let ids = ["q3_child_0_name", "q4_spouse_3_name", "q5_asset_1_reason"];
        assert_eq!(derived_count(ids.iter().copied(), "q3_child"), 1);
        assert_eq!(derived_count(ids.iter().copied(), "q4_spouse"), 4);
        assert_eq!(derived_count(ids, "q5_asset"), 2);
    }

    #[test]
    fn test_kind_prefixes_are_distinct() {
        let kinds = [
            EntityKind::Child,
            EntityKind::Spouse,
            EntityKind::Asset,
            EntityKind::Story,
        ];
        for a in &kinds {
            for b in &kinds {
                if a != b {
                    assert_ne!(a.prefix(), b.prefix());
                }
            }
        }
    }

    #[test]
    fn test_first_field_is_in_fields() {
        for kind in [
            EntityKind::Child,
            EntityKind::Spouse,
            EntityKind::Asset,
            EntityKind::Story,
        ] {
            assert!(kind.fields().contains(&kind.first_field()));
        }
    }
}
