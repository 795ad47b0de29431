//! Canonical PM33 target schema and source-name matching.
//!
//! Matching uses Jaro-Winkler similarity on normalized names, taking the
//! best of the canonical name and its known aliases, then adjusts for data
//! type compatibility.

use std::cmp::Ordering;

use rapidfuzz::distance::jaro_winkler;

use crate::field_mapping::{clamp_unit, FieldDataType};

// ---------------------------------------------------------------------------
// Canonical fields
// ---------------------------------------------------------------------------

/// A field of the canonical PM33 work-item schema.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalField {
    pub name: &'static str,
    pub data_type: FieldDataType,
    /// Names other tools commonly use for the same field.
    pub aliases: &'static [&'static str],
}

pub const CANONICAL_FIELDS: &[CanonicalField] = &[
    CanonicalField {
        name: "title",
        data_type: FieldDataType::String,
        aliases: &["summary", "name", "subject", "item_name"],
    },
    CanonicalField {
        name: "description",
        data_type: FieldDataType::String,
        aliases: &["body", "details", "notes", "content"],
    },
    CanonicalField {
        name: "status",
        data_type: FieldDataType::String,
        aliases: &["state", "workflow_state", "stage"],
    },
    CanonicalField {
        name: "priority",
        data_type: FieldDataType::String,
        aliases: &["urgency", "severity", "rank"],
    },
    CanonicalField {
        name: "assignee",
        data_type: FieldDataType::String,
        aliases: &["owner", "assigned_to", "person", "people"],
    },
    CanonicalField {
        name: "reporter",
        data_type: FieldDataType::String,
        aliases: &["creator", "author", "requested_by"],
    },
    CanonicalField {
        name: "due_date",
        data_type: FieldDataType::Date,
        aliases: &["duedate", "deadline", "target_date", "timeline"],
    },
    CanonicalField {
        name: "created_at",
        data_type: FieldDataType::Date,
        aliases: &["created", "creation_date", "created_on"],
    },
    CanonicalField {
        name: "updated_at",
        data_type: FieldDataType::Date,
        aliases: &["updated", "modified", "last_updated"],
    },
    CanonicalField {
        name: "labels",
        data_type: FieldDataType::Array,
        aliases: &["tags", "components", "categories"],
    },
    CanonicalField {
        name: "story_points",
        data_type: FieldDataType::Number,
        aliases: &["points", "storypoints", "story_point_estimate"],
    },
    CanonicalField {
        name: "estimate",
        data_type: FieldDataType::Number,
        aliases: &["time_estimate", "original_estimate", "effort"],
    },
    CanonicalField {
        name: "sprint",
        data_type: FieldDataType::String,
        aliases: &["cycle", "iteration", "milestone"],
    },
    CanonicalField {
        name: "epic",
        data_type: FieldDataType::String,
        aliases: &["epic_link", "initiative", "project_group"],
    },
    CanonicalField {
        name: "parent_id",
        data_type: FieldDataType::String,
        aliases: &["parent", "parent_key", "parent_item"],
    },
    CanonicalField {
        name: "team",
        data_type: FieldDataType::String,
        aliases: &["squad", "group", "board"],
    },
    CanonicalField {
        name: "project",
        data_type: FieldDataType::String,
        aliases: &["project_key", "workspace", "space"],
    },
];

/// Look up a canonical field by name.
pub fn canonical_field(name: &str) -> Option<&'static CanonicalField> {
    CANONICAL_FIELDS.iter().find(|f| f.name == name)
}

/// Returns `true` if `name` is a field of the canonical schema.
pub fn is_canonical(name: &str) -> bool {
    canonical_field(name).is_some()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Boost when the source data type equals the canonical field's type.
pub const TYPE_MATCH_BOOST: f64 = 0.05;

/// Penalty when the data types differ.
pub const TYPE_MISMATCH_PENALTY: f64 = 0.10;

/// Score of one canonical field against a source field.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaMatch {
    pub target: &'static str,
    /// Adjusted score in `[0.0, 1.0]`.
    pub score: f64,
    /// The alias that produced the best similarity, if not the name itself.
    pub via_alias: Option<&'static str>,
    pub type_match: bool,
}

/// Lowercase and strip everything except ASCII letters and digits.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn similarity(a: &str, b: &str) -> f64 {
    jaro_winkler::similarity(a.chars(), b.chars())
}

fn score_field(source: &str, data_type: FieldDataType, field: &CanonicalField) -> SchemaMatch {
    let mut best = similarity(source, &normalize(field.name));
    let mut via_alias = None;

    for alias in field.aliases {
        let sim = similarity(source, &normalize(alias));
        if sim > best {
            best = sim;
            via_alias = Some(*alias);
        }
    }

    let type_match = field.data_type == data_type;
    let adjusted = if type_match {
        best + TYPE_MATCH_BOOST
    } else {
        best - TYPE_MISMATCH_PENALTY
    };

    SchemaMatch {
        target: field.name,
        score: clamp_unit(adjusted),
        via_alias,
        type_match,
    }
}

/// Score every canonical field against a source field, best first.
pub fn rank_targets(source_field: &str, data_type: FieldDataType) -> Vec<SchemaMatch> {
    let source = normalize(source_field);
    if source.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<SchemaMatch> = CANONICAL_FIELDS
        .iter()
        .map(|f| score_field(&source, data_type, f))
        .collect();
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches
}

/// Best canonical match for a source field, if any.
pub fn best_target(source_field: &str, data_type: FieldDataType) -> Option<SchemaMatch> {
    rank_targets(source_field, data_type).into_iter().next()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize("Due Date"), "duedate");
        assert_eq!(normalize("customfield_10045"), "customfield10045");
        assert_eq!(normalize("__"), "");
    }

    #[test]
    fn exact_name_ranks_first() {
        let best = best_target("priority", FieldDataType::String).unwrap();
        assert_eq!(best.target, "priority");
        assert!(best.via_alias.is_none());
        assert!(best.type_match);
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn alias_resolves_to_canonical_name() {
        let best = best_target("summary", FieldDataType::String).unwrap();
        assert_eq!(best.target, "title");
        assert_eq!(best.via_alias, Some("summary"));
    }

    #[test]
    fn separators_do_not_matter() {
        let best = best_target("Due-Date", FieldDataType::Date).unwrap();
        assert_eq!(best.target, "due_date");
    }

    #[test]
    fn type_mismatch_lowers_score() {
        let matching = best_target("story_points", FieldDataType::Number).unwrap();
        let mismatched = rank_targets("story_points", FieldDataType::Boolean)
            .into_iter()
            .find(|m| m.target == "story_points")
            .unwrap();
        assert!(matching.score > mismatched.score);
        assert!(!mismatched.type_match);
    }

    #[test]
    fn ranking_is_sorted_and_complete() {
        let ranked = rank_targets("assigned_to", FieldDataType::String);
        assert_eq!(ranked.len(), CANONICAL_FIELDS.len());
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked[0].target, "assignee");
    }

    #[test]
    fn empty_name_has_no_match() {
        assert!(best_target("--", FieldDataType::String).is_none());
    }

    #[test]
    fn canonical_lookup() {
        assert!(is_canonical("labels"));
        assert!(!is_canonical("summary"));
        assert_eq!(
            canonical_field("due_date").map(|f| f.data_type),
            Some(FieldDataType::Date)
        );
    }
}
