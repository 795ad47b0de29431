//! Sample mapping sessions for the dashboard demo.
//!
//! These mirror what a schema scan of each tool typically returns and cover
//! every mapping status.

use crate::error::CoreError;
use crate::field_mapping::{FieldDataType, FieldMapping, MappingStatus};
use crate::session::IntegrationMappingSession;

fn field(
    source: &str,
    target: &str,
    confidence: f64,
    status: MappingStatus,
    data_type: FieldDataType,
    examples: &[&str],
) -> FieldMapping {
    FieldMapping {
        source_field: source.to_string(),
        target_field: target.to_string(),
        confidence,
        status,
        data_type,
        examples: examples.iter().map(|e| e.to_string()).collect(),
        ai_suggestion: None,
    }
}

fn session(
    id: &str,
    name: &str,
    logo: &str,
    color: &str,
    fields_discovered: usize,
    mappings: Vec<FieldMapping>,
) -> Result<IntegrationMappingSession, CoreError> {
    Ok(IntegrationMappingSession::new(id, name, fields_discovered, mappings)?
        .with_branding(logo, color))
}

/// Jira sample: custom fields and a mix of statuses.
pub fn jira() -> Result<IntegrationMappingSession, CoreError> {
    use FieldDataType as T;
    use MappingStatus as S;

    session(
        "jira",
        "Jira",
        "/logos/jira.svg",
        "#0052CC",
        47,
        vec![
            field("summary", "title", 0.98, S::Mapped, T::String, &["Fix login redirect"]),
            field("description", "description", 0.96, S::Mapped, T::String, &["As a user..."]),
            field("status", "status", 0.94, S::Mapped, T::String, &["To Do", "Done"]),
            field("assignee", "assignee", 0.92, S::Mapped, T::String, &["jane.doe", "sam.lee"]),
            field("priority", "priority", 0.78, S::Review, T::String, &["Highest", "Medium"]),
            field("customfield_10016", "story_points", 0.71, S::Review, T::Number, &["3", "8"]),
            field("customfield_10045", "", 0.45, S::Pending, T::Number, &["12", "40"]),
            field("duedate", "", 0.52, S::Pending, T::Date, &["2024-03-15"]),
            field("labels", "", 0.38, S::Pending, T::Array, &["[\"frontend\", \"auth\"]"]),
            field("environment", "", 0.12, S::Ignored, T::String, &["production"]),
        ],
    )
}

/// Linear sample.
pub fn linear() -> Result<IntegrationMappingSession, CoreError> {
    use FieldDataType as T;
    use MappingStatus as S;

    session(
        "linear",
        "Linear",
        "/logos/linear.svg",
        "#5E6AD2",
        23,
        vec![
            field("title", "title", 0.99, S::Mapped, T::String, &["Ship onboarding v2"]),
            field("state", "status", 0.93, S::Mapped, T::String, &["Backlog", "Started"]),
            field("estimate", "estimate", 0.81, S::Review, T::Number, &["1", "2", "3"]),
            field("cycle", "", 0.55, S::Pending, T::String, &["Cycle 14"]),
            field("project", "", 0.48, S::Pending, T::String, &["Growth"]),
            field("sortOrder", "", 0.05, S::Ignored, T::Number, &["-1024.5"]),
        ],
    )
}

/// Monday.com sample: board columns with generic names.
pub fn monday() -> Result<IntegrationMappingSession, CoreError> {
    use FieldDataType as T;
    use MappingStatus as S;

    session(
        "monday",
        "Monday.com",
        "/logos/monday.svg",
        "#FF3D57",
        31,
        vec![
            field("name", "title", 0.91, S::Mapped, T::String, &["Q3 campaign brief"]),
            field("person", "", 0.58, S::Pending, T::String, &["Alex Kim"]),
            field("timeline", "", 0.42, S::Pending, T::Object, &["{\"from\":\"2024-04-01\"}"]),
            field("text0", "", 0.21, S::Pending, T::String, &["misc"]),
            field("color_status", "status", 0.67, S::Review, T::String, &["Stuck"]),
        ],
    )
}

/// All demo sessions.
pub fn sample_sessions() -> Result<Vec<IntegrationMappingSession>, CoreError> {
    Ok(vec![jira()?, linear()?, monday()?])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::session::DEFAULT_CONFIDENCE_CAP;

    #[test]
    fn samples_satisfy_invariants() {
        for session in sample_sessions().unwrap() {
            session.validate().unwrap();
            assert!(session.fields_mapped() <= session.fields_discovered);
            assert!(session.confidence <= DEFAULT_CONFIDENCE_CAP);
        }
    }

    #[test]
    fn samples_cover_every_status() {
        let all: Vec<_> = sample_sessions()
            .unwrap()
            .into_iter()
            .flat_map(|s| s.mappings)
            .collect();
        for status in [
            MappingStatus::Mapped,
            MappingStatus::Pending,
            MappingStatus::Review,
            MappingStatus::Ignored,
        ] {
            assert!(all.iter().any(|m| m.status == status), "missing {status}");
        }
    }

    #[test]
    fn sample_ids_are_unique() {
        let ids: Vec<_> = sample_sessions()
            .unwrap()
            .into_iter()
            .map(|s| s.integration_id)
            .collect();
        assert_eq!(ids, vec!["jira", "linear", "monday"]);
    }

    #[test]
    fn samples_carry_branding() {
        let sample = jira().unwrap();
        assert_eq!(sample.logo.as_deref(), Some("/logos/jira.svg"));
        assert_eq!(sample.color.as_deref(), Some("#0052CC"));
    }

    #[test]
    fn invalid_sample_is_rejected() {
        let broken = field("summary", "", 0.9, MappingStatus::Mapped, FieldDataType::String, &[]);
        let result = session("jira", "Jira", "/logos/jira.svg", "#0052CC", 1, vec![broken]);
        assert_matches!(result, Err(CoreError::Validation(_)));
    }
}
