//! Export envelope for confirmed field mappings.
//!
//! The JSON shape is consumed by downstream tools, so field names and casing
//! are fixed:
//!
//! ```json
//! {
//!   "integration": "jira",
//!   "name": "Jira",
//!   "exportedAt": "2026-01-01T00:00:00Z",
//!   "fieldMappings": [
//!     { "source": "summary", "target": "title", "dataType": "string", "confidence": 0.95 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_mapping::FieldDataType;
use crate::session::IntegrationMappingSession;
use crate::types::Timestamp;

/// One confirmed mapping in an export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedField {
    pub source: String,
    pub target: String,
    pub data_type: FieldDataType,
    pub confidence: f64,
}

/// Portable snapshot of a session's mapped fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingExport {
    pub integration: String,
    pub name: String,
    pub exported_at: Timestamp,
    pub field_mappings: Vec<ExportedField>,
}

/// Mapped fields of a session, in display order.
pub fn exported_fields(session: &IntegrationMappingSession) -> Vec<ExportedField> {
    session
        .mapped_fields()
        .map(|m| ExportedField {
            source: m.source_field.clone(),
            target: m.target_field.clone(),
            data_type: m.data_type,
            confidence: m.confidence,
        })
        .collect()
}

impl MappingExport {
    pub fn from_session(session: &IntegrationMappingSession, exported_at: Timestamp) -> Self {
        Self {
            integration: session.integration_id.clone(),
            name: session.display_name.clone(),
            exported_at,
            field_mappings: exported_fields(session),
        }
    }

    /// Serialize as pretty-printed UTF-8 JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Internal(format!("Failed to serialize export: {e}")))
    }

    /// Parse an export produced by [`MappingExport::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid mapping export: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::field_mapping::FieldMapping;

    fn session_with_one_mapped() -> IntegrationMappingSession {
        let mut summary =
            FieldMapping::pending("summary", FieldDataType::String).with_confidence(0.95);
        summary.set_target("title").unwrap();
        let pending = FieldMapping::pending("customfield_10045", FieldDataType::Number);
        IntegrationMappingSession::new("jira", "Jira", 2, vec![summary, pending]).unwrap()
    }

    #[test]
    fn only_mapped_fields_are_exported() {
        let export = MappingExport::from_session(&session_with_one_mapped(), chrono::Utc::now());
        assert_eq!(export.field_mappings.len(), 1);
        assert_eq!(export.field_mappings[0].source, "summary");
        assert_eq!(export.field_mappings[0].target, "title");
    }

    #[test]
    fn json_uses_contract_field_names() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let export = MappingExport::from_session(&session_with_one_mapped(), at);
        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();

        assert_eq!(value["integration"], "jira");
        assert_eq!(value["name"], "Jira");
        assert_eq!(value["exportedAt"], "2026-03-01T12:00:00Z");
        let entry = &value["fieldMappings"][0];
        assert_eq!(entry["source"], "summary");
        assert_eq!(entry["target"], "title");
        assert_eq!(entry["dataType"], "string");
        assert_eq!(entry["confidence"], 0.95);
        assert_eq!(value["fieldMappings"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_back_to_same_tuples() {
        let export = MappingExport::from_session(&session_with_one_mapped(), chrono::Utc::now());
        let parsed = MappingExport::from_json(&export.to_json().unwrap()).unwrap();
        assert_eq!(parsed, export);
    }

    #[test]
    fn rejects_malformed_json() {
        assert_matches!(
            MappingExport::from_json("{\"integration\": 1}"),
            Err(CoreError::Validation(_))
        );
    }
}
