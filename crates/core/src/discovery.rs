//! Initial classification of fields found by a schema scan.
//!
//! Discovery hands over each source field with a first-pass confidence and,
//! optionally, a suggested target. [`classify_initial`] decides the status
//! the field starts in.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_mapping::{
    clamp_unit, validate_unit_range, FieldDataType, FieldMapping, MappingStatus,
};
use crate::session::IntegrationMappingSession;

/// Confidence at or above which a suggested target is accepted outright.
pub const DEFAULT_AUTO_MAP_THRESHOLD: f64 = 0.90;

/// Confidence at or above which a field is flagged for review.
pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.60;

/// Confidence bands used to pick a field's initial status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MappingThresholds {
    pub auto_map: f64,
    pub review: f64,
}

impl Default for MappingThresholds {
    fn default() -> Self {
        Self {
            auto_map: DEFAULT_AUTO_MAP_THRESHOLD,
            review: DEFAULT_REVIEW_THRESHOLD,
        }
    }
}

impl MappingThresholds {
    /// Both values must be in `[0.0, 1.0]` and `auto_map >= review`.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_range(self.auto_map, "auto_map threshold")?;
        validate_unit_range(self.review, "review threshold")?;
        if self.auto_map < self.review {
            return Err(CoreError::Validation(format!(
                "auto_map threshold ({}) must be >= review threshold ({})",
                self.auto_map, self.review
            )));
        }
        Ok(())
    }
}

/// Pick the starting status for a discovered field.
///
/// - `mapped` if `confidence >= auto_map` and a target was suggested
/// - `review` if `confidence >= review`
/// - `pending` otherwise
pub fn classify_initial(
    confidence: f64,
    suggested_target: Option<&str>,
    thresholds: &MappingThresholds,
) -> MappingStatus {
    let has_target = suggested_target.is_some_and(|t| !t.trim().is_empty());
    if confidence >= thresholds.auto_map && has_target {
        MappingStatus::Mapped
    } else if confidence >= thresholds.review {
        MappingStatus::Review
    } else {
        MappingStatus::Pending
    }
}

/// One source field reported by a schema scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredField {
    pub source_field: String,
    pub data_type: FieldDataType,
    #[serde(default)]
    pub examples: Vec<String>,
    pub suggested_target: Option<String>,
    pub confidence: f64,
}

impl DiscoveredField {
    /// Turn the scan result into a mapping with its initial status.
    ///
    /// Pending fields start with an empty target; review and mapped fields
    /// keep the suggestion.
    pub fn into_mapping(self, thresholds: &MappingThresholds) -> FieldMapping {
        let confidence = clamp_unit(self.confidence);
        let status = classify_initial(confidence, self.suggested_target.as_deref(), thresholds);
        let target_field = match status {
            MappingStatus::Pending | MappingStatus::Ignored => String::new(),
            MappingStatus::Mapped | MappingStatus::Review => self
                .suggested_target
                .map(|t| t.trim().to_string())
                .unwrap_or_default(),
        };

        FieldMapping {
            source_field: self.source_field,
            target_field,
            confidence,
            status,
            data_type: self.data_type,
            examples: self.examples,
            ai_suggestion: None,
        }
    }
}

impl IntegrationMappingSession {
    /// Build a session from a schema scan.
    ///
    /// `fields_discovered` is the number of scanned fields.
    pub fn from_discovery(
        integration_id: &str,
        display_name: &str,
        fields: Vec<DiscoveredField>,
        thresholds: &MappingThresholds,
    ) -> Result<Self, CoreError> {
        thresholds.validate()?;
        let fields_discovered = fields.len();
        let mappings = fields
            .into_iter()
            .map(|f| f.into_mapping(thresholds))
            .collect();
        Self::new(integration_id, display_name, fields_discovered, mappings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
