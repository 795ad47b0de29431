//! Per-integration mapping session.
//!
//! An [`IntegrationMappingSession`] holds the ordered field mappings for one
//! external tool. Construction validates every invariant up front so that
//! the mutation methods only ever have to guard the status machine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::field_mapping::{validate_unit_range, FieldMapping, MappingStatus};
use crate::types::{IntegrationId, Timestamp};

/// Upper bound on the aggregate session confidence.
pub const DEFAULT_CONFIDENCE_CAP: f64 = 0.99;

/// Mapping state for a single external integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationMappingSession {
    pub integration_id: IntegrationId,
    pub display_name: String,
    pub logo: Option<String>,
    pub color: Option<String>,
    /// Number of source fields found during the schema scan.
    pub fields_discovered: usize,
    pub last_synced_at: Option<Timestamp>,
    /// Mean of all mapping confidences, capped.
    pub confidence: f64,
    /// Display order; stable across mutations.
    pub mappings: Vec<FieldMapping>,
}

impl IntegrationMappingSession {
    /// Build a validated session.
    ///
    /// Fails with [`CoreError::Validation`] when the id is empty, a source
    /// field repeats, a confidence lies outside `[0, 1]`, a mapped field has
    /// no target, or there are more mappings than discovered fields.
    pub fn new(
        integration_id: impl Into<IntegrationId>,
        display_name: impl Into<String>,
        fields_discovered: usize,
        mappings: Vec<FieldMapping>,
    ) -> Result<Self, CoreError> {
        let mut session = Self {
            integration_id: integration_id.into(),
            display_name: display_name.into(),
            logo: None,
            color: None,
            fields_discovered,
            last_synced_at: None,
            confidence: 0.0,
            mappings,
        };
        session.validate()?;
        session.recompute_confidence(DEFAULT_CONFIDENCE_CAP);
        Ok(session)
    }

    /// Attach presentation metadata.
    pub fn with_branding(mut self, logo: impl Into<String>, color: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self.color = Some(color.into());
        self
    }

    pub fn with_last_synced_at(mut self, at: Timestamp) -> Self {
        self.last_synced_at = Some(at);
        self
    }

    /// Check every session invariant.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.integration_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "integration_id must not be empty".to_string(),
            ));
        }

        if self.mappings.len() > self.fields_discovered {
            return Err(CoreError::Validation(format!(
                "Session '{}' has {} mappings but only {} discovered fields",
                self.integration_id,
                self.mappings.len(),
                self.fields_discovered
            )));
        }

        let mut seen = HashSet::with_capacity(self.mappings.len());
        for mapping in &self.mappings {
            if !seen.insert(mapping.source_field.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate source field '{}' in session '{}'",
                    mapping.source_field, self.integration_id
                )));
            }
            validate_unit_range(
                mapping.confidence,
                &format!("confidence of '{}'", mapping.source_field),
            )?;
            if mapping.is_mapped() && mapping.target_field.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "Field '{}' is mapped but has no target field",
                    mapping.source_field
                )));
            }
        }

        Ok(())
    }

    pub fn mapping(&self, source_field: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.source_field == source_field)
    }

    fn mapping_mut(&mut self, source_field: &str) -> Result<&mut FieldMapping, CoreError> {
        let integration_id = &self.integration_id;
        self.mappings
            .iter_mut()
            .find(|m| m.source_field == source_field)
            .ok_or_else(|| CoreError::field_not_found(integration_id, source_field))
    }

    /// Assign or clear the target of one field.
    pub fn set_target_field(
        &mut self,
        source_field: &str,
        target_field: &str,
    ) -> Result<MappingStatus, CoreError> {
        self.mapping_mut(source_field)?.set_target(target_field)
    }

    /// Move one field to the terminal `ignored` status.
    pub fn ignore(&mut self, source_field: &str) -> Result<(), CoreError> {
        self.mapping_mut(source_field)?.ignore()
    }

    /// Apply an analysis result if the field is still pending.
    ///
    /// Unknown fields and fields that left `pending` are skipped and
    /// reported as `false`.
    pub fn apply_score(&mut self, source_field: &str, confidence: f64, suggestion: &str) -> bool {
        match self.mappings.iter_mut().find(|m| m.source_field == source_field) {
            Some(mapping) => mapping.apply_score(confidence, suggestion),
            None => false,
        }
    }

    /// Snapshot of every field currently pending.
    pub fn pending_fields(&self) -> Vec<FieldMapping> {
        self.mappings
            .iter()
            .filter(|m| m.is_pending())
            .cloned()
            .collect()
    }

    /// Mapped fields in display order.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.mappings.iter().filter(|m| m.is_mapped())
    }

    pub fn count(&self, status: MappingStatus) -> usize {
        self.mappings.iter().filter(|m| m.status == status).count()
    }

    pub fn fields_mapped(&self) -> usize {
        self.count(MappingStatus::Mapped)
    }

    /// Recompute the aggregate confidence as the mean of all mapping
    /// confidences, capped at `cap`. An empty session scores `0.0`.
    pub fn recompute_confidence(&mut self, cap: f64) -> f64 {
        self.confidence = if self.mappings.is_empty() {
            0.0
        } else {
            let total: f64 = self.mappings.iter().map(|m| m.confidence).sum();
            (total / self.mappings.len() as f64).min(cap)
        };
        self.confidence
    }

    pub fn summary(&self) -> MappingSummary {
        let mapped = self.fields_mapped();
        let progress_percent = if self.fields_discovered == 0 {
            0.0
        } else {
            mapped as f64 / self.fields_discovered as f64 * 100.0
        };

        MappingSummary {
            integration_id: self.integration_id.clone(),
            fields_discovered: self.fields_discovered,
            total_fields: self.mappings.len(),
            mapped,
            pending: self.count(MappingStatus::Pending),
            review: self.count(MappingStatus::Review),
            ignored: self.count(MappingStatus::Ignored),
            progress_percent,
            confidence: self.confidence,
        }
    }
}

/// Count of fields per status for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingSummary {
    pub integration_id: IntegrationId,
    pub fields_discovered: usize,
    pub total_fields: usize,
    pub mapped: usize,
    pub pending: usize,
    pub review: usize,
    pub ignored: usize,
    /// Mapped fields as a percentage of discovered fields.
    pub progress_percent: f64,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
