//! Field mapping status machine and source data types.
//!
//! A [`FieldMapping`] associates one field of an external tool with a field
//! of the canonical PM33 schema. Its [`MappingStatus`] only moves through
//! the transitions below:
//!
//! - `pending -> mapped` when a non-empty target is set
//! - `mapped -> pending` when the target is cleared
//! - any non-ignored status `-> ignored`
//!
//! `ignored` is terminal. Any mutation attempted on an ignored field fails
//! with [`CoreError::InvalidTransition`].

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Mapping status
// ---------------------------------------------------------------------------

/// Lifecycle stage of a field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingStatus {
    Mapped,
    Pending,
    Review,
    Ignored,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mapped => "mapped",
            Self::Pending => "pending",
            Self::Review => "review",
            Self::Ignored => "ignored",
        }
    }

    /// Parse a status string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mapped" => Some(Self::Mapped),
            "pending" => Some(Self::Pending),
            "review" => Some(Self::Review),
            "ignored" => Some(Self::Ignored),
            _ => None,
        }
    }

    /// Returns `true` if no operation may move the field out of this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    /// All valid status values.
    pub const ALL: &'static [&'static str] = &["mapped", "pending", "review", "ignored"];
}

impl std::fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Source data type
// ---------------------------------------------------------------------------

/// Shape of a source field's values. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    String,
    Number,
    Date,
    Boolean,
    Array,
    Object,
}

impl FieldDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// All valid data type values.
    pub const ALL: &'static [&'static str] =
        &["string", "number", "date", "boolean", "array", "object"];
}

impl std::fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

/// Association between an external field and a canonical target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field name in the external system. Unique within a session.
    pub source_field: String,
    /// Canonical target field name, empty when unset.
    pub target_field: String,
    /// Heuristic match score in `[0.0, 1.0]`.
    pub confidence: f64,
    pub status: MappingStatus,
    pub data_type: FieldDataType,
    /// Sample values for display.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Free-text rationale from the last analysis run.
    #[serde(default)]
    pub ai_suggestion: Option<String>,
}

impl FieldMapping {
    /// Create an unmapped field with zero confidence.
    pub fn pending(source_field: impl Into<String>, data_type: FieldDataType) -> Self {
        Self {
            source_field: source_field.into(),
            target_field: String::new(),
            confidence: 0.0,
            status: MappingStatus::Pending,
            data_type,
            examples: Vec::new(),
            ai_suggestion: None,
        }
    }

    /// Attach sample values.
    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Set the initial confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_mapped(&self) -> bool {
        self.status == MappingStatus::Mapped
    }

    pub fn is_pending(&self) -> bool {
        self.status == MappingStatus::Pending
    }

    /// Assign (or clear) the target field.
    ///
    /// The target is trimmed; an empty result clears the mapping and moves
    /// the field to `pending`, anything else moves it to `mapped`. Returns
    /// the resulting status.
    pub fn set_target(&mut self, target_field: &str) -> Result<MappingStatus, CoreError> {
        self.ensure_not_ignored("set target of")?;

        let target = target_field.trim();
        if target.is_empty() {
            self.target_field.clear();
            self.status = MappingStatus::Pending;
        } else {
            self.target_field = target.to_string();
            self.status = MappingStatus::Mapped;
        }
        Ok(self.status)
    }

    /// Exclude the field from the mapping. Terminal.
    pub fn ignore(&mut self) -> Result<(), CoreError> {
        self.ensure_not_ignored("ignore")?;
        self.status = MappingStatus::Ignored;
        Ok(())
    }

    /// Record an analysis result on a pending field.
    ///
    /// Returns `false` and leaves the field untouched when it is no longer
    /// pending. The status is never changed here.
    pub fn apply_score(&mut self, confidence: f64, suggestion: impl Into<String>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.confidence = clamp_unit(confidence);
        self.ai_suggestion = Some(suggestion.into());
        true
    }

    fn ensure_not_ignored(&self, action: &'static str) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                field: self.source_field.clone(),
                from: self.status,
                action,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Validate that a value lies in `[0.0, 1.0]`. NaN is rejected.
pub fn validate_unit_range(value: f64, name: &str) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "{name} must be between 0.0 and 1.0, got {value}"
        )))
    }
}

/// Clamp a score into `[0.0, 1.0]`, mapping NaN to `0.0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
