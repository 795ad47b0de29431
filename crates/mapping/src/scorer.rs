//! Field scoring seam used by analysis runs.
//!
//! The session manager calls [`FieldScorer::score_field`] once per pending
//! field. Production deployments plug in a remote analysis service here;
//! [`NameSimilarityScorer`] is the deterministic local fallback.

use std::time::Duration;

use async_trait::async_trait;
use pm33_core::schema;
use pm33_core::FieldMapping;

/// Result of scoring one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldScore {
    /// Match confidence. Values outside `[0.0, 1.0]` are clamped on apply.
    pub confidence: f64,
    /// Human-readable rationale shown next to the field.
    pub suggestion: String,
}

impl FieldScore {
    pub fn new(confidence: f64, suggestion: impl Into<String>) -> Self {
        Self {
            confidence,
            suggestion: suggestion.into(),
        }
    }
}

/// Errors from a single scorer call.
///
/// A failed score leaves the field untouched and never aborts the rest of
/// the analysis run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("Scoring service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid scoring response: {0}")]
    InvalidResponse(String),

    #[error("Scoring timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces a confidence and rationale for a pending field.
#[async_trait]
pub trait FieldScorer: Send + Sync {
    async fn score_field(&self, mapping: &FieldMapping) -> Result<FieldScore, ScoreError>;
}

/// Scores fields by name similarity against the canonical PM33 schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameSimilarityScorer;

impl NameSimilarityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous scoring, shared by the trait impl.
    pub fn score(&self, mapping: &FieldMapping) -> FieldScore {
        let Some(best) = schema::best_target(&mapping.source_field, mapping.data_type) else {
            return FieldScore::new(
                0.0,
                format!("No canonical field resembles '{}'", mapping.source_field),
            );
        };

        let percent = (best.score * 100.0).round();
        let mut suggestion = match best.via_alias {
            Some(alias) => format!(
                "Likely maps to '{}' (matches common name '{alias}', {percent:.0}% confidence)",
                best.target
            ),
            None => format!(
                "Likely maps to '{}' ({percent:.0}% confidence)",
                best.target
            ),
        };
        if !best.type_match {
            suggestion.push_str(&format!(
                "; source values are {} which differs from the target type",
                mapping.data_type
            ));
        }

        FieldScore::new(best.score, suggestion)
    }
}

#[async_trait]
impl FieldScorer for NameSimilarityScorer {
    async fn score_field(&self, mapping: &FieldMapping) -> Result<FieldScore, ScoreError> {
        Ok(self.score(mapping))
    }
}

#[cfg(test)]
mod tests {
    use pm33_core::FieldDataType;

    use super::*;

    #[tokio::test]
    async fn scores_alias_match_highly() {
        let field = FieldMapping::pending("summary", FieldDataType::String);
        let score = NameSimilarityScorer::new().score_field(&field).await.unwrap();
        assert_eq!(score.confidence, 1.0);
        assert!(score.suggestion.contains("'title'"));
        assert!(score.suggestion.contains("'summary'"));
    }

    #[test]
    fn notes_type_mismatch() {
        let field = FieldMapping::pending("story_points", FieldDataType::Boolean);
        let score = NameSimilarityScorer::new().score(&field);
        assert!(score.suggestion.contains("boolean"));
        assert!(score.confidence < 1.0);
    }

    #[test]
    fn unmatchable_name_scores_zero() {
        let field = FieldMapping::pending("__", FieldDataType::String);
        let score = NameSimilarityScorer::new().score(&field);
        assert_eq!(score.confidence, 0.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let field = FieldMapping::pending("customfield_10045", FieldDataType::Number);
        let scorer = NameSimilarityScorer::new();
        assert_eq!(scorer.score(&field), scorer.score(&field));
    }
}
