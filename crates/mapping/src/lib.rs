//! PM33 field mapping session manager.
//!
//! [`SessionManager`] owns the mapping sessions of every open integration
//! and serializes mutations per session. Analysis is delegated to an
//! injected [`FieldScorer`]; [`NameSimilarityScorer`] is the built-in
//! deterministic implementation.

pub mod config;
pub mod manager;
pub mod scorer;

pub use config::AnalysisConfig;
pub use manager::{AnalysisReport, FailedScore, SessionManager};
pub use scorer::{FieldScore, FieldScorer, NameSimilarityScorer, ScoreError};
