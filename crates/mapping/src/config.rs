use std::time::Duration;

use pm33_core::discovery::{
    MappingThresholds, DEFAULT_AUTO_MAP_THRESHOLD, DEFAULT_REVIEW_THRESHOLD,
};
use pm33_core::field_mapping::validate_unit_range;
use pm33_core::session::DEFAULT_CONFIDENCE_CAP;
use pm33_core::CoreError;

/// Default per-field scoring timeout in milliseconds.
pub const DEFAULT_SCORE_TIMEOUT_MS: u64 = 10_000;

/// Tunables for discovery classification and analysis runs.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Bands used to pick the initial status of discovered fields.
    pub thresholds: MappingThresholds,
    /// Upper bound on a session's aggregate confidence.
    pub confidence_cap: f64,
    /// Budget for a single scorer call. Expiry counts as a failed score.
    pub score_timeout: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: MappingThresholds::default(),
            confidence_cap: DEFAULT_CONFIDENCE_CAP,
            score_timeout: Duration::from_millis(DEFAULT_SCORE_TIMEOUT_MS),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `MAPPING_AUTO_MAP_THRESHOLD` | `0.90`  |
    /// | `MAPPING_REVIEW_THRESHOLD`   | `0.60`  |
    /// | `MAPPING_CONFIDENCE_CAP`     | `0.99`  |
    /// | `MAPPING_SCORE_TIMEOUT_MS`   | `10000` |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AnalysisConfig::from_env`] with an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auto_map = parse_or(&lookup, "MAPPING_AUTO_MAP_THRESHOLD", DEFAULT_AUTO_MAP_THRESHOLD)?;
        let review = parse_or(&lookup, "MAPPING_REVIEW_THRESHOLD", DEFAULT_REVIEW_THRESHOLD)?;
        let confidence_cap = parse_or(&lookup, "MAPPING_CONFIDENCE_CAP", DEFAULT_CONFIDENCE_CAP)?;
        let timeout_ms = parse_or(&lookup, "MAPPING_SCORE_TIMEOUT_MS", DEFAULT_SCORE_TIMEOUT_MS)?;

        let config = Self {
            thresholds: MappingThresholds { auto_map, review },
            confidence_cap,
            score_timeout: Duration::from_millis(timeout_ms),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        self.thresholds.validate()?;
        validate_unit_range(self.confidence_cap, "confidence_cap")?;
        if self.score_timeout.is_zero() {
            return Err(CoreError::Validation(
                "score_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CoreError::Validation(format!("{key} has invalid value '{raw}'"))),
    }
}
