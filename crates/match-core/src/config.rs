//! Matching configuration
//!
//! Loaded from JSON or built in code. Every field has a default, so an empty
//! `{}` file is a valid config.

use crate::scorer::CompositeScorer;
use crate::ConfigError;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Score at or above which a match is flagged for attention
pub const DEFAULT_HIGH_SCORE_THRESHOLD: u8 = 80;

/// Configuration for a matching run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Reference date for age derivation; today when unset
    pub as_of: Option<NaiveDate>,
    /// Score patients in parallel (needs the `parallel` feature)
    pub parallel: bool,
    /// Threshold for high-score flags in summaries
    pub high_score_threshold: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            as_of: None,
            parallel: true,
            high_score_threshold: DEFAULT_HIGH_SCORE_THRESHOLD,
        }
    }
}

impl MatchConfig {
    /// Read a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Pin the reference date
    pub fn with_as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    /// Enable/disable parallel scoring
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Set the high-score threshold
    pub fn with_high_score_threshold(mut self, threshold: u8) -> Self {
        self.high_score_threshold = threshold;
        self
    }

    /// The configured date, or today's local date
    pub fn reference_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Scorer pinned to this config's reference date
    pub fn scorer(&self) -> CompositeScorer {
        CompositeScorer::new(self.reference_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatchConfig::default();
        assert_eq!(config.as_of, None);
        assert!(config.parallel);
        assert_eq!(config.high_score_threshold, 80);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config: MatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MatchConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"as_of": "2024-03-01", "high_score_threshold": 75}"#).unwrap();
        assert_eq!(config.as_of, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(config.high_score_threshold, 75);
        assert!(config.parallel);
    }

    #[test]
    fn test_builder() {
        let date = NaiveDate::from_ymd_opt(2023, 7, 4).unwrap();
        let config = MatchConfig::default()
            .with_as_of(date)
            .with_parallel(false)
            .with_high_score_threshold(90);
        assert_eq!(config.reference_date(), date);
        assert_eq!(config.scorer().as_of(), date);
        assert!(!config.parallel);
        assert_eq!(config.high_score_threshold, 90);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MatchConfig::from_file("/nonexistent/organ-match.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
