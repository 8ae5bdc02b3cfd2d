//! Organ Match Core - Donor/Recipient Compatibility Engine
//!
//! Pure Rust implementation of the organ compatibility scoring pipeline:
//! hard eligibility gates, organ-specific sub-scores, geographic feasibility
//! and a deterministic best-donor selection over active records.
//!
//! # Features
//!
//! - ABO/Rh donor-acceptability lattice
//! - HLA-A/B/DR allele overlap counting (0-6)
//! - Haversine transport distance with a coarse regional fallback
//! - Kidney, Liver, Heart, Lung and Pancreas profile scoring
//! - Bounded integer scores with an ordered reason trail
//! - Optional parallel matching (`parallel` feature)
//!
//! # Example
//!
//! ```rust,ignore
//! use organ_match_core::{intake, MatchConfig, Matcher};
//!
//! let patients = intake::load_patients("patients.json")?;
//! let donors = intake::load_donors("donors.json")?;
//!
//! let matcher = Matcher::new(&MatchConfig::default());
//! for m in matcher.find_all_matches(&patients, &donors) {
//!     println!("{} <- {}: {}", m.patient_id, m.donor_id, m.score);
//! }
//! ```

pub mod blood;
pub mod config;
pub mod geo;
pub mod hla;
pub mod intake;
pub mod matcher;
pub mod model;
pub mod organ;
pub mod reason;
pub mod scorer;
pub mod summary;

// Re-export commonly used types for convenience
pub use config::MatchConfig;
pub use matcher::{find_all_matches, Match, MatchDetail, Matcher};
pub use model::{
    BloodGroup, Donor, DonorMetrics, HlaTyping, Organ, Patient, RecipientMetrics, RecordStatus,
    UnknownValue,
};
pub use reason::{Impact, Reason, ReasonCode};
pub use scorer::{CompositeScorer, ScoreCard};
pub use summary::MatchSummary;

/// Lowest score the engine ever reports
pub const MIN_SCORE: u8 = 0;

/// Highest score the engine ever reports
pub const MAX_SCORE: u8 = 100;

/// Errors raised while turning stored records into engine inputs
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// A closed-set field (blood group, organ, status) held an unknown value
    #[error("record {record}: {source}")]
    Rejected {
        record: String,
        #[source]
        source: UnknownValue,
    },
    /// Date of birth was not a `YYYY-MM-DD` date
    #[error("record {record}: invalid date of birth '{value}'")]
    InvalidDate { record: String, value: String },
    /// Body measurement was negative
    #[error("record {record}: invalid {field} {value}")]
    InvalidMeasurement {
        record: String,
        field: &'static str,
        value: f64,
    },
    /// Record file could not be read
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),
    /// Record file was not a JSON array of records
    #[error("failed to decode records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading a [`MatchConfig`] from disk
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intake_error_names_record() {
        let err = IntakeError::Rejected {
            record: "PT-001-2024-001".to_string(),
            source: UnknownValue::new("blood group", "C+"),
        };
        let message = err.to_string();
        assert!(message.contains("PT-001-2024-001"));
        assert!(message.contains("C+"));
    }

    #[test]
    fn test_score_bounds() {
        assert!(MIN_SCORE < MAX_SCORE);
        assert_eq!(MAX_SCORE, 100);
    }
}
