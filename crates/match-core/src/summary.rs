//! Dashboard-style rollups over a ranked match list

use crate::matcher::Match;
use serde::Serialize;

/// Urgency at which a matched patient counts as critical
pub const CRITICAL_URGENCY: u8 = 90;

/// Aggregate view of one matching run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub total_matches: usize,
    /// Mean score to one decimal; 0 when there are no matches
    pub average_score: f64,
    pub high_score_threshold: u8,
    pub high_score_count: usize,
    /// `(patient_id, donor_id)` of every match at or above the threshold
    pub high_score_pairs: Vec<(String, String)>,
    pub critical_patients: usize,
}

impl MatchSummary {
    pub fn from_matches(matches: &[Match], high_score_threshold: u8) -> Self {
        let total_matches = matches.len();
        let average_score = if total_matches == 0 {
            0.0
        } else {
            let sum: u32 = matches.iter().map(|m| u32::from(m.score)).sum();
            (f64::from(sum) / total_matches as f64 * 10.0).round() / 10.0
        };

        let high_score_pairs: Vec<(String, String)> = matches
            .iter()
            .filter(|m| m.score >= high_score_threshold)
            .map(|m| (m.patient_id.clone(), m.donor_id.clone()))
            .collect();

        MatchSummary {
            total_matches,
            average_score,
            high_score_threshold,
            high_score_count: high_score_pairs.len(),
            high_score_pairs,
            critical_patients: matches
                .iter()
                .filter(|m| m.urgency_score >= CRITICAL_URGENCY)
                .count(),
        }
    }
}
