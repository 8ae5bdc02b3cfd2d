//! Composite compatibility scoring
//!
//! Runs a pair through the full rule pipeline:
//!
//! 1. Blood gate (terminal on failure), then blood points
//! 2. Organ gate (terminal on failure), then organ points and profile
//! 3. Distance term, tiered by ischemia sensitivity
//! 4. Urgency term
//! 5. Donor contraindications
//! 6. Age bonus
//! 7. Data-completeness penalty
//!
//! Points accumulate as `f64`; only the final sum is rounded (half to even)
//! and clamped to `0..=100`.

use crate::blood;
use crate::geo;
use crate::model::{BloodGroup, Donor, Organ, Patient};
use crate::organ;
use crate::reason::{Reason, ReasonCode, ScoreTrail};
use crate::{MAX_SCORE, MIN_SCORE};
use chrono::NaiveDate;
use serde::Serialize;

/// Flat award for a matching organ
pub const ORGAN_MATCH_POINTS: f64 = 25.0;

/// Urgency contributes `urgency * URGENCY_WEIGHT`, at most [`MAX_URGENCY_POINTS`]
pub const URGENCY_WEIGHT: f64 = 0.15;
pub const MAX_URGENCY_POINTS: f64 = 15.0;

/// Donor history labels that are a malignancy contraindication
pub const MALIGNANCY_LABELS: [&str; 2] = ["Active Cancer", "Malignancy"];
pub const INFECTION_LABEL: &str = "Active Infection";

/// Score and explanation for one patient/donor pair
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoreCard {
    /// 0-100; 0 means not a viable match
    pub score: u8,
    pub reasons: Vec<Reason>,
    /// Estimated transport distance; `None` when a gate stopped scoring first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<u32>,
}

impl ScoreCard {
    fn rejected(code: ReasonCode) -> Self {
        ScoreCard {
            score: MIN_SCORE,
            reasons: vec![Reason::new(code)],
            distance_km: None,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.score > MIN_SCORE
    }

    /// Reasons rendered as text, in order
    pub fn reason_texts(&self) -> Vec<String> {
        self.reasons.iter().map(ToString::to_string).collect()
    }
}

/// Stateless pair scorer
///
/// The only state is the reference date used to derive ages, so the same
/// inputs always produce the same card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositeScorer {
    as_of: NaiveDate,
}

impl CompositeScorer {
    pub fn new(as_of: NaiveDate) -> Self {
        CompositeScorer { as_of }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Score a single patient/donor pair
    pub fn score(&self, patient: &Patient, donor: &Donor) -> ScoreCard {
        if !blood::is_compatible(patient.blood_group, donor.blood_group) {
            return ScoreCard::rejected(ReasonCode::BloodIncompatible);
        }

        let mut trail = ScoreTrail::new();
        if patient.blood_group == donor.blood_group {
            trail.award(30.0, ReasonCode::BloodExact);
        } else if donor.blood_group == BloodGroup::ONegative {
            trail.award(28.0, ReasonCode::BloodUniversalDonor);
        } else {
            trail.award(24.0, ReasonCode::BloodCompatible);
        }

        if patient.organ_needed != donor.organ_type {
            return ScoreCard::rejected(ReasonCode::OrganMismatch);
        }

        trail.add(ORGAN_MATCH_POINTS);
        trail.extend(organ::score_profile(patient, donor));

        let distance = geo::distance_km(&patient.location, &donor.location);
        distance_term(patient.organ_needed, distance, &mut trail);
        urgency_term(patient.urgency_score, &mut trail);
        contraindications(donor, &mut trail);
        self.age_bonus(patient, donor, &mut trail);

        if patient.metrics().is_none() || donor.metrics().is_none() {
            trail.award(-5.0, ReasonCode::LimitedClinicalData);
        }

        let (points, reasons) = trail.into_parts();
        ScoreCard {
            score: clamp_score(points),
            reasons,
            distance_km: Some(distance),
        }
    }

    fn age_bonus(&self, patient: &Patient, donor: &Donor, trail: &mut ScoreTrail) {
        let age_diff = (patient.age_on(self.as_of) - donor.age_on(self.as_of)).abs();
        if age_diff <= 10 {
            trail.award(4.0, ReasonCode::AgeSimilar);
        } else if age_diff <= 20 {
            trail.award(2.0, ReasonCode::AgeAcceptable);
        }
    }
}

/// Heart/Lung tolerate the least cold ischemia, Kidney/Liver the most
fn distance_term(organ: Organ, distance: u32, trail: &mut ScoreTrail) {
    match organ {
        Organ::Heart | Organ::Lung => {
            if distance > 500 {
                trail.award(-30.0, ReasonCode::DistanceTooFar);
            } else if distance < 100 {
                trail.award(8.0, ReasonCode::DistanceClose);
            } else {
                trail.award(4.0, ReasonCode::DistanceAcceptable);
            }
        }
        Organ::Pancreas => {
            if distance == 0 {
                trail.award(6.0, ReasonCode::DistanceSameCity);
            } else if distance <= 300 {
                trail.award(4.0, ReasonCode::DistanceRegional);
            } else {
                trail.award(2.0, ReasonCode::DistanceLong);
            }
        }
        Organ::Kidney | Organ::Liver => {
            if distance == 0 {
                trail.award(6.0, ReasonCode::DistanceSameCity);
            } else if distance <= 300 {
                trail.award(5.0, ReasonCode::DistanceRegional);
            } else if distance <= 600 {
                trail.award(2.0, ReasonCode::DistanceLong);
            } else {
                trail.award(-3.0, ReasonCode::DistanceExtended);
            }
        }
    }
}

fn urgency_term(urgency: u8, trail: &mut ScoreTrail) {
    trail.add((f64::from(urgency) * URGENCY_WEIGHT).min(MAX_URGENCY_POINTS));

    if urgency >= 90 {
        trail.note(ReasonCode::UrgencyCritical);
    } else if urgency >= 70 {
        trail.note(ReasonCode::UrgencyHigh);
    } else if urgency >= 50 {
        trail.note(ReasonCode::UrgencyModerate);
    }
}

fn contraindications(donor: &Donor, trail: &mut ScoreTrail) {
    if MALIGNANCY_LABELS.iter().any(|label| donor.has_condition(label)) {
        trail.award(-50.0, ReasonCode::DonorActiveCancer);
    }
    if donor.has_condition(INFECTION_LABEL) {
        trail.award(-20.0, ReasonCode::DonorActiveInfection);
    }
}

fn clamp_score(points: f64) -> u8 {
    points
        .round_ties_even()
        .clamp(f64::from(MIN_SCORE), f64::from(MAX_SCORE)) as u8
}
