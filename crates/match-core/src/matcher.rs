//! Best-donor matching
//!
//! Scores every active patient against every active donor and keeps each
//! patient's best donor. Donors are visited in input order and a later donor
//! only replaces the current best on a strictly greater score, so the first
//! donor seen wins ties. Patients whose best score is 0 are left out.
//!
//! The result is sorted by score, highest first, with a stable sort: equal
//! scores keep the input patient order. Runs are full recomputations with no
//! cached state, O(patients x donors).

use crate::config::MatchConfig;
use crate::geo;
use crate::model::{BloodGroup, Donor, Organ, Patient};
use crate::reason::Reason;
use crate::scorer::{CompositeScorer, ScoreCard};
use log::{debug, info};
use serde::Serialize;

/// A patient's best donor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Match {
    pub patient_id: String,
    pub patient_name: String,
    pub donor_id: String,
    pub donor_name: String,
    pub organ: Organ,
    pub urgency_score: u8,
    pub score: u8,
    pub reasons: Vec<Reason>,
    pub distance_km: u32,
}

/// Full breakdown of one patient/donor pair
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchDetail {
    pub patient_id: String,
    pub donor_id: String,
    pub patient_organ: Organ,
    pub donor_organ: Organ,
    pub patient_blood_group: BloodGroup,
    pub donor_blood_group: BloodGroup,
    pub score: u8,
    pub reasons: Vec<Reason>,
    pub distance_km: u32,
    pub patient_age: i32,
    pub donor_age: i32,
    pub patient_bmi: f64,
    pub donor_bmi: f64,
}

impl MatchDetail {
    pub fn is_viable(&self) -> bool {
        self.score > 0
    }
}

/// Runs the composite scorer over patient and donor snapshots
#[derive(Clone, Debug)]
pub struct Matcher {
    scorer: CompositeScorer,
    parallel: bool,
}

impl Matcher {
    pub fn new(config: &MatchConfig) -> Self {
        Matcher {
            scorer: config.scorer(),
            parallel: config.parallel,
        }
    }

    /// Matcher around an existing scorer, sequential
    pub fn with_scorer(scorer: CompositeScorer) -> Self {
        Matcher {
            scorer,
            parallel: false,
        }
    }

    pub fn scorer(&self) -> &CompositeScorer {
        &self.scorer
    }

    /// Best donor per active patient, ranked by score
    pub fn find_all_matches(&self, patients: &[Patient], donors: &[Donor]) -> Vec<Match> {
        let active_patients: Vec<&Patient> = patients.iter().filter(|p| p.is_active()).collect();
        let active_donors: Vec<&Donor> = donors.iter().filter(|d| d.is_active()).collect();

        let mut matches: Vec<Match> = self
            .best_per_patient(&active_patients, &active_donors)
            .into_iter()
            .flatten()
            .collect();

        // Stable: equal scores keep patient input order
        matches.sort_by(|a, b| b.score.cmp(&a.score));

        info!(
            "Matched {} of {} active patients against {} active donors",
            matches.len(),
            active_patients.len(),
            active_donors.len()
        );
        matches
    }

    /// Best donor for one patient, or `None` when no donor scores above 0
    pub fn best_donor_for(&self, patient: &Patient, donors: &[&Donor]) -> Option<Match> {
        let mut best: Option<(&Donor, ScoreCard)> = None;

        for &donor in donors {
            let card = self.scorer.score(patient, donor);
            let current = best.as_ref().map_or(0, |(_, c)| c.score);
            if card.score > current {
                best = Some((donor, card));
            }
        }

        let (donor, card) = best?;
        debug!(
            "Best donor for {}: {} (score {})",
            patient.patient_id, donor.donor_id, card.score
        );

        let distance_km = card
            .distance_km
            .unwrap_or_else(|| geo::distance_km(&patient.location, &donor.location));
        Some(Match {
            patient_id: patient.patient_id.clone(),
            patient_name: patient.name.clone(),
            donor_id: donor.donor_id.clone(),
            donor_name: donor.name.clone(),
            organ: patient.organ_needed,
            urgency_score: patient.urgency_score,
            score: card.score,
            reasons: card.reasons,
            distance_km,
        })
    }

    /// Score one pair regardless of status, with ages and BMIs
    pub fn pair_detail(&self, patient: &Patient, donor: &Donor) -> MatchDetail {
        let card = self.scorer.score(patient, donor);
        let as_of = self.scorer.as_of();

        MatchDetail {
            patient_id: patient.patient_id.clone(),
            donor_id: donor.donor_id.clone(),
            patient_organ: patient.organ_needed,
            donor_organ: donor.organ_type,
            patient_blood_group: patient.blood_group,
            donor_blood_group: donor.blood_group,
            score: card.score,
            reasons: card.reasons,
            distance_km: geo::distance_km(&patient.location, &donor.location),
            patient_age: patient.age_on(as_of),
            donor_age: donor.age_on(as_of),
            patient_bmi: patient.bmi(),
            donor_bmi: donor.bmi(),
        }
    }

    #[cfg(feature = "parallel")]
    fn best_per_patient(&self, patients: &[&Patient], donors: &[&Donor]) -> Vec<Option<Match>> {
        if !self.parallel {
            return self.best_per_patient_sequential(patients, donors);
        }

        use rayon::prelude::*;

        // Indexed collect keeps patient order
        patients
            .par_iter()
            .map(|patient| self.best_donor_for(patient, donors))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn best_per_patient(&self, patients: &[&Patient], donors: &[&Donor]) -> Vec<Option<Match>> {
        self.best_per_patient_sequential(patients, donors)
    }

    fn best_per_patient_sequential(
        &self,
        patients: &[&Patient],
        donors: &[&Donor],
    ) -> Vec<Option<Match>> {
        patients
            .iter()
            .map(|patient| self.best_donor_for(patient, donors))
            .collect()
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher::new(&MatchConfig::default())
    }
}

/// Rank matches with the default configuration (ages as of today)
pub fn find_all_matches(patients: &[Patient], donors: &[Donor]) -> Vec<Match> {
    Matcher::default().find_all_matches(patients, donors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn matcher() -> Matcher {
        let config = MatchConfig::default()
            .with_as_of(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_parallel(false);
        Matcher::new(&config)
    }

    fn patient(id: &str, organ: Organ, blood: BloodGroup, urgency: u8) -> Patient {
        Patient {
            patient_id: id.to_string(),
            name: format!("Patient {}", id),
            organ_needed: organ,
            blood_group: blood,
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            weight_kg: 70.0,
            height_cm: 175.0,
            location: "Mumbai".to_string(),
            urgency_score: urgency,
            organ_metrics: None,
            medical_history: BTreeSet::new(),
            status: RecordStatus::Active,
        }
    }

    fn donor(id: &str, organ: Organ, blood: BloodGroup, location: &str) -> Donor {
        Donor {
            donor_id: id.to_string(),
            name: format!("Donor {}", id),
            organ_type: organ,
            blood_group: blood,
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            weight_kg: 70.0,
            height_cm: 175.0,
            location: location.to_string(),
            organ_metrics: None,
            medical_history: BTreeSet::new(),
            status: RecordStatus::Active,
        }
    }

    #[test]
    fn test_first_donor_wins_ties() {
        let patients = vec![patient("P1", Organ::Liver, BloodGroup::APositive, 60)];
        let donors = vec![
            donor("D1", Organ::Liver, BloodGroup::APositive, "Mumbai"),
            donor("D2", Organ::Liver, BloodGroup::APositive, "Mumbai"),
            donor("D3", Organ::Liver, BloodGroup::APositive, "Delhi"),
        ];

        let matches = matcher().find_all_matches(&patients, &donors);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].donor_id, "D1");
    }

    #[test]
    fn test_later_strictly_better_donor_replaces() {
        let patients = vec![patient("P1", Organ::Liver, BloodGroup::APositive, 60)];
        let donors = vec![
            donor("D1", Organ::Liver, BloodGroup::OPositive, "Mumbai"),
            donor("D2", Organ::Liver, BloodGroup::APositive, "Mumbai"),
        ];

        let matches = matcher().find_all_matches(&patients, &donors);
        assert_eq!(matches[0].donor_id, "D2");
    }

    #[test]
    fn test_zero_score_patients_are_excluded() {
        let patients = vec![
            patient("P1", Organ::Heart, BloodGroup::APositive, 60),
            patient("P2", Organ::Liver, BloodGroup::ONegative, 60),
        ];
        let donors = vec![
            donor("D1", Organ::Lung, BloodGroup::APositive, "Mumbai"),
            donor("D2", Organ::Liver, BloodGroup::APositive, "Mumbai"),
        ];

        let matches = matcher().find_all_matches(&patients, &donors);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_inactive_records_are_skipped() {
        let mut inactive_patient = patient("P1", Organ::Liver, BloodGroup::APositive, 60);
        inactive_patient.status = RecordStatus::Inactive;
        let patients = vec![inactive_patient, patient("P2", Organ::Liver, BloodGroup::APositive, 60)];

        let mut inactive_donor = donor("D1", Organ::Liver, BloodGroup::APositive, "Mumbai");
        inactive_donor.status = RecordStatus::Inactive;
        let donors = vec![inactive_donor, donor("D2", Organ::Liver, BloodGroup::APositive, "Pune")];

        let matches = matcher().find_all_matches(&patients, &donors);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].patient_id, "P2");
        assert_eq!(matches[0].donor_id, "D2");
        assert_eq!(matches[0].distance_km, 120);
    }

    #[test]
    fn test_ranking_is_stable() {
        let patients = vec![
            patient("P1", Organ::Liver, BloodGroup::APositive, 0),
            patient("P2", Organ::Liver, BloodGroup::APositive, 100),
            patient("P3", Organ::Liver, BloodGroup::APositive, 0),
        ];
        let donors = vec![donor("D1", Organ::Liver, BloodGroup::APositive, "Mumbai")];

        let matches = matcher().find_all_matches(&patients, &donors);
        let order: Vec<&str> = matches.iter().map(|m| m.patient_id.as_str()).collect();
        assert_eq!(order, vec!["P2", "P1", "P3"]);
        assert_eq!(matches[1].score, matches[2].score);
    }

    #[test]
    fn test_same_donor_can_serve_many_patients() {
        let patients = vec![
            patient("P1", Organ::Liver, BloodGroup::APositive, 10),
            patient("P2", Organ::Liver, BloodGroup::ABPositive, 10),
        ];
        let donors = vec![donor("D1", Organ::Liver, BloodGroup::APositive, "Mumbai")];

        let matches = matcher().find_all_matches(&patients, &donors);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.donor_id == "D1"));
        // Exact blood match outranks the universal recipient
        assert_eq!(matches[0].patient_id, "P1");
    }

    #[test]
    fn test_pair_detail_for_non_viable_pair() {
        let p = patient("P1", Organ::Heart, BloodGroup::APositive, 60);
        let d = donor("D1", Organ::Lung, BloodGroup::APositive, "Pune");

        let detail = matcher().pair_detail(&p, &d);
        assert!(!detail.is_viable());
        assert_eq!(detail.distance_km, 120);
        assert_eq!(detail.patient_age, 45);
        assert_eq!(detail.donor_bmi, 22.9);
        assert_eq!(detail.reasons.len(), 1);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_sequential() {
        let patients: Vec<Patient> = (0..20)
            .map(|i| patient(&format!("P{}", i), Organ::Liver, BloodGroup::APositive, (i * 5) as u8))
            .collect();
        let donors = vec![
            donor("D1", Organ::Liver, BloodGroup::APositive, "Pune"),
            donor("D2", Organ::Liver, BloodGroup::OPositive, "Mumbai"),
        ];

        let sequential = matcher().find_all_matches(&patients, &donors);
        let parallel_config = MatchConfig::default()
            .with_as_of(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
            .with_parallel(true);
        let parallel = Matcher::new(&parallel_config).find_all_matches(&patients, &donors);
        assert_eq!(sequential, parallel);
    }
}
