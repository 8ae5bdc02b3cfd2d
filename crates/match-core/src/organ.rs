//! Organ-specific profile scoring
//!
//! One strategy per organ, picked by the organ the patient needs. The caller
//! has already checked that the donor offers that organ. Each strategy reads
//! only organ metrics and, for thoracic organs, body size.
//!
//! | Organ    | Inputs                                   | Range      |
//! |----------|------------------------------------------|------------|
//! | Kidney   | HLA overlap, dialysis months             | 0 to 23    |
//! | Liver    | MELD score                               | 0 to 18    |
//! | Pancreas | donor C-peptide, diabetes history, HbA1c | 0 to 21    |
//! | Lung     | BMI difference, donor FEV1, diagnosis    | -10 to 25  |
//! | Heart    | BMI difference                           | -10 to 10  |

use crate::hla;
use crate::model::{Donor, Organ, Patient};
use crate::reason::{Reason, ReasonCode, ScoreTrail};

/// Points per shared HLA allele (6 matches = 15 points)
pub const HLA_POINTS_PER_MATCH: f64 = 2.5;

/// MELD score assumed when a liver candidate has none recorded
pub const DEFAULT_MELD_SCORE: i64 = 10;

/// Score the organ-specific profile of a pair
pub fn score_profile(patient: &Patient, donor: &Donor) -> ScoreTrail {
    let mut trail = ScoreTrail::new();
    match patient.organ_needed {
        Organ::Kidney => kidney(patient, donor, &mut trail),
        Organ::Liver => liver(patient, &mut trail),
        Organ::Pancreas => pancreas(patient, donor, &mut trail),
        Organ::Lung => lung(patient, donor, &mut trail),
        Organ::Heart => size_match(patient, donor, (10.0, 7.0), &mut trail),
    }
    trail
}

fn kidney(patient: &Patient, donor: &Donor, trail: &mut ScoreTrail) {
    let recipient = patient.metrics().and_then(|m| m.kidney());
    let source = donor.metrics().and_then(|m| m.kidney());

    let matches = hla::count_matches(
        recipient.and_then(|m| m.hla_typing.as_ref()),
        source.and_then(|m| m.hla_typing.as_ref()),
    );
    trail.award(
        f64::from(matches) * HLA_POINTS_PER_MATCH,
        Reason::with_detail(
            ReasonCode::HlaMatch,
            format!("HLA match: {}/{} markers", matches, hla::MAX_HLA_MATCHES),
        ),
    );

    let dialysis_months = recipient
        .and_then(|m| m.dialysis_duration_months)
        .unwrap_or(0);
    if dialysis_months > 36 {
        trail.award(8.0, ReasonCode::LongTermDialysis);
    }
}

fn liver(patient: &Patient, trail: &mut ScoreTrail) {
    let meld = patient
        .metrics()
        .and_then(|m| m.liver())
        .and_then(|m| m.meld_score)
        .unwrap_or(DEFAULT_MELD_SCORE);

    if meld >= 35 {
        trail.award(18.0, ReasonCode::MeldCritical);
    } else if meld >= 25 {
        trail.award(12.0, ReasonCode::MeldHigh);
    } else if meld >= 15 {
        trail.award(6.0, ReasonCode::MeldModerate);
    }
}

fn pancreas(patient: &Patient, donor: &Donor, trail: &mut ScoreTrail) {
    let recipient = patient.metrics().and_then(|m| m.pancreas());
    let source = donor.metrics().and_then(|m| m.pancreas());

    let c_peptide = source.and_then(|m| m.c_peptide_level).unwrap_or(0.0);
    if c_peptide > 0.5 {
        trail.award(12.0, ReasonCode::CPeptideGood);
    }

    let type_1 = recipient.and_then(|m| m.diabetes_type.as_deref()) == Some("Type 1");
    let insulin_years = recipient
        .and_then(|m| m.insulin_dependency_years)
        .unwrap_or(0);
    if type_1 && insulin_years > 5 {
        trail.award(6.0, ReasonCode::LongTermType1Diabetes);
    }

    let hba1c = recipient.and_then(|m| m.hba1c_level).unwrap_or(0.0);
    if hba1c > 8.0 {
        trail.award(3.0, ReasonCode::PoorGlycemicControl);
    }
}

fn lung(patient: &Patient, donor: &Donor, trail: &mut ScoreTrail) {
    size_match(patient, donor, (12.0, 8.0), trail);

    let fev1 = donor
        .metrics()
        .and_then(|m| m.lung())
        .and_then(|m| m.fev1_score)
        .unwrap_or(0.0);
    if fev1 >= 80.0 {
        trail.award(8.0, ReasonCode::Fev1Excellent);
    } else if fev1 >= 70.0 {
        trail.award(4.0, ReasonCode::Fev1Good);
    }

    let diagnosis = patient
        .metrics()
        .and_then(|m| m.lung())
        .and_then(|m| m.diagnosis.as_deref())
        .unwrap_or_default()
        .to_lowercase();
    if diagnosis.contains("ipf") || diagnosis.contains("pulmonary fibrosis") {
        trail.award(5.0, ReasonCode::IpfDiagnosis);
    }
}

/// BMI difference tiers; `(excellent, good)` points, mismatch is always -10
fn size_match(patient: &Patient, donor: &Donor, points: (f64, f64), trail: &mut ScoreTrail) {
    let (excellent, good) = points;
    let bmi_diff = (patient.bmi() - donor.bmi()).abs();

    if bmi_diff <= 3.0 {
        trail.award(excellent, ReasonCode::SizeExcellent);
    } else if bmi_diff <= 5.0 {
        trail.award(good, ReasonCode::SizeGood);
    } else {
        trail.award(-10.0, ReasonCode::SizeMismatch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn patient(organ: Organ, metrics: Option<RecipientMetrics>) -> Patient {
        Patient {
            patient_id: "PT-1".to_string(),
            name: "Recipient".to_string(),
            organ_needed: organ,
            blood_group: BloodGroup::OPositive,
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            weight_kg: 70.0,
            height_cm: 175.0,
            location: "Mumbai".to_string(),
            urgency_score: 50,
            organ_metrics: metrics,
            medical_history: BTreeSet::new(),
            status: RecordStatus::Active,
        }
    }

    fn donor(organ: Organ, metrics: Option<DonorMetrics>) -> Donor {
        Donor {
            donor_id: "DN-1".to_string(),
            name: "Source".to_string(),
            organ_type: organ,
            blood_group: BloodGroup::ONegative,
            date_of_birth: NaiveDate::from_ymd_opt(1982, 1, 1).unwrap(),
            weight_kg: 70.0,
            height_cm: 175.0,
            location: "Mumbai".to_string(),
            organ_metrics: metrics,
            medical_history: BTreeSet::new(),
            status: RecordStatus::Active,
        }
    }

    fn texts(trail: &ScoreTrail) -> Vec<String> {
        trail.reasons().iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_kidney_hla_and_dialysis() {
        let typing = HlaTyping::new(["A1", "A2"], ["B7", "B8"], ["DR1", "DR4"]);
        let p = patient(
            Organ::Kidney,
            Some(RecipientMetrics::Kidney(KidneyRecipient {
                hla_typing: Some(typing.clone()),
                dialysis_status: None,
                dialysis_duration_months: Some(40),
            })),
        );
        let d = donor(
            Organ::Kidney,
            Some(DonorMetrics::Kidney(KidneyDonor {
                hla_typing: Some(typing),
                ..KidneyDonor::default()
            })),
        );

        let trail = score_profile(&p, &d);
        assert_eq!(trail.points(), 23.0);
        assert_eq!(texts(&trail), vec!["HLA match: 6/6 markers", "Long-term dialysis priority"]);
    }

    #[test]
    fn test_kidney_without_typing_still_reports_hla() {
        let trail = score_profile(&patient(Organ::Kidney, None), &donor(Organ::Kidney, None));
        assert_eq!(trail.points(), 0.0);
        assert_eq!(texts(&trail), vec!["HLA match: 0/6 markers"]);
    }

    #[test]
    fn test_kidney_dialysis_threshold_is_exclusive() {
        let p = patient(
            Organ::Kidney,
            Some(RecipientMetrics::Kidney(KidneyRecipient {
                dialysis_duration_months: Some(36),
                ..KidneyRecipient::default()
            })),
        );
        let trail = score_profile(&p, &donor(Organ::Kidney, None));
        assert_eq!(trail.points(), 0.0);
    }

    #[test]
    fn test_liver_meld_tiers() {
        let cases = [(40, 18.0), (35, 18.0), (34, 12.0), (25, 12.0), (24, 6.0), (15, 6.0), (14, 0.0)];
        for (meld, expected) in cases {
            let p = patient(
                Organ::Liver,
                Some(RecipientMetrics::Liver(LiverRecipient {
                    meld_score: Some(meld),
                    diagnosis: None,
                })),
            );
            let trail = score_profile(&p, &donor(Organ::Liver, None));
            assert_eq!(trail.points(), expected, "MELD {}", meld);
        }
    }

    #[test]
    fn test_liver_missing_meld_defaults_low() {
        let trail = score_profile(&patient(Organ::Liver, None), &donor(Organ::Liver, None));
        assert_eq!(trail.points(), 0.0);
        assert!(trail.reasons().is_empty());
    }

    #[test]
    fn test_pancreas_all_terms() {
        let p = patient(
            Organ::Pancreas,
            Some(RecipientMetrics::Pancreas(PancreasRecipient {
                diabetes_type: Some("Type 1".to_string()),
                insulin_dependency_years: Some(12),
                hba1c_level: Some(9.1),
            })),
        );
        let d = donor(
            Organ::Pancreas,
            Some(DonorMetrics::Pancreas(PancreasDonor {
                c_peptide_level: Some(1.2),
                ..PancreasDonor::default()
            })),
        );
        let trail = score_profile(&p, &d);
        assert_eq!(trail.points(), 21.0);
        assert_eq!(
            texts(&trail),
            vec![
                "Good C-peptide levels",
                "Long-term Type 1 diabetes - high priority",
                "Poor glycemic control - transplant priority",
            ]
        );
    }

    #[test]
    fn test_pancreas_type_2_gets_no_priority() {
        let p = patient(
            Organ::Pancreas,
            Some(RecipientMetrics::Pancreas(PancreasRecipient {
                diabetes_type: Some("Type 2".to_string()),
                insulin_dependency_years: Some(20),
                hba1c_level: Some(7.0),
            })),
        );
        let trail = score_profile(&p, &donor(Organ::Pancreas, None));
        assert_eq!(trail.points(), 0.0);
    }

    #[test]
    fn test_lung_size_fev1_and_ipf() {
        let p = patient(
            Organ::Lung,
            Some(RecipientMetrics::Lung(LungRecipient {
                diagnosis: Some("Idiopathic Pulmonary Fibrosis".to_string()),
                ..LungRecipient::default()
            })),
        );
        let d = donor(
            Organ::Lung,
            Some(DonorMetrics::Lung(LungDonor {
                fev1_score: Some(75.0),
                ..LungDonor::default()
            })),
        );
        let trail = score_profile(&p, &d);
        assert_eq!(trail.points(), 12.0 + 4.0 + 5.0);
        assert_eq!(
            texts(&trail),
            vec!["Excellent size match", "Good donor FEV1 (70-79%)", "IPF diagnosis - high priority"]
        );
    }

    #[test]
    fn test_heart_size_tiers() {
        let p = patient(Organ::Heart, None);

        // Same build
        let trail = score_profile(&p, &donor(Organ::Heart, None));
        assert_eq!(trail.points(), 10.0);

        // 22.9 vs 27.1: diff 4.2
        let mut d = donor(Organ::Heart, None);
        d.weight_kg = 83.0;
        let trail = score_profile(&p, &d);
        assert_eq!(trail.points(), 7.0);

        // 22.9 vs 32.7: diff 9.8
        d.weight_kg = 100.0;
        let trail = score_profile(&p, &d);
        assert_eq!(trail.points(), -10.0);
        assert_eq!(texts(&trail), vec!["Size mismatch concern"]);
    }

    #[test]
    fn test_invalid_height_reads_as_zero_bmi() {
        let mut p = patient(Organ::Heart, None);
        p.height_cm = 0.0;
        let trail = score_profile(&p, &donor(Organ::Heart, None));
        assert_eq!(trail.points(), -10.0);
    }
}
