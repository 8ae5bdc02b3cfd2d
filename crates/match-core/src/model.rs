//! Patient, donor and organ metric records
//!
//! Typed inputs for the scoring engine. Blood group, organ and status are
//! closed sets; values outside them are rejected at intake and never reach
//! a scorer.

use crate::intake::lenient;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A closed-set field held a value outside its set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        UnknownValue {
            field,
            value: value.into(),
        }
    }
}

/// Transplantable organ
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Organ {
    Kidney,
    Liver,
    Heart,
    Lung,
    Pancreas,
}

impl Organ {
    pub const ALL: [Organ; 5] = [
        Organ::Kidney,
        Organ::Liver,
        Organ::Heart,
        Organ::Lung,
        Organ::Pancreas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Organ::Kidney => "Kidney",
            Organ::Liver => "Liver",
            Organ::Heart => "Heart",
            Organ::Lung => "Lung",
            Organ::Pancreas => "Pancreas",
        }
    }
}

impl fmt::Display for Organ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Organ {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Organ::ALL
            .into_iter()
            .find(|organ| organ.as_str() == s.trim())
            .ok_or_else(|| UnknownValue::new("organ", s))
    }
}

/// ABO blood group with Rh factor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    ABPositive,
    #[serde(rename = "AB-")]
    ABNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::ABPositive,
        BloodGroup::ABNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::ABPositive => "AB+",
            BloodGroup::ABNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .into_iter()
            .find(|group| group.as_str() == wanted)
            .ok_or_else(|| UnknownValue::new("blood group", s))
    }
}

/// Whether a record takes part in matching
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Active,
    Inactive,
}

impl FromStr for RecordStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(RecordStatus::Active),
            "inactive" => Ok(RecordStatus::Inactive),
            _ => Err(UnknownValue::new("status", s)),
        }
    }
}

/// HLA typing across the A, B and DR loci, two alleles each
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HlaTyping {
    #[serde(default)]
    pub hla_a: Vec<Option<String>>,
    #[serde(default)]
    pub hla_b: Vec<Option<String>>,
    #[serde(default)]
    pub hla_dr: Vec<Option<String>>,
}

impl HlaTyping {
    /// Build a typing from `[first, second]` allele pairs per locus
    pub fn new(hla_a: [&str; 2], hla_b: [&str; 2], hla_dr: [&str; 2]) -> Self {
        let pair = |alleles: [&str; 2]| alleles.iter().map(|a| Some(a.to_string())).collect();
        HlaTyping {
            hla_a: pair(hla_a),
            hla_b: pair(hla_b),
            hla_dr: pair(hla_dr),
        }
    }

    /// The three loci in A, B, DR order
    pub fn loci(&self) -> [&[Option<String>]; 3] {
        [&self.hla_a, &self.hla_b, &self.hla_dr]
    }

    /// True when no locus carries a usable allele
    pub fn is_empty(&self) -> bool {
        self.loci()
            .iter()
            .flat_map(|locus| locus.iter())
            .all(|allele| allele.as_deref().map_or(true, |a| a.trim().is_empty()))
    }
}

// =============================================================================
// Recipient metrics
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KidneyRecipient {
    #[serde(default)]
    pub hla_typing: Option<HlaTyping>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub dialysis_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub dialysis_duration_months: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiverRecipient {
    /// Missing scores are read as 10
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub meld_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub diagnosis: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRecipient {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub ejection_fraction: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub unos_status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LungRecipient {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub oxygen_dependency: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub six_minute_walk_test: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub fev1_score: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PancreasRecipient {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub diabetes_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub insulin_dependency_years: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub hba1c_level: Option<f64>,
}

/// Organ-specific clinical metrics of a transplant candidate
#[derive(Clone, Debug, PartialEq)]
pub enum RecipientMetrics {
    Kidney(KidneyRecipient),
    Liver(LiverRecipient),
    Heart(HeartRecipient),
    Lung(LungRecipient),
    Pancreas(PancreasRecipient),
}

impl RecipientMetrics {
    pub fn organ(&self) -> Organ {
        match self {
            RecipientMetrics::Kidney(_) => Organ::Kidney,
            RecipientMetrics::Liver(_) => Organ::Liver,
            RecipientMetrics::Heart(_) => Organ::Heart,
            RecipientMetrics::Lung(_) => Organ::Lung,
            RecipientMetrics::Pancreas(_) => Organ::Pancreas,
        }
    }

    pub fn kidney(&self) -> Option<&KidneyRecipient> {
        match self {
            RecipientMetrics::Kidney(m) => Some(m),
            _ => None,
        }
    }

    pub fn liver(&self) -> Option<&LiverRecipient> {
        match self {
            RecipientMetrics::Liver(m) => Some(m),
            _ => None,
        }
    }

    pub fn lung(&self) -> Option<&LungRecipient> {
        match self {
            RecipientMetrics::Lung(m) => Some(m),
            _ => None,
        }
    }

    pub fn pancreas(&self) -> Option<&PancreasRecipient> {
        match self {
            RecipientMetrics::Pancreas(m) => Some(m),
            _ => None,
        }
    }
}

// =============================================================================
// Donor metrics
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KidneyDonor {
    #[serde(default)]
    pub hla_typing: Option<HlaTyping>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub serum_creatinine: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub kidney_function: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiverDonor {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub alt: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub ast: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub liver_condition: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartDonor {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub ejection_fraction: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub heart_condition: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LungDonor {
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub fev1_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub smoking_history: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub chest_xray_status: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PancreasDonor {
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub pancreas_function: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_float")]
    pub c_peptide_level: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub islet_cell_viability: Option<i64>,
}

/// Organ-specific clinical metrics of an organ source
#[derive(Clone, Debug, PartialEq)]
pub enum DonorMetrics {
    Kidney(KidneyDonor),
    Liver(LiverDonor),
    Heart(HeartDonor),
    Lung(LungDonor),
    Pancreas(PancreasDonor),
}

impl DonorMetrics {
    pub fn organ(&self) -> Organ {
        match self {
            DonorMetrics::Kidney(_) => Organ::Kidney,
            DonorMetrics::Liver(_) => Organ::Liver,
            DonorMetrics::Heart(_) => Organ::Heart,
            DonorMetrics::Lung(_) => Organ::Lung,
            DonorMetrics::Pancreas(_) => Organ::Pancreas,
        }
    }

    pub fn kidney(&self) -> Option<&KidneyDonor> {
        match self {
            DonorMetrics::Kidney(m) => Some(m),
            _ => None,
        }
    }

    pub fn lung(&self) -> Option<&LungDonor> {
        match self {
            DonorMetrics::Lung(m) => Some(m),
            _ => None,
        }
    }

    pub fn pancreas(&self) -> Option<&PancreasDonor> {
        match self {
            DonorMetrics::Pancreas(m) => Some(m),
            _ => None,
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Transplant candidate
#[derive(Clone, Debug, PartialEq)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub organ_needed: Organ,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    /// Free-text place name
    pub location: String,
    /// 0-100
    pub urgency_score: u8,
    pub organ_metrics: Option<RecipientMetrics>,
    pub medical_history: BTreeSet<String>,
    pub status: RecordStatus,
}

impl Patient {
    /// Metrics, provided their shape matches the organ needed
    pub fn metrics(&self) -> Option<&RecipientMetrics> {
        self.organ_metrics
            .as_ref()
            .filter(|m| m.organ() == self.organ_needed)
    }

    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }

    pub fn age_on(&self, as_of: NaiveDate) -> i32 {
        age_on(self.date_of_birth, as_of)
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Organ source
#[derive(Clone, Debug, PartialEq)]
pub struct Donor {
    pub donor_id: String,
    pub name: String,
    pub organ_type: Organ,
    pub blood_group: BloodGroup,
    pub date_of_birth: NaiveDate,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub location: String,
    pub organ_metrics: Option<DonorMetrics>,
    pub medical_history: BTreeSet<String>,
    pub status: RecordStatus,
}

impl Donor {
    /// Metrics, provided their shape matches the organ offered
    pub fn metrics(&self) -> Option<&DonorMetrics> {
        self.organ_metrics
            .as_ref()
            .filter(|m| m.organ() == self.organ_type)
    }

    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }

    pub fn age_on(&self, as_of: NaiveDate) -> i32 {
        age_on(self.date_of_birth, as_of)
    }

    pub fn has_condition(&self, label: &str) -> bool {
        self.medical_history.contains(label)
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// BMI rounded to one decimal; 0 when height is not positive
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    if !(height_m > 0.0) || !weight_kg.is_finite() {
        return 0.0;
    }
    (weight_kg / (height_m * height_m) * 10.0).round() / 10.0
}

/// Whole years lived on `as_of`
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let before_birthday = (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day());
    as_of.year() - date_of_birth.year() - i32::from(before_birthday)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_blood_group_parse_roundtrip() {
        for group in BloodGroup::ALL {
            assert_eq!(group.as_str().parse::<BloodGroup>().unwrap(), group);
        }
        assert_eq!(" ab- ".parse::<BloodGroup>().unwrap(), BloodGroup::ABNegative);
        assert!("C+".parse::<BloodGroup>().is_err());
        assert!("".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_organ_parse_is_closed_set() {
        assert_eq!("Kidney".parse::<Organ>().unwrap(), Organ::Kidney);
        assert_eq!(" Lung".parse::<Organ>().unwrap(), Organ::Lung);
        let err = "Cornea".parse::<Organ>().unwrap_err();
        assert_eq!(err.field, "organ");
        assert_eq!(err.value, "Cornea");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<RecordStatus>().unwrap(), RecordStatus::Active);
        assert_eq!("inactive".parse::<RecordStatus>().unwrap(), RecordStatus::Inactive);
        assert!("archived".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_bmi() {
        assert_eq!(body_mass_index(70.0, 175.0), 22.9);
        assert_eq!(body_mass_index(70.0, 0.0), 0.0);
        assert_eq!(body_mass_index(70.0, -10.0), 0.0);
    }

    #[test]
    fn test_age_respects_birthday() {
        let dob = date("1990-06-15");
        assert_eq!(age_on(dob, date("2024-06-14")), 33);
        assert_eq!(age_on(dob, date("2024-06-15")), 34);
        assert_eq!(age_on(dob, date("2024-12-31")), 34);
    }

    #[test]
    fn test_hla_typing_empty() {
        assert!(HlaTyping::default().is_empty());
        let blank = HlaTyping {
            hla_a: vec![Some(String::new()), None],
            ..HlaTyping::default()
        };
        assert!(blank.is_empty());
        assert!(!HlaTyping::new(["A1", "A2"], ["B7", "B8"], ["DR1", "DR4"]).is_empty());
    }

    #[test]
    fn test_mismatched_metrics_shape_reads_as_empty() {
        let patient = Patient {
            patient_id: "PT-1".to_string(),
            name: "Test".to_string(),
            organ_needed: Organ::Heart,
            blood_group: BloodGroup::OPositive,
            date_of_birth: date("1980-01-01"),
            weight_kg: 70.0,
            height_cm: 175.0,
            location: "Pune".to_string(),
            urgency_score: 50,
            organ_metrics: Some(RecipientMetrics::Liver(LiverRecipient::default())),
            medical_history: BTreeSet::new(),
            status: RecordStatus::Active,
        };
        assert!(patient.metrics().is_none());
    }
}
