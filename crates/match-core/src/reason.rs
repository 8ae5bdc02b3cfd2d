//! Explanation trail
//!
//! Every rule that moves a score records a [`Reason`]. Reasons keep the
//! order in which rules fire; that order is part of the output contract.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for each rule tier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    BloodIncompatible,
    BloodExact,
    BloodUniversalDonor,
    BloodCompatible,
    OrganMismatch,
    HlaMatch,
    LongTermDialysis,
    MeldCritical,
    MeldHigh,
    MeldModerate,
    CPeptideGood,
    LongTermType1Diabetes,
    PoorGlycemicControl,
    SizeExcellent,
    SizeGood,
    SizeMismatch,
    Fev1Excellent,
    Fev1Good,
    IpfDiagnosis,
    DistanceTooFar,
    DistanceClose,
    DistanceAcceptable,
    DistanceSameCity,
    DistanceRegional,
    DistanceLong,
    DistanceExtended,
    UrgencyCritical,
    UrgencyHigh,
    UrgencyModerate,
    DonorActiveCancer,
    DonorActiveInfection,
    AgeSimilar,
    AgeAcceptable,
    LimitedClinicalData,
}

/// How a reason bears on viability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Positive,
    Caution,
    Negative,
    Info,
}

impl ReasonCode {
    pub fn impact(self) -> Impact {
        use ReasonCode::*;
        match self {
            BloodIncompatible | OrganMismatch | DistanceTooFar | DonorActiveCancer => Impact::Negative,
            MeldHigh | SizeMismatch | DistanceLong | DistanceExtended | UrgencyHigh
            | DonorActiveInfection => Impact::Caution,
            LimitedClinicalData => Impact::Info,
            _ => Impact::Positive,
        }
    }

    /// Fixed rendering; HLA matches carry their count in the detail instead
    pub fn text(self) -> &'static str {
        use ReasonCode::*;
        match self {
            BloodIncompatible => "Blood type incompatible",
            BloodExact => "Perfect blood match",
            BloodUniversalDonor => "Universal donor",
            BloodCompatible => "Compatible blood type",
            OrganMismatch => "Organ type mismatch",
            HlaMatch => "HLA match",
            LongTermDialysis => "Long-term dialysis priority",
            MeldCritical => "Critical MELD score (35+)",
            MeldHigh => "High MELD score (25-34)",
            MeldModerate => "Moderate MELD score (15-24)",
            CPeptideGood => "Good C-peptide levels",
            LongTermType1Diabetes => "Long-term Type 1 diabetes - high priority",
            PoorGlycemicControl => "Poor glycemic control - transplant priority",
            SizeExcellent => "Excellent size match",
            SizeGood => "Good size match",
            SizeMismatch => "Size mismatch concern",
            Fev1Excellent => "Excellent donor FEV1 (≥80%)",
            Fev1Good => "Good donor FEV1 (70-79%)",
            IpfDiagnosis => "IPF diagnosis - high priority",
            DistanceTooFar => "Distance too far for organ viability",
            DistanceClose => "Excellent proximity (same region)",
            DistanceAcceptable => "Acceptable distance",
            DistanceSameCity => "Same city - minimal transport time",
            DistanceRegional => "Regional match",
            DistanceLong => "Longer transport, still feasible",
            DistanceExtended => "Extended transport window - monitor viability",
            UrgencyCritical => "CRITICAL urgency",
            UrgencyHigh => "High urgency",
            UrgencyModerate => "Moderate urgency",
            DonorActiveCancer => "Donor has active cancer - contraindication",
            DonorActiveInfection => "Donor has active infection - review required",
            AgeSimilar => "Similar age range",
            AgeAcceptable => "Acceptable age difference",
            LimitedClinicalData => "Limited clinical markers supplied",
        }
    }
}

/// One entry of the explanation trail
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub code: ReasonCode,
    pub impact: Impact,
    pub detail: String,
}

impl Reason {
    pub fn new(code: ReasonCode) -> Self {
        Reason::with_detail(code, code.text())
    }

    pub fn with_detail(code: ReasonCode, detail: impl Into<String>) -> Self {
        Reason {
            code,
            impact: code.impact(),
            detail: detail.into(),
        }
    }
}

impl From<ReasonCode> for Reason {
    fn from(code: ReasonCode) -> Self {
        Reason::new(code)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Running point total plus the reasons that produced it
///
/// Points stay fractional until the final score is rounded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoreTrail {
    points: f64,
    reasons: Vec<Reason>,
}

impl ScoreTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points and record why
    pub fn award(&mut self, points: f64, reason: impl Into<Reason>) {
        self.points += points;
        self.reasons.push(reason.into());
    }

    /// Add points without a reason
    pub fn add(&mut self, points: f64) {
        self.points += points;
    }

    /// Record a reason that carries no points
    pub fn note(&mut self, reason: impl Into<Reason>) {
        self.reasons.push(reason.into());
    }

    /// Append another trail after this one
    pub fn extend(&mut self, other: ScoreTrail) {
        self.points += other.points;
        self.reasons.extend(other.reasons);
    }

    pub fn points(&self) -> f64 {
        self.points
    }

    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    pub fn into_parts(self) -> (f64, Vec<Reason>) {
        (self.points, self.reasons)
    }
}
