//! ABO/Rh donor acceptability
//!
//! Static lattice: O- donates to everyone, AB+ receives from everyone,
//! Rh-negative recipients only accept Rh-negative donors.

use crate::model::BloodGroup::{self, *};

/// Donor groups each recipient group accepts
pub fn accepted_donors(recipient: BloodGroup) -> &'static [BloodGroup] {
    match recipient {
        APositive => &[APositive, ANegative, OPositive, ONegative],
        ANegative => &[ANegative, ONegative],
        BPositive => &[BPositive, BNegative, OPositive, ONegative],
        BNegative => &[BNegative, ONegative],
        ABPositive => &[
            APositive, ANegative, BPositive, BNegative, ABPositive, ABNegative, OPositive,
            ONegative,
        ],
        ABNegative => &[ANegative, BNegative, ABNegative, ONegative],
        OPositive => &[OPositive, ONegative],
        ONegative => &[ONegative],
    }
}

/// Can `donor` blood be given to `patient`
pub fn is_compatible(patient: BloodGroup, donor: BloodGroup) -> bool {
    accepted_donors(patient).contains(&donor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universal_donor() {
        for recipient in BloodGroup::ALL {
            assert!(is_compatible(recipient, ONegative), "{} should accept O-", recipient);
        }
    }

    #[test]
    fn test_universal_recipient() {
        for donor in BloodGroup::ALL {
            assert!(is_compatible(ABPositive, donor), "AB+ should accept {}", donor);
        }
    }

    #[test]
    fn test_a_positive_acceptance() {
        let accepted: Vec<_> = BloodGroup::ALL
            .into_iter()
            .filter(|d| is_compatible(APositive, *d))
            .collect();
        assert_eq!(accepted, vec![APositive, ANegative, OPositive, ONegative]);
    }

    #[test]
    fn test_rh_negative_rejects_rh_positive() {
        assert!(!is_compatible(ANegative, APositive));
        assert!(!is_compatible(ONegative, OPositive));
        assert!(!is_compatible(ABNegative, ABPositive));
    }

    #[test]
    fn test_abo_mismatch() {
        assert!(!is_compatible(APositive, BPositive));
        assert!(!is_compatible(OPositive, APositive));
        assert!(!is_compatible(BNegative, ABNegative));
    }

    #[test]
    fn test_every_group_accepts_itself() {
        for group in BloodGroup::ALL {
            assert!(is_compatible(group, group));
        }
    }
}
