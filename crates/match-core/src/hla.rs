//! HLA compatibility
//!
//! Counts shared alleles between recipient and donor over the A, B and DR
//! loci. Each locus is compared as a set, so a homozygous pair only counts
//! once against a matching allele.

use crate::model::HlaTyping;
use std::collections::BTreeSet;

/// Two alleles at each of three loci
pub const MAX_HLA_MATCHES: u8 = 6;

fn allele_set(locus: &[Option<String>]) -> BTreeSet<&str> {
    locus
        .iter()
        .filter_map(|allele| allele.as_deref())
        .map(str::trim)
        .filter(|allele| !allele.is_empty())
        .collect()
}

/// Shared alleles across A, B and DR, capped at [`MAX_HLA_MATCHES`]
///
/// Missing typing on either side counts as zero matches.
pub fn count_matches(patient: Option<&HlaTyping>, donor: Option<&HlaTyping>) -> u8 {
    let (Some(patient), Some(donor)) = (patient, donor) else {
        return 0;
    };

    let shared: usize = patient
        .loci()
        .iter()
        .zip(donor.loci().iter())
        .map(|(p, d)| allele_set(p).intersection(&allele_set(d)).count())
        .sum();

    shared.min(usize::from(MAX_HLA_MATCHES)) as u8
}
