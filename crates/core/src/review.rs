//! Review step rules.

use serde::Deserialize;

use crate::validation::FieldErrors;

/// The two agreements a requester must affirm before submitting.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ReviewAgreements {
    /// The information provided is accurate.
    #[serde(default)]
    pub confirm_accurate: bool,
    /// The requester accepts the platform terms and verification process.
    #[serde(default)]
    pub agree_terms: bool,
}

pub fn validate_agreements(agreements: &ReviewAgreements) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if !agreements.confirm_accurate {
        errors.add(
            "confirm_accurate",
            "Confirm that the information you provided is accurate",
        );
    }
    if !agreements.agree_terms {
        errors.add("agree_terms", "Agree to the terms to submit your need");
    }
    errors.into_result()
}
