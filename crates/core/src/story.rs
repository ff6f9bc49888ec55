//! Story step rules: narrative fields and the funding amount.

use serde::Deserialize;

use crate::validation::{non_blank, FieldErrors};

/// Maximum length of each narrative field, in characters.
pub const MAX_STORY_FIELD_CHARS: usize = 5000;

/// Largest funding request accepted, in whole currency units.
pub const MAX_AMOUNT_WHOLE_UNITS: i64 = 1_000_000;

/// Minor units per whole currency unit.
pub const MINOR_UNITS_PER_WHOLE: i64 = 100;

/// Story form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryInput {
    /// The requester's current situation.
    pub current: Option<String>,
    /// What the requester needs.
    pub need: Option<String>,
    /// What funding this need would change.
    pub outcome: Option<String>,
    /// Requested amount in whole currency units.
    pub amount: Option<i64>,
}

/// A validated story with the amount already converted to minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidStory {
    pub current: String,
    pub need: String,
    pub outcome: String,
    pub amount_needed_cents: i64,
}

/// Convert whole currency units to integer minor units.
pub fn to_minor_units(whole: i64) -> Option<i64> {
    whole.checked_mul(MINOR_UNITS_PER_WHOLE)
}

pub fn validate_story(input: &StoryInput) -> Result<ValidStory, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut narrative = |field: &str, label: &str, value: Option<&str>| -> String {
        match non_blank(value) {
            None => {
                errors.add(field, format!("{label} is required"));
                String::new()
            }
            Some(text) if text.chars().count() > MAX_STORY_FIELD_CHARS => {
                errors.add(
                    field,
                    format!("{label} must be at most {MAX_STORY_FIELD_CHARS} characters"),
                );
                String::new()
            }
            Some(text) => text,
        }
    };

    let current = narrative("current", "Your current situation", input.current.as_deref());
    let need = narrative("need", "What you need", input.need.as_deref());
    let outcome = narrative("outcome", "The expected outcome", input.outcome.as_deref());

    let amount_needed_cents = match input.amount {
        None => {
            errors.add("amount", "Funding amount is required");
            0
        }
        Some(amount) if amount <= 0 => {
            errors.add("amount", "Funding amount must be greater than zero");
            0
        }
        Some(amount) if amount > MAX_AMOUNT_WHOLE_UNITS => {
            errors.add(
                "amount",
                format!("Funding amount must be at most {MAX_AMOUNT_WHOLE_UNITS}"),
            );
            0
        }
        Some(amount) => to_minor_units(amount).unwrap_or_default(),
    };

    errors.into_result()?;

    Ok(ValidStory {
        current,
        need,
        outcome,
        amount_needed_cents,
    })
}
