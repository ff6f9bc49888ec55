//! Category step rules.
//!
//! A need carries exactly one primary category and a bounded set of
//! secondary categories, with no duplicate category ids.

use serde::Deserialize;

use crate::types::EntityId;
use crate::validation::FieldErrors;

/// Maximum number of secondary categories per need.
pub const MAX_SECONDARY_CATEGORIES: usize = 5;

/// Raw category choice. `primary` is a list so that multiple submitted
/// primary values can be detected and rejected rather than silently
/// truncated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategorySelection {
    #[serde(default)]
    pub primary: Vec<EntityId>,
    #[serde(default)]
    pub secondary: Vec<EntityId>,
}

/// A selection that satisfies the primary-uniqueness rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategories {
    pub primary: EntityId,
    /// Secondary ids in submission order, deduplicated, never containing
    /// the primary id.
    pub secondary: Vec<EntityId>,
}

impl ResolvedCategories {
    /// Every id in the selection, primary first.
    pub fn all_ids(&self) -> Vec<EntityId> {
        std::iter::once(self.primary)
            .chain(self.secondary.iter().copied())
            .collect()
    }

    /// `(category_id, is_primary)` rows for the assignment set.
    pub fn assignment_rows(&self) -> Vec<(EntityId, bool)> {
        std::iter::once((self.primary, true))
            .chain(self.secondary.iter().map(|id| (*id, false)))
            .collect()
    }
}

/// Validate the shape of a category selection (existence is checked
/// separately against the category store).
pub fn validate_category_selection(
    selection: &CategorySelection,
) -> Result<ResolvedCategories, FieldErrors> {
    let primary = match selection.primary.as_slice() {
        [] => {
            return Err(FieldErrors::single(
                "primary",
                "Select a primary category",
            ))
        }
        [only] => *only,
        many => {
            return Err(FieldErrors::single(
                "primary",
                format!("Select exactly one primary category ({} submitted)", many.len()),
            ))
        }
    };

    let mut secondary: Vec<EntityId> = Vec::with_capacity(selection.secondary.len());
    for id in &selection.secondary {
        if *id != primary && !secondary.contains(id) {
            secondary.push(*id);
        }
    }

    if secondary.len() > MAX_SECONDARY_CATEGORIES {
        return Err(FieldErrors::single(
            "secondary",
            format!("Select at most {MAX_SECONDARY_CATEGORIES} additional categories"),
        ));
    }

    Ok(ResolvedCategories { primary, secondary })
}

/// Ids from `requested` that are missing from `found`.
pub fn unresolved_ids(requested: &[EntityId], found: &[EntityId]) -> Vec<EntityId> {
    requested
        .iter()
        .filter(|id| !found.contains(id))
        .copied()
        .collect()
}
