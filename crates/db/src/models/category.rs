//! Category catalog and need-category assignment models.

use hearth_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `need_categories` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct NeedCategory {
    pub id: EntityId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// A row from the `need_category_assignments` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CategoryAssignment {
    pub need_id: EntityId,
    pub category_id: EntityId,
    pub is_primary: bool,
    pub created_at: Timestamp,
}

/// One entry of a replacement assignment set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignCategory {
    pub category_id: EntityId,
    pub is_primary: bool,
}

impl From<(EntityId, bool)> for AssignCategory {
    fn from((category_id, is_primary): (EntityId, bool)) -> Self {
        Self {
            category_id,
            is_primary,
        }
    }
}
