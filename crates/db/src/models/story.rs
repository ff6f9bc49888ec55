//! Need story model.

use hearth_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `need_stories` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct NeedStory {
    pub need_id: EntityId,
    pub current: Option<String>,
    pub need: Option<String>,
    pub outcome: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or replacing the story of a need.
#[derive(Debug, Clone)]
pub struct UpsertNeedStory {
    pub need_id: EntityId,
    pub current: String,
    pub need: String,
    pub outcome: String,
}
