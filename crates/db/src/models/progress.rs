//! Intake progress event model.

use hearth_core::need::NeedStep;
use hearth_core::types::{EntityId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `need_progress_events` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ProgressEvent {
    pub id: EntityId,
    pub need_id: EntityId,
    #[sqlx(try_from = "String")]
    pub step: NeedStep,
    pub created_at: Timestamp,
}
