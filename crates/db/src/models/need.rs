//! Need entity model and DTOs.

use hearth_core::need::{NeedStatus, NeedStep};
use hearth_core::types::{EntityId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `needs` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Need {
    pub id: EntityId,
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub status: NeedStatus,
    #[sqlx(try_from = "String")]
    pub current_step: NeedStep,
    pub amount_needed_cents: i64,
    pub amount_raised_cents: i64,
    pub selected_address_id: Option<EntityId>,
    pub uses_non_primary_address: bool,
    pub submitted_at: Option<Timestamp>,
    pub verified_at: Option<Timestamp>,
    pub verified_by: Option<UserId>,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Need {
    /// A fresh draft positioned on the welcome step.
    pub fn new_draft(id: EntityId, user_id: UserId, now: Timestamp) -> Self {
        Self {
            id,
            user_id,
            status: NeedStatus::Draft,
            current_step: NeedStep::Welcome,
            amount_needed_cents: 0,
            amount_raised_cents: 0,
            selected_address_id: None,
            uses_non_primary_address: false,
            submitted_at: None,
            verified_at: None,
            verified_by: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
