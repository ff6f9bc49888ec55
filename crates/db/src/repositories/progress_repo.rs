//! Repository for the append-only `need_progress_events` table.

use hearth_core::need::NeedStep;
use hearth_core::types::EntityId;
use sqlx::PgPool;

use crate::models::progress::ProgressEvent;

/// Column list for `need_progress_events` queries.
const COLUMNS: &str = "id, need_id, step, created_at";

pub struct ProgressRepo;

impl ProgressRepo {
    pub async fn append(
        pool: &PgPool,
        id: EntityId,
        need_id: EntityId,
        step: NeedStep,
    ) -> Result<ProgressEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO need_progress_events (id, need_id, step) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProgressEvent>(&query)
            .bind(id)
            .bind(need_id)
            .bind(step.as_str())
            .fetch_one(pool)
            .await
    }

    /// Events for a need in the order they were recorded.
    pub async fn list_by_need(
        pool: &PgPool,
        need_id: EntityId,
    ) -> Result<Vec<ProgressEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM need_progress_events \
             WHERE need_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, ProgressEvent>(&query)
            .bind(need_id)
            .fetch_all(pool)
            .await
    }
}
