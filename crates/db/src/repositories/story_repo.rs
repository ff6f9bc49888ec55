//! Repository for the `need_stories` table.

use hearth_core::types::EntityId;
use sqlx::PgPool;

use crate::models::story::{NeedStory, UpsertNeedStory};

/// Column list for `need_stories` queries.
const COLUMNS: &str = "need_id, current, need, outcome, created_at, updated_at";

pub struct StoryRepo;

impl StoryRepo {
    pub async fn find_by_need(
        pool: &PgPool,
        need_id: EntityId,
    ) -> Result<Option<NeedStory>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM need_stories WHERE need_id = $1");
        sqlx::query_as::<_, NeedStory>(&query)
            .bind(need_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert the story, or replace all three fields if one exists.
    pub async fn upsert(pool: &PgPool, input: &UpsertNeedStory) -> Result<NeedStory, sqlx::Error> {
        let query = format!(
            "INSERT INTO need_stories (need_id, current, need, outcome) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (need_id) DO UPDATE SET \
                current = EXCLUDED.current, \
                need = EXCLUDED.need, \
                outcome = EXCLUDED.outcome, \
                updated_at = now() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NeedStory>(&query)
            .bind(input.need_id)
            .bind(&input.current)
            .bind(&input.need)
            .bind(&input.outcome)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, need_id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM need_stories WHERE need_id = $1")
            .bind(need_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
