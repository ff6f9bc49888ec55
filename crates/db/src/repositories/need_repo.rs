//! Repository for the `needs` table.

use hearth_core::need::NeedStatus;
use hearth_core::types::{EntityId, UserId};
use sqlx::PgPool;

use crate::models::need::Need;

/// Column list for `needs` queries.
const COLUMNS: &str = "id, user_id, status, current_step, amount_needed_cents, \
     amount_raised_cents, selected_address_id, uses_non_primary_address, \
     submitted_at, verified_at, verified_by, published_at, created_at, updated_at";

pub struct NeedRepo;

impl NeedRepo {
    /// Insert a new draft on the welcome step.
    pub async fn create(pool: &PgPool, id: EntityId, user_id: UserId) -> Result<Need, sqlx::Error> {
        let query = format!(
            "INSERT INTO needs (id, user_id, status, current_step) \
             VALUES ($1, $2, 'draft', 'welcome') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Need>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: EntityId) -> Result<Option<Need>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM needs WHERE id = $1");
        sqlx::query_as::<_, Need>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recent need still owned by the intake wizard
    /// (draft or awaiting confirmation).
    pub async fn find_in_flight_by_user(
        pool: &PgPool,
        user_id: UserId,
    ) -> Result<Option<Need>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM needs \
             WHERE user_id = $1 AND status IN ($2, $3) \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Need>(&query)
            .bind(user_id)
            .bind(NeedStatus::Draft.as_str())
            .bind(NeedStatus::Submitted.as_str())
            .fetch_optional(pool)
            .await
    }

    /// All needs owned by a user, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: UserId) -> Result<Vec<Need>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM needs \
             WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Need>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite every mutable column of a need. Returns `None` if the row
    /// no longer exists.
    pub async fn update(pool: &PgPool, need: &Need) -> Result<Option<Need>, sqlx::Error> {
        let query = format!(
            "UPDATE needs SET \
                status = $2, \
                current_step = $3, \
                amount_needed_cents = $4, \
                amount_raised_cents = $5, \
                selected_address_id = $6, \
                uses_non_primary_address = $7, \
                submitted_at = $8, \
                verified_at = $9, \
                verified_by = $10, \
                published_at = $11, \
                updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Need>(&query)
            .bind(need.id)
            .bind(need.status.as_str())
            .bind(need.current_step.as_str())
            .bind(need.amount_needed_cents)
            .bind(need.amount_raised_cents)
            .bind(need.selected_address_id)
            .bind(need.uses_non_primary_address)
            .bind(need.submitted_at)
            .bind(need.verified_at)
            .bind(need.verified_by)
            .bind(need.published_at)
            .fetch_optional(pool)
            .await
    }

    /// Delete a need. Stories, assignments, document rows and progress
    /// events cascade. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM needs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
