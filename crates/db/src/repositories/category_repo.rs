//! Repositories for `need_categories` and `need_category_assignments`.

use hearth_core::types::EntityId;
use sqlx::PgPool;

use crate::models::category::{AssignCategory, CategoryAssignment, NeedCategory};

/// Column list for `need_categories` queries.
const COLUMNS: &str = "id, name, slug, description, icon, display_order, is_active, created_at";

/// Column list for `need_category_assignments` queries.
const ASSIGNMENT_COLUMNS: &str = "need_id, category_id, is_primary, created_at";

pub struct CategoryRepo;

impl CategoryRepo {
    /// Active categories in display order.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<NeedCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM need_categories \
             WHERE is_active \
             ORDER BY display_order, name"
        );
        sqlx::query_as::<_, NeedCategory>(&query)
            .fetch_all(pool)
            .await
    }

    /// Categories whose id is in `ids`, active or not. Unknown ids are
    /// absent from the result.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[EntityId],
    ) -> Result<Vec<NeedCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM need_categories \
             WHERE id = ANY($1) \
             ORDER BY display_order, name"
        );
        sqlx::query_as::<_, NeedCategory>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}

pub struct CategoryAssignmentRepo;

impl CategoryAssignmentRepo {
    /// Assignments for a need, primary first. Rows written by one
    /// `replace_all` share `created_at`, so `category_id` breaks ties.
    pub async fn list_by_need(
        pool: &PgPool,
        need_id: EntityId,
    ) -> Result<Vec<CategoryAssignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM need_category_assignments \
             WHERE need_id = $1 \
             ORDER BY is_primary DESC, created_at ASC, category_id ASC"
        );
        sqlx::query_as::<_, CategoryAssignment>(&query)
            .bind(need_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the whole assignment set of a need in one transaction.
    pub async fn replace_all(
        pool: &PgPool,
        need_id: EntityId,
        assignments: &[AssignCategory],
    ) -> Result<Vec<CategoryAssignment>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM need_category_assignments WHERE need_id = $1")
            .bind(need_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO need_category_assignments (need_id, category_id, is_primary) \
             VALUES ($1, $2, $3) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let mut rows = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let row = sqlx::query_as::<_, CategoryAssignment>(&query)
                .bind(need_id)
                .bind(assignment.category_id)
                .bind(assignment.is_primary)
                .fetch_one(&mut *tx)
                .await?;
            rows.push(row);
        }

        tx.commit().await?;
        Ok(rows)
    }
}
