//! Repository for the `need_documents` table.

use hearth_core::types::EntityId;
use sqlx::PgPool;

use crate::models::document::{CreateNeedDocument, NeedDocument, UpdateNeedDocument};

/// Column list for `need_documents` queries.
const COLUMNS: &str = "id, need_id, user_id, document_type, file_name, file_size_bytes, \
     mime_type, storage_key, uploaded_at";

pub struct DocumentRepo;

impl DocumentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateNeedDocument,
    ) -> Result<NeedDocument, sqlx::Error> {
        let query = format!(
            "INSERT INTO need_documents \
                (id, need_id, user_id, document_type, file_name, file_size_bytes, \
                 mime_type, storage_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NeedDocument>(&query)
            .bind(input.id)
            .bind(input.need_id)
            .bind(input.user_id)
            .bind(input.document_type.as_str())
            .bind(&input.file_name)
            .bind(input.file_size_bytes)
            .bind(&input.mime_type)
            .bind(&input.storage_key)
            .fetch_one(pool)
            .await
    }

    /// Find a document scoped to its need.
    pub async fn find_for_need(
        pool: &PgPool,
        need_id: EntityId,
        id: EntityId,
    ) -> Result<Option<NeedDocument>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM need_documents WHERE id = $1 AND need_id = $2");
        sqlx::query_as::<_, NeedDocument>(&query)
            .bind(id)
            .bind(need_id)
            .fetch_optional(pool)
            .await
    }

    /// Documents for a need, newest upload first.
    pub async fn list_by_need(
        pool: &PgPool,
        need_id: EntityId,
    ) -> Result<Vec<NeedDocument>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM need_documents \
             WHERE need_id = $1 \
             ORDER BY uploaded_at DESC, id DESC"
        );
        sqlx::query_as::<_, NeedDocument>(&query)
            .bind(need_id)
            .fetch_all(pool)
            .await
    }

    /// Change type and display name. `uploaded_at` is refreshed to mark the
    /// edit.
    pub async fn update_metadata(
        pool: &PgPool,
        need_id: EntityId,
        id: EntityId,
        input: &UpdateNeedDocument,
    ) -> Result<Option<NeedDocument>, sqlx::Error> {
        let query = format!(
            "UPDATE need_documents SET \
                document_type = $3, \
                file_name = $4, \
                uploaded_at = now() \
             WHERE id = $1 AND need_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, NeedDocument>(&query)
            .bind(id)
            .bind(need_id)
            .bind(input.document_type.as_str())
            .bind(&input.file_name)
            .fetch_optional(pool)
            .await
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, need_id: EntityId, id: EntityId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM need_documents WHERE id = $1 AND need_id = $2")
            .bind(id)
            .bind(need_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
