//! Supporting document metadata model and DTOs.

use hearth_core::documents::DocumentType;
use hearth_core::types::{EntityId, Timestamp, UserId};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `need_documents` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct NeedDocument {
    pub id: EntityId,
    pub need_id: EntityId,
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub storage_key: String,
    pub uploaded_at: Timestamp,
}

/// DTO for a metadata row written after its blob has been stored.
#[derive(Debug, Clone)]
pub struct CreateNeedDocument {
    pub id: EntityId,
    pub need_id: EntityId,
    pub user_id: UserId,
    pub document_type: DocumentType,
    pub file_name: String,
    pub file_size_bytes: i64,
    pub mime_type: String,
    pub storage_key: String,
}

/// DTO for editing a document's metadata. The blob is never touched.
#[derive(Debug, Clone)]
pub struct UpdateNeedDocument {
    pub document_type: DocumentType,
    pub file_name: String,
}
