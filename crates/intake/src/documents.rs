//! Document consistency manager.
//!
//! The object store and the metadata store cannot be written atomically
//! together. Uploads write the blob first and the row second, removing the
//! blob again if the row insert fails. Deletes remove the blob first and
//! only then the row. Either way a metadata row never points at a missing
//! blob; the worst case is an orphan blob left for out-of-band cleanup.

use std::sync::Arc;

use hearth_core::documents::{
    display_file_name, normalize_mime_type, storage_key, validate_upload_size, DocumentType,
};
use hearth_core::error::CoreError;
use hearth_core::types::{new_id, EntityId, UserId};
use hearth_db::models::document::{CreateNeedDocument, NeedDocument, UpdateNeedDocument};
use hearth_storage::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::IntakeError;
use crate::stores::DocumentStore;

/// One file as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied name, kept only as display metadata.
    pub file_name: String,
    pub content_type: String,
    pub document_type: DocumentType,
    pub bytes: Vec<u8>,
}

/// Outcome of a multi-file upload.
#[derive(Debug, Default, Serialize)]
pub struct BatchUploadSummary {
    pub uploaded: Vec<NeedDocument>,
    pub failed: Vec<FailedUpload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedUpload {
    pub file_name: String,
    pub reason: String,
}

impl BatchUploadSummary {
    pub fn succeeded(&self) -> usize {
        self.uploaded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn failed_files(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.file_name.as_str()).collect()
    }
}

/// Rename and/or retype a stored document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentMetadataInput {
    pub document_type: String,
    pub file_name: Option<String>,
}

#[derive(Clone)]
pub struct DocumentManager {
    documents: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
}

impl DocumentManager {
    pub fn new(documents: Arc<dyn DocumentStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { documents, objects }
    }

    /// Store one file: blob first, then its metadata row.
    ///
    /// The caller must already have checked that `user_id` may write to
    /// `need_id`.
    pub async fn upload(
        &self,
        need_id: EntityId,
        user_id: UserId,
        file: UploadFile,
    ) -> Result<NeedDocument, IntakeError> {
        let size = file.bytes.len() as u64;
        validate_upload_size(size)?;

        let document_id = new_id();
        let mime_type = normalize_mime_type(&file.content_type);
        let file_name = display_file_name(&file.file_name);
        let key = storage_key(need_id, document_id, &mime_type, &file_name);

        self.objects.put(&key, file.bytes, &mime_type).await.map_err(|e| {
            tracing::error!(
                %need_id,
                %document_id,
                storage_key = %key,
                backend = self.objects.backend(),
                error = %e,
                "Document blob write failed",
            );
            IntakeError::from(e)
        })?;

        let input = CreateNeedDocument {
            id: document_id,
            need_id,
            user_id,
            document_type: file.document_type,
            file_name,
            file_size_bytes: size as i64,
            mime_type,
            storage_key: key.clone(),
        };

        match self.documents.create(&input).await {
            Ok(document) => {
                tracing::info!(
                    %need_id,
                    %document_id,
                    storage_key = %key,
                    size_bytes = size,
                    "Document uploaded",
                );
                Ok(document)
            }
            Err(insert_err) => {
                tracing::error!(
                    %need_id,
                    %document_id,
                    storage_key = %key,
                    error = %insert_err,
                    "Document metadata insert failed, removing blob",
                );
                if let Err(cleanup_err) = self.objects.delete(&key).await {
                    tracing::warn!(
                        %need_id,
                        %document_id,
                        storage_key = %key,
                        error = %cleanup_err,
                        "Compensating blob delete failed, blob orphaned",
                    );
                }
                Err(insert_err.into())
            }
        }
    }

    /// Upload each file independently. One failure never stops the rest.
    pub async fn upload_batch(
        &self,
        need_id: EntityId,
        user_id: UserId,
        files: Vec<UploadFile>,
    ) -> BatchUploadSummary {
        let mut summary = BatchUploadSummary::default();
        for file in files {
            let file_name = display_file_name(&file.file_name);
            match self.upload(need_id, user_id, file).await {
                Ok(document) => summary.uploaded.push(document),
                Err(e) => summary.failed.push(FailedUpload {
                    file_name,
                    reason: failure_reason(&e),
                }),
            }
        }
        if !summary.failed.is_empty() {
            tracing::warn!(
                %need_id,
                succeeded = summary.succeeded(),
                failed = summary.failed_count(),
                "Batch upload partially failed",
            );
        }
        summary
    }

    /// Delete a document: blob first, row only once the blob is gone.
    pub async fn delete(&self, need_id: EntityId, document_id: EntityId) -> Result<(), IntakeError> {
        let document = self.documents.get(need_id, document_id).await?;

        self.objects
            .delete(&document.storage_key)
            .await
            .map_err(|e| {
                tracing::error!(
                    %need_id,
                    %document_id,
                    storage_key = %document.storage_key,
                    error = %e,
                    "Document blob delete failed, metadata kept",
                );
                IntakeError::from(e)
            })?;

        self.documents.delete(need_id, document_id).await?;
        tracing::info!(%need_id, %document_id, "Document deleted");
        Ok(())
    }

    /// Change type and display name. The blob is not touched.
    pub async fn update_metadata(
        &self,
        need_id: EntityId,
        document_id: EntityId,
        input: &DocumentMetadataInput,
    ) -> Result<NeedDocument, IntakeError> {
        let document_type = DocumentType::parse(&input.document_type).map_err(|e| match e {
            CoreError::Validation(message) => IntakeError::invalid("document_type", message),
            other => other.into(),
        })?;

        let existing = self.documents.get(need_id, document_id).await?;
        let file_name = match input.file_name.as_deref() {
            Some(name) if !name.trim().is_empty() => display_file_name(name),
            _ => existing.file_name,
        };

        let updated = self
            .documents
            .update(
                need_id,
                document_id,
                &UpdateNeedDocument {
                    document_type,
                    file_name,
                },
            )
            .await?;
        tracing::info!(
            %need_id,
            %document_id,
            document_type = document_type.as_str(),
            "Document metadata updated",
        );
        Ok(updated)
    }

    pub async fn list(&self, need_id: EntityId) -> Result<Vec<NeedDocument>, IntakeError> {
        Ok(self.documents.list_by_need(need_id).await?)
    }

    /// Delete every document of a need, each one blob first and then its
    /// row, stopping at the first failure. Documents already processed are
    /// fully gone; the failing one and the rest keep both blob and row.
    /// Returns the number of documents removed.
    pub async fn delete_all_for_need(&self, need_id: EntityId) -> Result<usize, IntakeError> {
        let documents = self.documents.list_by_need(need_id).await?;
        for (removed, document) in documents.iter().enumerate() {
            if let Err(e) = self.delete(need_id, document.id).await {
                tracing::error!(
                    %need_id,
                    document_id = %document.id,
                    removed,
                    remaining = documents.len() - removed,
                    error = %e,
                    "Document removal failed while discarding need",
                );
                return Err(e);
            }
        }
        Ok(documents.len())
    }
}

/// Caller-facing reason for a failed file. Infrastructure detail stays in
/// the logs.
fn failure_reason(err: &IntakeError) -> String {
    match err {
        IntakeError::Validation(fields) => fields.to_string(),
        _ => "The file could not be stored. Please try again.".to_string(),
    }
}
