//! Handlers for supporting documents of a need.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use hearth_core::documents::{DocumentType, MAX_UPLOAD_BYTES};
use hearth_core::error::CoreError;
use hearth_core::types::EntityId;
use hearth_core::validation::FieldErrors;
use hearth_db::models::document::NeedDocument;
use hearth_intake::{BatchUploadSummary, DocumentMetadataInput, IntakeError, UploadFile};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Files accepted in one multipart request.
pub const MAX_FILES_PER_REQUEST: usize = 5;

/// Body cap for routes that accept uploads, with headroom for multipart
/// framing.
pub const MAX_UPLOAD_BODY_BYTES: usize =
    MAX_FILES_PER_REQUEST * MAX_UPLOAD_BYTES as usize + 64 * 1024;

/// Form fields read from a document upload.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub skip_documents: bool,
    pub files: Vec<UploadFile>,
}

/// GET /api/v1/needs/{need_id}/documents
pub async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(need_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Vec<NeedDocument>>>> {
    let documents = state.intake.list_documents(auth.user_id, need_id).await?;
    Ok(Json(DataResponse { data: documents }))
}

/// POST /api/v1/needs/{need_id}/documents
///
/// Multipart upload of one or more `files`. Each file is stored
/// independently; the response lists what was stored and what failed.
pub async fn upload_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(need_id): Path<EntityId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<BatchUploadSummary>>)> {
    let form = read_upload_form(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::BadRequest(
            "No files received in multipart upload".to_string(),
        ));
    }

    let summary = state
        .intake
        .upload_documents(auth.user_id, need_id, form.files)
        .await?;

    if summary.uploaded.is_empty() {
        let mut errors = FieldErrors::new();
        for failed in &summary.failed {
            errors.add("files", format!("{}: {}", failed.file_name, failed.reason));
        }
        return Err(errors.into());
    }
    Ok((StatusCode::CREATED, Json(DataResponse { data: summary })))
}

/// PUT /api/v1/needs/{need_id}/documents/{document_id}
pub async fn update_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((need_id, document_id)): Path<(EntityId, EntityId)>,
    Json(input): Json<DocumentMetadataInput>,
) -> AppResult<Json<DataResponse<NeedDocument>>> {
    let document = state
        .intake
        .update_document(auth.user_id, need_id, document_id, &input)
        .await?;
    Ok(Json(DataResponse { data: document }))
}

/// DELETE /api/v1/needs/{need_id}/documents/{document_id}
pub async fn delete_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((need_id, document_id)): Path<(EntityId, EntityId)>,
) -> AppResult<StatusCode> {
    state
        .intake
        .delete_document(auth.user_id, need_id, document_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Read `files` (or `file`), `document_type` and `skip_documents` fields.
///
/// `document_type` applies to every file in the form and defaults to
/// `other`. Empty file inputs a browser sends when nothing was chosen are
/// ignored.
pub async fn read_upload_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    let mut document_type = DocumentType::Other;
    let mut pending: Vec<(String, String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "skip_documents" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.skip_documents = matches!(value.trim(), "true" | "on" | "1");
            }
            "document_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                document_type = DocumentType::parse(&value).map_err(|e| match e {
                    CoreError::Validation(msg) => {
                        AppError::Intake(IntakeError::invalid("document_type", msg))
                    }
                    other => AppError::Core(other),
                })?;
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                if pending.len() == MAX_FILES_PER_REQUEST {
                    return Err(IntakeError::invalid(
                        "files",
                        format!("Upload at most {MAX_FILES_PER_REQUEST} files at a time"),
                    )
                    .into());
                }
                pending.push((file_name, content_type, bytes.to_vec()));
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown upload form field");
            }
        }
    }

    form.files = pending
        .into_iter()
        .map(|(file_name, content_type, bytes)| UploadFile {
            file_name,
            content_type,
            document_type,
            bytes,
        })
        .collect();
    Ok(form)
}
