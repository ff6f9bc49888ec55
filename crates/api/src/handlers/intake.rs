//! Handlers for the intake wizard: resume, step views, step submissions,
//! and the requester's need list.

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use hearth_core::need::NeedStep;
use hearth_core::types::EntityId;
use hearth_core::validation::FORM_FIELD;
use hearth_db::models::progress::ProgressEvent;
use hearth_intake::{
    DocumentsSubmission, IntakeError, NeedSummary, Resume, ReviewSummary, StepOutcome, StepSubmission,
    StepView,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::documents::read_upload_form;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// JSON body of the documents step when no files are attached.
#[derive(Debug, Default, Deserialize)]
struct DocumentsStepBody {
    #[serde(default)]
    skip_documents: bool,
}

/// GET /api/v1/intake
///
/// Resume the caller's in-flight need, creating a draft if there is none.
pub async fn resume(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<(StatusCode, Json<DataResponse<Resume>>)> {
    let resume = state.intake.resume(auth.user_id).await?;
    Ok((created_or_ok(resume.created), Json(DataResponse { data: resume })))
}

/// POST /api/v1/intake
///
/// Begin another need. An open draft is returned instead of a second one.
pub async fn start_new(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<(StatusCode, Json<DataResponse<Resume>>)> {
    let resume = state.intake.start_new(auth.user_id).await?;
    Ok((created_or_ok(resume.created), Json(DataResponse { data: resume })))
}

/// GET /api/v1/needs
pub async fn list_needs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<NeedSummary>>>> {
    let needs = state.intake.list_needs(auth.user_id).await?;
    Ok(Json(DataResponse { data: needs }))
}

/// GET /api/v1/needs/{need_id}/steps/{step}
pub async fn view_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((need_id, step)): Path<(EntityId, String)>,
) -> AppResult<Json<DataResponse<StepView>>> {
    let step = parse_step(&step)?;
    let view = state.intake.view(auth.user_id, need_id, step).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/needs/{need_id}/steps/{step}
///
/// Submit one step. Every step takes a JSON body except Welcome, which
/// takes none. The documents step also accepts a multipart form carrying
/// `files`, `document_type` and `skip_documents`.
pub async fn submit_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((need_id, step)): Path<(EntityId, String)>,
    request: Request,
) -> AppResult<Json<DataResponse<StepOutcome>>> {
    let step = parse_step(&step)?;

    let submission = match step {
        NeedStep::Welcome => StepSubmission::Welcome,
        NeedStep::Documents if is_multipart(request.headers()) => {
            let multipart = Multipart::from_request(request, &state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            let form = read_upload_form(multipart).await?;
            StepSubmission::Documents(DocumentsSubmission {
                skip_documents: form.skip_documents,
                files: form.files,
            })
        }
        _ => {
            let Json(body) = Json::<serde_json::Value>::from_request(request, &state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            submission_from_json(step, body)?
        }
    };

    let outcome = state.intake.submit(auth.user_id, need_id, submission).await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/needs/{need_id}/review
pub async fn review_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(need_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<ReviewSummary>>> {
    let summary = state.intake.review_summary(auth.user_id, need_id).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/needs/{need_id}/progress
pub async fn progress_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(need_id): Path<EntityId>,
) -> AppResult<Json<DataResponse<Vec<ProgressEvent>>>> {
    let events = state.intake.progress_history(auth.user_id, need_id).await?;
    Ok(Json(DataResponse { data: events }))
}

/// DELETE /api/v1/needs/{need_id}
///
/// Discard a draft together with its documents.
pub async fn discard_need(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(need_id): Path<EntityId>,
) -> AppResult<StatusCode> {
    state.intake.discard_draft(auth.user_id, need_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Private helpers ──────────────────────────────────────────────────────

fn created_or_ok(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}

fn parse_step(raw: &str) -> AppResult<NeedStep> {
    NeedStep::from_str_db(raw).map_err(|_| AppError::BadRequest(format!("Unknown intake step '{raw}'")))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"))
}

fn submission_from_json(step: NeedStep, body: serde_json::Value) -> AppResult<StepSubmission> {
    let submission = match step {
        NeedStep::Welcome => StepSubmission::Welcome,
        NeedStep::Location => StepSubmission::Location(parse_body(body)?),
        NeedStep::Categories => StepSubmission::Categories(parse_body(body)?),
        NeedStep::Story => StepSubmission::Story(parse_body(body)?),
        NeedStep::Documents => {
            let form: DocumentsStepBody = parse_body(body)?;
            StepSubmission::Documents(DocumentsSubmission {
                skip_documents: form.skip_documents,
                files: Vec::new(),
            })
        }
        NeedStep::Review => StepSubmission::Review(parse_body(body)?),
        NeedStep::Complete => {
            return Err(IntakeError::invalid(
                FORM_FIELD,
                "The confirmation step cannot be submitted",
            )
            .into())
        }
    };
    Ok(submission)
}

fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))
}
