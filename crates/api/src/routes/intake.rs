//! Route definitions for the intake wizard and need documents.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::documents::MAX_UPLOAD_BODY_BYTES;
use crate::handlers::{documents, intake};
use crate::state::AppState;

/// ```text
/// GET    /intake                                       -> resume
/// POST   /intake                                       -> start_new
/// GET    /needs                                        -> list_needs
/// DELETE /needs/{need_id}                              -> discard_need
/// GET    /needs/{need_id}/steps/{step}                 -> view_step
/// POST   /needs/{need_id}/steps/{step}                 -> submit_step
/// GET    /needs/{need_id}/review                       -> review_summary
/// GET    /needs/{need_id}/progress                     -> progress_history
/// GET    /needs/{need_id}/documents                    -> list_documents
/// POST   /needs/{need_id}/documents                    -> upload_documents
/// PUT    /needs/{need_id}/documents/{document_id}      -> update_document
/// DELETE /needs/{need_id}/documents/{document_id}      -> delete_document
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intake", get(intake::resume).post(intake::start_new))
        .route("/needs", get(intake::list_needs))
        .route("/needs/{need_id}", delete(intake::discard_need))
        .route(
            "/needs/{need_id}/steps/{step}",
            get(intake::view_step).post(intake::submit_step),
        )
        .route("/needs/{need_id}/review", get(intake::review_summary))
        .route("/needs/{need_id}/progress", get(intake::progress_history))
        .route(
            "/needs/{need_id}/documents",
            get(documents::list_documents).post(documents::upload_documents),
        )
        .route(
            "/needs/{need_id}/documents/{document_id}",
            put(documents::update_document).delete(documents::delete_document),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
}
