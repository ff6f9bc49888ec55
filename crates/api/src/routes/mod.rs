pub mod health;
pub mod intake;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /intake                                          resume (GET), start new (POST)
///
/// /needs                                           list the caller's needs
/// /needs/{need_id}                                 discard draft (DELETE)
/// /needs/{need_id}/steps/{step}                    view (GET), submit (POST)
/// /needs/{need_id}/review                          review summary
/// /needs/{need_id}/progress                        completed-step history
/// /needs/{need_id}/documents                       list (GET), upload (POST, multipart)
/// /needs/{need_id}/documents/{document_id}         update (PUT), delete (DELETE)
/// ```
///
/// Every route requires a Bearer token.
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(intake::router())
}
