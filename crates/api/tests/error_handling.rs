//! Tests for `AppError` to HTTP response mapping. These call
//! `IntoResponse` directly; no server is needed.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use hearth_api::error::AppError;
use hearth_core::error::CoreError;
use hearth_core::validation::FieldErrors;
use hearth_intake::{IntakeError, StoreError};
use hearth_storage::ObjectStoreError;
use http_body_util::BodyExt;
use uuid::Uuid;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn field_errors_return_400_with_fields() {
    let mut fields = FieldErrors::new();
    fields.add("zip_code", "ZIP code is required");
    fields.add("city", "City is required");

    let (status, json) = error_to_response(AppError::from(fields)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["fields"]["zip_code"][0], "ZIP code is required");
    assert_eq!(json["fields"]["city"][0], "City is required");
}

#[tokio::test]
async fn intake_not_found_returns_404() {
    let id = Uuid::nil();
    let err = AppError::Intake(IntakeError::NotFound { entity: "need", id });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], format!("need with id {id} not found"));
}

#[tokio::test]
async fn store_error_is_sanitized() {
    let err = AppError::Intake(IntakeError::Store(StoreError::Backend(
        "connection refused to db-primary:5432".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("db-primary"));
}

#[tokio::test]
async fn object_store_error_is_sanitized() {
    let err = AppError::Intake(IntakeError::ObjectStore(ObjectStoreError::Backend(
        "bucket hearth-private denied".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!json.to_string().contains("hearth-private"));
}

#[tokio::test]
async fn unauthorized_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("no token provided".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "no token provided");
}

#[tokio::test]
async fn bad_request_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("bad multipart".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json.get("fields").is_none());
}

#[tokio::test]
async fn internal_error_hides_message() {
    let (status, json) =
        error_to_response(AppError::InternalError("secret credentials".into())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}
