//! HTTP-level tests for the intake routes, over in-memory stores.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, build_test_app, new_address_body, story_body, HOUSING};
use hearth_intake::memory::FailPoint;
use serde_json::json;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = build_test_app();
    let response = app
        .send(
            axum::http::Request::get("/api/v1/intake")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let app = build_test_app();
    let response = app.get("/api/v1/intake", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Resume and steps
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resume_creates_then_returns_same_draft() {
    let app = build_test_app();
    let (_, token) = app.login();

    let first = app.get("/api/v1/intake", &token).await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_json(first).await;
    assert_eq!(first["data"]["route"]["kind"], "step");
    assert_eq!(first["data"]["route"]["step"], "welcome");
    assert_eq!(first["data"]["need"]["status"], "draft");

    let second = app.get("/api/v1/intake", &token).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;
    assert_eq!(second["data"]["need"]["id"], first["data"]["need"]["id"]);
}

#[tokio::test]
async fn welcome_then_location_advances_marker() {
    let app = build_test_app();
    let (token, need_id) = app.start().await;

    let response = app
        .post_empty(&format!("/api/v1/needs/{need_id}/steps/welcome"), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["need"]["current_step"], "location");
    assert_eq!(json["data"]["next"]["step"], "location");

    let response = app
        .post_json(
            &format!("/api/v1/needs/{need_id}/steps/location"),
            &token,
            new_address_body("12 Elm St"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["need"]["current_step"], "categories");
    assert_eq!(json["data"]["need"]["uses_non_primary_address"], false);
}

#[tokio::test]
async fn validation_errors_carry_fields() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_json(
            &format!("/api/v1/needs/{need_id}/steps/categories"),
            &token,
            json!({ "primary": [HOUSING, common::UTILITIES] }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_matches!(json["fields"]["primary"].as_array(), Some(messages) if !messages.is_empty());
}

#[tokio::test]
async fn skipping_ahead_is_rejected() {
    let app = build_test_app();
    let (token, need_id) = app.start().await;

    let response = app
        .post_json(
            &format!("/api/v1/needs/{need_id}/steps/story"),
            &token,
            story_body(100),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_step_is_bad_request() {
    let app = build_test_app();
    let (token, need_id) = app.start().await;

    let response = app
        .get(&format!("/api/v1/needs/{need_id}/steps/payment"), &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_json(
            &format!("/api/v1/needs/{need_id}/steps/story"),
            &token,
            json!({ "amount": "lots" }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn review_submits_and_resume_goes_to_confirmation() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .get(&format!("/api/v1/needs/{need_id}/review"), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["data"]["primary_category"]["name"], "Housing");
    assert_eq!(summary["data"]["address"]["city"], "Springfield");

    let response = app
        .post_json(
            &format!("/api/v1/needs/{need_id}/steps/review"),
            &token,
            json!({ "confirm_accurate": true, "agree_terms": true }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["need"]["status"], "submitted");
    assert_eq!(json["data"]["next"]["kind"], "confirmation");

    let resume = body_json(app.get("/api/v1/intake", &token).await).await;
    assert_eq!(resume["data"]["route"]["kind"], "confirmation");

    let view = app
        .get(&format!("/api/v1/needs/{need_id}/steps/complete"), &token)
        .await;
    assert_eq!(view.status(), StatusCode::OK);
    assert_eq!(body_json(view).await["data"]["step"], "confirmation");
}

#[tokio::test]
async fn other_users_need_is_not_found() {
    let app = build_test_app();
    let (_, need_id) = app.start().await;
    let (_, intruder) = app.login();

    let response = app
        .get(&format!("/api/v1/needs/{need_id}/steps/welcome"), &intruder)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn store_failure_is_sanitized_500() {
    let app = build_test_app();
    let (token, need_id) = app.start().await;
    app.store.fail(FailPoint::NeedUpdate);

    let response = app
        .post_empty(&format!("/api/v1/needs/{need_id}/steps/welcome"), &token)
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert!(!json.to_string().contains("Store error"));
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn documents_step_accepts_multipart_files() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_multipart(
            &format!("/api/v1/needs/{need_id}/steps/documents"),
            &token,
            &[("document_type", "eviction_notice")],
            &[("notice.pdf", "application/pdf", b"%PDF-1.7 notice".as_slice())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["uploads"]["uploaded"][0]["document_type"], "eviction_notice");
    assert_eq!(app.objects.len(), 1);
}

#[tokio::test]
async fn upload_list_update_delete_document() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;
    let base = format!("/api/v1/needs/{need_id}/documents");

    let response = app
        .post_multipart(
            &base,
            &token,
            &[],
            &[("lease.pdf", "application/pdf", b"%PDF-1.7 lease".as_slice())],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let document_id = json["data"]["uploaded"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(json["data"]["uploaded"][0]["document_type"], "other");

    let list = body_json(app.get(&base, &token).await).await;
    assert_eq!(list["data"].as_array().unwrap().len(), 1);

    let response = app
        .put_json(
            &format!("{base}/{document_id}"),
            &token,
            json!({ "document_type": "utility_bill", "file_name": "june-lease.pdf" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["file_name"], "june-lease.pdf");

    let response = app.delete(&format!("{base}/{document_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn upload_with_no_files_is_bad_request() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_multipart(
            &format!("/api/v1/needs/{need_id}/documents"),
            &token,
            &[("document_type", "id")],
            &[],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_with_unknown_type_reports_field() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_multipart(
            &format!("/api/v1/needs/{need_id}/documents"),
            &token,
            &[("document_type", "passport")],
            &[("id.png", "image/png", b"\x89PNG".as_slice())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["fields"]["document_type"].is_array());
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn all_failed_upload_is_validation_error() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let response = app
        .post_multipart(
            &format!("/api/v1/needs/{need_id}/documents"),
            &token,
            &[],
            &[("empty.pdf", "application/pdf", b"".as_slice())],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let messages = json["fields"]["files"].as_array().unwrap();
    assert!(messages[0].as_str().unwrap().starts_with("empty.pdf"));
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_and_discard_needs() {
    let app = build_test_app();
    let (token, need_id) = app.draft_at_review().await;

    let list = body_json(app.get("/api/v1/needs", &token).await).await;
    let rows = list["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["step_label"], "Review");
    assert_eq!(rows[0]["can_delete"], true);
    assert_eq!(rows[0]["primary_category_name"], "Housing");

    let progress = body_json(
        app.get(&format!("/api/v1/needs/{need_id}/progress"), &token)
            .await,
    )
    .await;
    assert_eq!(progress["data"].as_array().unwrap().len(), 5);

    let response = app.delete(&format!("/api/v1/needs/{need_id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let list = body_json(app.get("/api/v1/needs", &token).await).await;
    assert!(list["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn start_new_returns_open_draft() {
    let app = build_test_app();
    let (token, need_id) = app.start().await;

    let response = app.post_empty("/api/v1/intake", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["need"]["id"], need_id.as_str());
}
