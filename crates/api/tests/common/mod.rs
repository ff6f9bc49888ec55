#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use hearth_api::auth::jwt::{generate_access_token, JwtConfig};
use hearth_api::config::{LogFormat, ServerConfig, StorageBackend};
use hearth_api::router::build_app_router;
use hearth_api::state::AppState;
use hearth_intake::memory::MemoryStore;
use hearth_intake::{IntakeOrchestrator, Stores};
use hearth_storage::MemoryObjectStore;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

pub const HOUSING: &str = "0190a000-0000-7000-8000-000000000001";
pub const UTILITIES: &str = "0190a000-0000-7000-8000-000000000004";

const BOUNDARY: &str = "hearth-test-boundary";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".parse().unwrap()],
        request_timeout_secs: 30,
        storage: StorageBackend::Local {
            root: "unused".into(),
        },
        log_format: LogFormat::Text,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// The full router over in-memory stores, plus handles for inspecting and
/// breaking those stores.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub config: ServerConfig,
}

pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::with_default_categories());
    let objects = Arc::new(MemoryObjectStore::new());
    let stores = Stores::from_single(store.clone(), objects.clone());

    let state = AppState {
        pool: None,
        config: Arc::new(config.clone()),
        intake: IntakeOrchestrator::new(stores),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        objects,
        config,
    }
}

impl TestApp {
    /// A fresh user id and a valid bearer token for it.
    pub fn login(&self) -> (Uuid, String) {
        let user_id = Uuid::now_v7();
        let token = generate_access_token(user_id, &self.config.jwt).unwrap();
        (user_id, token)
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_empty(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(request(Method::POST, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(json_request(Method::POST, uri, token, body)).await
    }

    pub async fn put_json(&self, uri: &str, token: &str, body: serde_json::Value) -> Response<Body> {
        self.send(json_request(Method::PUT, uri, token, body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Response<Body> {
        self.send(request(Method::DELETE, uri, token).body(Body::empty()).unwrap())
            .await
    }

    /// POST a multipart form of `(name, value)` text fields and
    /// `(file_name, content_type, bytes)` files sent as `files`.
    pub async fn post_multipart(
        &self,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> Response<Body> {
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (file_name, content_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = request(Method::POST, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Resume intake for a new user and return `(token, need_id)`.
    pub async fn start(&self) -> (String, String) {
        let (_, token) = self.login();
        let response = self.get("/api/v1/intake", &token).await;
        let json = body_json(response).await;
        let need_id = json["data"]["need"]["id"].as_str().unwrap().to_string();
        (token, need_id)
    }

    /// Walk a new need through every step before Review.
    pub async fn draft_at_review(&self) -> (String, String) {
        let (token, need_id) = self.start().await;
        let steps = [
            ("welcome", serde_json::Value::Null),
            ("location", new_address_body("12 Elm St")),
            (
                "categories",
                serde_json::json!({ "primary": [HOUSING], "secondary": [UTILITIES] }),
            ),
            ("story", story_body(1250)),
            ("documents", serde_json::json!({ "skip_documents": true })),
        ];
        for (step, body) in steps {
            let uri = format!("/api/v1/needs/{need_id}/steps/{step}");
            let response = if body.is_null() {
                self.post_empty(&uri, &token).await
            } else {
                self.post_json(&uri, &token, body).await
            };
            assert_eq!(response.status(), 200, "step {step} failed");
        }
        (token, need_id)
    }
}

fn request(method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
}

fn json_request(method: Method, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    request(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn new_address_body(street: &str) -> serde_json::Value {
    serde_json::json!({
        "mode": "new",
        "address": {
            "address": street,
            "city": "Springfield",
            "state": "IL",
            "zip_code": "62704"
        }
    })
}

pub fn story_body(amount: i64) -> serde_json::Value {
    serde_json::json!({
        "current": "Laid off in March",
        "need": "Two months of rent",
        "outcome": "Stay housed while I retrain",
        "amount": amount
    })
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
