#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use labelkit_api::config::ServerConfig;
use labelkit_api::router::build_app_router;
use labelkit_api::sessions::SessionStore;
use labelkit_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and a 1 MiB upload limit.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
    }
}

/// Build the full application router with an empty session store.
///
/// Uses the same `build_app_router` as `main.rs` so integration tests
/// exercise the production middleware stack. The router is cheap to clone
/// and clones share the store.
pub fn build_test_app() -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionStore::new()),
    };
    build_app_router(state, &config)
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    send(app, request).await
}

/// PUT a raw file body, as the browser does for uploads.
pub async fn put_bytes(
    app: Router,
    uri: &str,
    content_type: &str,
    bytes: impl Into<Vec<u8>>,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", content_type)
        .body(Body::from(bytes.into()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub const REVIEWS_CSV: &str = "id,title,body\n\
1,First,\"Great product, would buy again\"\n\
2,Second,Terrible\n\
3,Third,\"Line one\nline two\"\n";

pub const REVIEWS_SCHEMA_YAML: &str = "\
header_column: title
text_column: body
section_1:
  section_name: Sentiment
  section_instruction: How does the author feel?
  annotations:
    annotation_1:
      name: Positive
      type: checkbox
    annotation_2:
      name: Strength
      type: likert
      min_value: 1
      max_value: 5
section_2:
  section_name: Meta
  annotations:
    annotation_1:
      name: Topic
      type: dropdown
      options: [Price, Quality]
    annotation_2:
      name: Note
      type: textbox
";

/// Create a session and return its id.
pub async fn create_session(app: &Router) -> String {
    let response = post_empty(app.clone(), "/api/v1/sessions").await;
    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

/// Create a session, upload the reviews dataset and schema, and return its
/// id. The session is viewing record 1.
pub async fn viewing_session(app: &Router) -> String {
    let id = create_session(app).await;
    let response = put_bytes(
        app.clone(),
        &format!("/api/v1/sessions/{id}/dataset?filename=reviews.csv"),
        "text/csv",
        REVIEWS_CSV,
    )
    .await;
    assert_eq!(response.status(), 200);
    let response = put_bytes(
        app.clone(),
        &format!("/api/v1/sessions/{id}/schema"),
        "application/yaml",
        REVIEWS_SCHEMA_YAML,
    )
    .await;
    assert_eq!(response.status(), 200);
    id
}
