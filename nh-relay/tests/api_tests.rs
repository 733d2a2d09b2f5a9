//! Integration tests for nh-relay request validation and health
//!
//! These never reach an upstream: every request here is rejected (or
//! answered) before the upstream call.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use nh_relay::{build_router, AppState, RelayConfig};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: config with a credential and an unroutable upstream
fn config_with_key() -> RelayConfig {
    RelayConfig {
        api_key: Some("sk-test".to_string()),
        upstream_url: "http://127.0.0.1:9/unused".to_string(),
        ..Default::default()
    }
}

fn setup_app(config: RelayConfig) -> axum::Router {
    build_router(AppState::new(config).expect("state"))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(RelayConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    let timestamp = body["timestamp"].as_str().expect("timestamp string");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(timestamp.ends_with('Z'));
}

// =============================================================================
// Input validation
// =============================================================================

#[tokio::test]
async fn test_rejects_non_data_url() {
    let app = setup_app(config_with_key());

    let response = app
        .oneshot(post_json("/analyze-image", json!({ "image": "not-a-data-url" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({ "error": "A valid image data URL was not provided." }));
}

#[tokio::test]
async fn test_rejects_missing_and_non_string_image() {
    for payload in [
        json!({}),
        json!({ "image": null }),
        json!({ "image": 12345 }),
        json!({ "image": ["data:image/jpeg;base64,AAAA"] }),
        json!({ "image": "data:text/plain;base64,AAAA" }),
    ] {
        let app = setup_app(config_with_key());
        let response = app
            .oneshot(post_json("/analyze-image", payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {}", payload);
    }
}

#[tokio::test]
async fn test_rejects_unparseable_body() {
    let app = setup_app(config_with_key());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze-image")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "A valid image data URL was not provided.");
}

#[tokio::test]
async fn test_validation_runs_before_credential_check() {
    let app = setup_app(RelayConfig::default());

    let response = app
        .oneshot(post_json("/analyze-image", json!({ "image": "nope" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_credential_is_500() {
    let app = setup_app(RelayConfig::default());

    let response = app
        .oneshot(post_json(
            "/analyze-image",
            json!({ "image": "data:image/jpeg;base64,/9j/4AAQ" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "API key is not configured on the server.");
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let config = RelayConfig {
        max_body_bytes: 1024,
        ..config_with_key()
    };
    let app = setup_app(config);

    let image = format!("data:image/jpeg;base64,{}", "A".repeat(4096));
    let response = app
        .oneshot(post_json("/analyze-image", json!({ "image": image })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_preflight_mirrors_origin() {
    let app = setup_app(RelayConfig::default());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/analyze-image")
        .header(header::ORIGIN, "http://localhost:8081")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:8081"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = setup_app(RelayConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
