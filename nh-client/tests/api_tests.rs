//! Relay API client tests against a stand-in relay on 127.0.0.1:0

use axum::{http::StatusCode, routing::post, Json, Router};
use nh_client::api::{Analyzer, ClientError, RelayClient};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQ==";

/// Test helper: serve `router` on an ephemeral port, return its base URL
async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn fixed_relay(status: StatusCode, body: &'static str) -> String {
    let router = Router::new().route("/analyze-image", post(move || async move { (status, body) }));
    spawn_server(router).await
}

#[tokio::test]
async fn test_success_sends_image_and_parses_envelope() {
    let seen = Arc::new(Mutex::new(None::<Value>));
    let captured = seen.clone();
    let router = Router::new().route(
        "/analyze-image",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().unwrap() = Some(body);
                Json(json!({
                    "id": "gen-1",
                    "choices": [{ "message": { "role": "assistant", "content": "HAMBURGER" } }]
                }))
            }
        }),
    );
    let base = spawn_server(router).await;

    let client = RelayClient::new(&base).unwrap();
    let response = client.analyze_image(IMAGE).await.unwrap();

    assert_eq!(response.first_content(), Some("HAMBURGER"));
    assert_eq!(response.extra.get("id"), Some(&json!("gen-1")));
    assert_eq!(seen.lock().unwrap().clone(), Some(json!({ "image": IMAGE })));
}

#[tokio::test]
async fn test_relay_error_message_is_surfaced() {
    let base = fixed_relay(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":"The free model is temporarily busy. Please try again in a moment."}"#,
    )
    .await;

    let err = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap_err();

    assert_eq!(err.status(), Some(429));
    assert_eq!(
        err.to_string(),
        "The free model is temporarily busy. Please try again in a moment."
    );
}

#[tokio::test]
async fn test_413_without_body_message() {
    let base = fixed_relay(StatusCode::PAYLOAD_TOO_LARGE, "").await;

    let err = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap_err();

    assert_eq!(err.to_string(), "That image is too large. Please try a smaller photo.");
}

#[tokio::test]
async fn test_other_status_without_body_message() {
    let base = fixed_relay(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").await;

    let err = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap_err();

    assert_eq!(err.to_string(), "Request failed with status 502");
}

#[tokio::test]
async fn test_missing_content_still_parses() {
    let base = fixed_relay(StatusCode::OK, r#"{"choices":[]}"#).await;

    let response = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap();

    assert_eq!(response.first_content(), None);
}

#[tokio::test]
async fn test_null_choices_and_message_parse_as_empty() {
    let base = fixed_relay(StatusCode::OK, r#"{"choices":null}"#).await;
    let response = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap();
    assert_eq!(response.first_content(), None);

    let base = fixed_relay(StatusCode::OK, r#"{"choices":[{"message":null}]}"#).await;
    let response = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap();
    assert_eq!(response.first_content(), None);
}

#[tokio::test]
async fn test_non_json_success_is_decode_error() {
    let base = fixed_relay(StatusCode::OK, "hello").await;

    let err = RelayClient::new(&base).unwrap().analyze_image(IMAGE).await.unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_relay_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = RelayClient::new(&format!("http://{}", addr))
        .unwrap()
        .analyze_image(IMAGE)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.to_string(), "Network request failed. Please try again.");
}
