//! Image analysis endpoint
//!
//! `POST /analyze-image` takes `{"image": "<data URL>"}`, forwards it to the
//! upstream model and returns the upstream envelope with the answer replaced
//! by a canonical token.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::ORIGIN, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use nh_common::data_url::is_image_data_url;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::upstream::canonicalize_envelope;
use crate::AppState;

/// Pull a usable data URL out of the request body
fn extract_image(body: &Value) -> Option<&str> {
    body.get("image")
        .and_then(Value::as_str)
        .filter(|image| is_image_data_url(image))
}

/// POST /analyze-image
pub async fn analyze_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    info!("Received image analysis request");

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Request body exceeds {} bytes", state.config.max_body_bytes);
            return Err(ApiError::PayloadTooLarge);
        }
        Err(rejection) => {
            warn!("Unreadable request body: {}", rejection.body_text());
            Value::Null
        }
    };

    let Some(image) = extract_image(&body) else {
        warn!("Invalid image data provided");
        return Err(ApiError::InvalidImage);
    };

    if !state.upstream.has_credential() {
        error!("Missing upstream API key");
        return Err(ApiError::MissingCredential);
    }

    let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());

    let envelope = state.upstream.complete(image, origin).await.map_err(|e| {
        error!("Error calling upstream model: {}", e);
        e
    })?;

    let (body, verdict) = canonicalize_envelope(envelope).map_err(|e| {
        error!("Error reading upstream response: {}", e);
        e
    })?;

    info!(verdict = %verdict, "Sending successful response");
    Ok(Json(body))
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/analyze-image", post(analyze_image))
}
