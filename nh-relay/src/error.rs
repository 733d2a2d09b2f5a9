//! Error types for nh-relay
//!
//! Every failure is request-scoped and rendered as `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nh_common::api::ErrorResponse;
use thiserror::Error;

use crate::upstream::UpstreamError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, non-string or non-data-URL `image` (400)
    #[error("A valid image data URL was not provided.")]
    InvalidImage,

    /// No upstream credential configured (500)
    #[error("API key is not configured on the server.")]
    MissingCredential,

    /// Request body over the size limit (413)
    #[error("That image is too large. Please try a smaller photo.")]
    PayloadTooLarge,

    /// Upstream call failed; status and message depend on the failure kind
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Upstream(err) => err.status(),
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            ApiError::Upstream(err) => err.public_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();
        tracing::info!("Sending error response: {} - {}", status.as_u16(), message);
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
