//! Relay API client
//!
//! One `POST /analyze-image` per analysis. Failures carry a message fit for
//! showing to the user as-is.

use async_trait::async_trait;
use nh_common::api::{AnalyzeImageResponse, AnalyzeRequest};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("nh-client/", env!("CARGO_PKG_VERSION"));

/// Longer than the relay's own upstream timeout so the relay's 504 arrives first
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Relay client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Relay answered with a non-success status
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network request failed. Please try again.")]
    Network(String),

    #[error("Unexpected response from the server. Please try again.")]
    Decode(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Anything that can classify an image data URL
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze_image(&self, image_data_url: &str) -> Result<AnalyzeImageResponse, ClientError>;
}

/// HTTP client for the relay service
pub struct RelayClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// `api_base_url` must not end with a slash (see `ClientConfig`)
    pub fn new(api_base_url: &str) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/analyze-image", api_base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Analyzer for RelayClient {
    async fn analyze_image(&self, image_data_url: &str) -> Result<AnalyzeImageResponse, ClientError> {
        let request = AnalyzeRequest {
            image: image_data_url.to_string(),
        };

        tracing::debug!(endpoint = %self.endpoint, bytes = image_data_url.len(), "Sending image to relay");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            return Err(status_error(status.as_u16(), &body));
        }

        response
            .json::<AnalyzeImageResponse>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Build the user-facing error for a failed response
///
/// The relay's `{"error": "..."}` message wins; otherwise a default per status.
pub fn status_error(status: u16, body: &str) -> ClientError {
    let default_message = if status == 413 {
        "That image is too large. Please try a smaller photo.".to_string()
    } else {
        format!("Request failed with status {}", status)
    };

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(default_message);

    ClientError::Status { status, message }
}
