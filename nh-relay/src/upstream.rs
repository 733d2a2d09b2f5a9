//! Upstream chat-completion client
//!
//! Sends the fixed classification prompt plus the caller's image to a
//! multimodal chat-completion endpoint (OpenRouter-compatible) and returns
//! the raw response envelope. No retries: one request, one hard timeout.

use axum::http::StatusCode;
use nh_common::Verdict;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::RelayConfig;

const USER_AGENT: &str = concat!("nh-relay/", env!("CARGO_PKG_VERSION"));

/// Instruction sent with every image
pub const CLASSIFICATION_PROMPT: &str = "Look at this image carefully. Is there a hamburger \
(burger/cheeseburger/meat patty in a bun) visible in this image? Answer with exactly \
\"HAMBURGER\" if you see a hamburger, or exactly \"NOT_HAMBURGER\" if you do not see a \
hamburger. Be very strict - only respond HAMBURGER if you clearly see a meat patty in a bun.";

const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f64 = 0.1;

/// Upstream error code signalling the model is over capacity
const RATE_LIMIT_CODE: i64 = 429;

/// Upstream client errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream rate limited: {0}")]
    RateLimited(String),

    #[error("Upstream error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected upstream response: {0}")]
    Malformed(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Status code returned to the relay's caller
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            UpstreamError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            UpstreamError::Network(_) | UpstreamError::Malformed(_) | UpstreamError::Client(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the relay's caller
    pub fn public_message(&self) -> String {
        match self {
            UpstreamError::Timeout => "The request to the AI timed out. Please try again.".to_string(),
            UpstreamError::RateLimited(_) => {
                "The free model is temporarily busy. Please try again in a moment.".to_string()
            }
            UpstreamError::Api { message, .. } => message.clone(),
            _ => "Failed to analyze image.".to_string(),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::Malformed(e.to_string())
        } else {
            UpstreamError::Network(e.to_string())
        }
    }
}

/// Chat-completion client bound to one endpoint, model and credential
pub struct UpstreamClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    app_name: String,
    default_referer: String,
}

impl UpstreamClient {
    pub fn new(config: &RelayConfig) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.upstream_url.clone(),
            model: config.upstream_model.clone(),
            api_key: config.api_key.clone(),
            app_name: config.app_name.clone(),
            default_referer: config.public_url.clone(),
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model about one image
    ///
    /// `origin` is the caller's `Origin` header, forwarded as the referer for
    /// upstream attribution. Returns the upstream envelope untouched.
    pub async fn complete(&self, image_data_url: &str, origin: Option<&str>) -> Result<Value, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Client("no upstream credential configured".to_string()))?;

        let body = build_request_body(&self.model, image_data_url);
        let referer = origin.unwrap_or(&self.default_referer);

        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "Calling upstream model");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", referer)
            .header("X-Title", self.app_name.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(classify_error_body(status.as_u16(), &error_text));
        }

        let envelope: Value = response.json().await?;
        Ok(envelope)
    }
}

/// Chat-completion request with the prompt and the image as one user message
pub fn build_request_body(model: &str, image_data_url: &str) -> Value {
    json!({
        "model": model,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
        "messages": [{
            "role": "user",
            "content": [
                { "type": "text", "text": CLASSIFICATION_PROMPT },
                { "type": "image_url", "image_url": { "url": image_data_url } }
            ]
        }]
    })
}

/// Map a non-2xx upstream response to an error
///
/// Only the `error` object of a JSON body is trusted: `code == 429` means
/// the model is busy, a `message` is surfaced with the upstream status.
/// Anything else collapses to a generic failure.
pub fn classify_error_body(status: u16, body: &str) -> UpstreamError {
    let error = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned());

    let Some(error) = error else {
        return UpstreamError::Malformed(format!("upstream returned {} without an error body", status));
    };

    let code = error.get("code").and_then(|c| {
        c.as_i64()
            .or_else(|| c.as_str().and_then(|s| s.parse::<i64>().ok()))
    });
    let message = error.get("message").and_then(Value::as_str);

    if code == Some(RATE_LIMIT_CODE) {
        return UpstreamError::RateLimited(message.unwrap_or_default().to_string());
    }

    match message {
        Some(message) => UpstreamError::Api {
            status,
            message: message.to_string(),
        },
        None => UpstreamError::Malformed(format!("upstream returned {}: {}", status, error)),
    }
}

/// Replace the model's free-form answer with its canonical token
///
/// The returned envelope keeps every top-level field, keeps only the first
/// choice, and keeps every field of that choice and its message except
/// `content`.
pub fn canonicalize_envelope(mut envelope: Value) -> Result<(Value, Verdict), UpstreamError> {
    let first_choice = envelope
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .cloned()
        .ok_or_else(|| UpstreamError::Malformed("response has no choices".to_string()))?;

    let content = first_choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| UpstreamError::Malformed("first choice has no text content".to_string()))?;

    let verdict = Verdict::from_model_reply(content);
    tracing::info!(reply = %content.trim(), verdict = %verdict, "AI response");

    let mut choice = first_choice;
    if let Some(message) = choice.get_mut("message").and_then(Value::as_object_mut) {
        message.insert("content".to_string(), Value::String(verdict.token().to_string()));
    }

    if let Some(obj) = envelope.as_object_mut() {
        obj.insert("choices".to_string(), Value::Array(vec![choice]));
    }

    Ok((envelope, verdict))
}
