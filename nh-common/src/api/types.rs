//! Request/response bodies for the relay's HTTP API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `POST /analyze-image` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Image as a base64 data URL
    pub image: String,
}

/// Error body returned by every failing relay endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// `GET /health` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// ISO 8601 UTC timestamp of the response
    pub timestamp: String,
}

/// Successful `POST /analyze-image` response
///
/// This is the upstream chat-completion envelope; only the fields the client
/// reads are typed, everything else is kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeImageResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<Choice>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: ChoiceMessage,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnalyzeImageResponse {
    /// Content of the first choice, if the envelope carries one
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_keeps_unknown_fields() {
        let body = json!({
            "id": "gen-123",
            "model": "meta-llama/llama-3.2-11b-vision-instruct",
            "choices": [{
                "index": 0,
                "finish_reason": "stop",
                "message": { "role": "assistant", "content": "HAMBURGER" }
            }],
            "usage": { "total_tokens": 12 }
        });

        let parsed: AnalyzeImageResponse = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(parsed.first_content(), Some("HAMBURGER"));
        assert_eq!(parsed.extra["id"], "gen-123");
        assert_eq!(parsed.choices[0].extra["finish_reason"], "stop");
        assert_eq!(parsed.choices[0].message.extra["role"], "assistant");

        assert_eq!(serde_json::to_value(&parsed).unwrap(), body);
    }

    #[test]
    fn test_envelope_without_choices() {
        let parsed: AnalyzeImageResponse = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert!(parsed.choices.is_empty());
        assert_eq!(parsed.first_content(), None);

        let parsed: AnalyzeImageResponse =
            serde_json::from_value(json!({ "choices": [{ "message": {} }] })).unwrap();
        assert_eq!(parsed.first_content(), None);
    }

    #[test]
    fn test_envelope_with_null_fields() {
        let parsed: AnalyzeImageResponse = serde_json::from_value(json!({ "choices": null })).unwrap();
        assert!(parsed.choices.is_empty());

        let parsed: AnalyzeImageResponse =
            serde_json::from_value(json!({ "choices": [{ "message": null }] })).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.first_content(), None);

        let parsed: AnalyzeImageResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": null } }] })).unwrap();
        assert_eq!(parsed.first_content(), None);
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("boom")).unwrap();
        assert_eq!(body, json!({ "error": "boom" }));
    }
}
