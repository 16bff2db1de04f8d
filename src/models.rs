//! Data models and structures
//!
//! Defines the provider-facing `generateContent` request built by the
//! normalizer, plus the server configuration read from the environment.

use serde::Serialize;
use serde_json::{Number, Value};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

/// A single text part. Only `text` is ever forwarded upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One role-tagged unit of dialogue context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub role: String,
    pub parts: Vec<Part>,
}

/// An element of `contents` as sent upstream.
///
/// Elements that did not look like a turn are forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentItem {
    Turn(ConversationTurn),
    Passthrough(Value),
}

/// Allow-listed generation settings attached to each call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Number>,
}

/// Canonical `generateContent` request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub contents: Vec<ContentItem>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

// Configuration. No `Debug`: it holds the API key.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            gemini_api_key: std::env::var(API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: non_empty_var("GEMINI_MODEL")?
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            bind_addr: non_empty_var("RELAY_BIND_ADDR")?
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn non_empty_var(name: &str) -> crate::Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(crate::Error::Config(format!(
            "{} is not valid unicode",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_request_serializes_both_keys() {
        let json = serde_json::to_value(GenerationRequest::default()).unwrap();
        assert_eq!(json, json!({ "contents": [], "generationConfig": {} }));
    }

    #[test]
    fn test_generation_config_uses_camel_case() {
        let config = GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            max_output_tokens: Some(Number::from(256)),
            ..Default::default()
        };

        let json = serde_json::to_value(config).unwrap();
        assert_eq!(
            json,
            json!({ "responseMimeType": "application/json", "maxOutputTokens": 256 })
        );
    }

    #[test]
    fn test_part_without_text_serializes_empty() {
        let json = serde_json::to_string(&Part { text: None }).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_passthrough_item_serializes_verbatim() {
        let item = ContentItem::Passthrough(json!({ "parts": "odd", "extra": 1 }));
        let json = serde_json::to_value(item).unwrap();
        assert_eq!(json, json!({ "parts": "odd", "extra": 1 }));
    }
}
