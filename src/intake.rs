//! Inbound request body parsing
//!
//! Turns the caller's raw body into an [`InboundPayload`]: the two fields the
//! relay cares about, classified by shape. Everything else in the body is
//! ignored. Shape classification never fails; only unparsable JSON does.

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// The `contents` and `generationConfig` fields of an inbound body.
#[derive(Debug, Default)]
pub struct InboundPayload {
    pub contents: RawContents,
    pub generation_config: Option<RawGenerationConfig>,
}

/// Caller-supplied `contents`.
#[derive(Debug, Default, PartialEq)]
pub enum RawContents {
    Sequence(Vec<RawTurn>),
    /// Missing, null, or not an array.
    #[default]
    Absent,
}

/// One element of a `contents` array.
#[derive(Debug, PartialEq)]
pub enum RawTurn {
    /// Has a non-empty string `role` and an array `parts`. Only the string
    /// `text` of each part is kept.
    Shaped {
        role: String,
        texts: Vec<Option<String>>,
    },
    Unshaped(Value),
}

impl RawTurn {
    pub fn from_value(value: Value) -> Self {
        let shaped = match &value {
            Value::Object(fields) => match (fields.get("role"), fields.get("parts")) {
                (Some(Value::String(role)), Some(Value::Array(parts))) if !role.is_empty() => {
                    Some((role.clone(), parts.iter().map(part_text).collect()))
                }
                _ => None,
            },
            _ => None,
        };

        match shaped {
            Some((role, texts)) => RawTurn::Shaped { role, texts },
            None => RawTurn::Unshaped(value),
        }
    }
}

fn part_text(part: &Value) -> Option<String> {
    part.get("text")
        .and_then(Value::as_str)
        .map(|text| text.to_string())
}

/// Caller-supplied `generationConfig` object, split into recognized keys and
/// everything else. Values are not type-checked here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerationConfig {
    pub response_mime_type: Option<Value>,
    pub response_schema: Option<Value>,
    pub temperature: Option<Value>,
    pub top_p: Option<Value>,
    pub top_k: Option<Value>,
    pub candidate_count: Option<Value>,
    pub max_output_tokens: Option<Value>,
    pub stop_sequences: Option<Value>,
    pub presence_penalty: Option<Value>,
    pub frequency_penalty: Option<Value>,
    pub seed: Option<Value>,
    #[serde(flatten)]
    pub unrecognized: Map<String, Value>,
}

/// Parse an inbound body. Fails only when the body is not a JSON object.
pub fn parse_body(body: &[u8]) -> Result<InboundPayload> {
    let value: Value = serde_json::from_slice(body)?;

    let Value::Object(mut fields) = value else {
        return Err(Error::InvalidJson(serde::de::Error::custom(
            "expected a JSON object",
        )));
    };

    let contents = match fields.remove("contents") {
        Some(Value::Array(items)) => {
            RawContents::Sequence(items.into_iter().map(RawTurn::from_value).collect())
        }
        _ => RawContents::Absent,
    };

    let generation_config = match fields.remove("generationConfig") {
        Some(config @ Value::Object(_)) => Some(serde_json::from_value(config)?),
        _ => None,
    };

    Ok(InboundPayload {
        contents,
        generation_config,
    })
}
