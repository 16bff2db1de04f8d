//! Request normalization
//!
//! [`normalize`] rebuilds a caller payload into the one `generateContent`
//! shape the relay sends. Generation settings always travel with the
//! per-call payload; the Gemini client itself only knows the model id.
//!
//! Unrecognized config keys are dropped, as are recognized keys whose value
//! is null, an empty string, an empty array, or of the wrong JSON type.
//! `responseSchema` must be an object. Numeric zero is kept.

use crate::intake::{RawContents, RawGenerationConfig, RawTurn};
use crate::models::{ContentItem, ConversationTurn, GenerationConfig, GenerationRequest, Part};
use serde_json::{Number, Value};

/// Build the provider request from intake output. Pure and deterministic.
pub fn normalize(
    contents: RawContents,
    generation_config: Option<RawGenerationConfig>,
) -> GenerationRequest {
    GenerationRequest {
        contents: normalize_contents(contents),
        generation_config: generation_config
            .map(normalize_config)
            .unwrap_or_default(),
    }
}

fn normalize_contents(contents: RawContents) -> Vec<ContentItem> {
    match contents {
        RawContents::Sequence(turns) => turns.into_iter().map(normalize_turn).collect(),
        RawContents::Absent => Vec::new(),
    }
}

fn normalize_turn(turn: RawTurn) -> ContentItem {
    match turn {
        RawTurn::Shaped { role, texts } => ContentItem::Turn(ConversationTurn {
            role,
            parts: texts.into_iter().map(|text| Part { text }).collect(),
        }),
        RawTurn::Unshaped(value) => {
            tracing::warn!("Forwarding contents element without role/parts unchanged");
            ContentItem::Passthrough(value)
        }
    }
}

fn normalize_config(raw: RawGenerationConfig) -> GenerationConfig {
    if !raw.unrecognized.is_empty() {
        let keys: Vec<&str> = raw.unrecognized.keys().map(String::as_str).collect();
        tracing::debug!("Dropping unrecognized generationConfig keys: {:?}", keys);
    }

    GenerationConfig {
        response_mime_type: raw.response_mime_type.and_then(non_empty_string),
        response_schema: raw.response_schema.filter(Value::is_object),
        temperature: raw.temperature.and_then(number),
        top_p: raw.top_p.and_then(number),
        top_k: raw.top_k.and_then(number),
        candidate_count: raw.candidate_count.and_then(number),
        max_output_tokens: raw.max_output_tokens.and_then(number),
        stop_sequences: raw.stop_sequences.and_then(string_list),
        presence_penalty: raw.presence_penalty.and_then(number),
        frequency_penalty: raw.frequency_penalty.and_then(number),
        seed: raw.seed.and_then(number),
    }
}

fn non_empty_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn number(value: Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

fn string_list(value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        return None;
    };

    let strings: Option<Vec<String>> = items
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect();

    strings.filter(|list| !list.is_empty())
}
