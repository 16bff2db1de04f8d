//! Relay orchestration
//!
//! One call runs intake, normalization, the upstream call and response
//! mapping in sequence. Nothing is shared between calls except the injected
//! provider and the configured API key.

use crate::ai::{GenerateContentResponse, GenerationService};
use crate::intake::parse_body;
use crate::models::API_KEY_VAR;
use crate::normalize::normalize;
use crate::{Error, Result};
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const BODY_REJECTED: &str = "Request body rejected";
pub const INVALID_JSON: &str = "Invalid JSON body received by relay";
pub const UPSTREAM_LABEL: &str = "Gemini API error";
pub const NO_RESULT: &str = "No content returned by Gemini API";
pub const RELAY_FAILURE: &str = "relay failure";

/// Caller-facing error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Status plus JSON body text. Always served as `application/json`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RelayResponse {
    pub fn ok(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn error(status: StatusCode, body: &ErrorBody) -> Self {
        let mut json = serde_json::json!({ "error": body.error });
        if let Some(details) = &body.details {
            json["details"] = serde_json::Value::String(details.clone());
        }

        Self {
            status,
            body: json.to_string(),
        }
    }
}

/// Map a failed call to its caller-facing response.
pub fn error_response(err: &Error) -> RelayResponse {
    match err {
        Error::MethodNotAllowed(_) => RelayResponse::error(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorBody::new(METHOD_NOT_ALLOWED),
        ),
        Error::BodyRejected { status, message } => RelayResponse::error(
            StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_REQUEST),
            &ErrorBody::with_details(BODY_REJECTED, message.clone()),
        ),
        Error::InvalidJson(e) => RelayResponse::error(
            StatusCode::BAD_REQUEST,
            &ErrorBody::with_details(INVALID_JSON, e.to_string()),
        ),
        Error::MissingCredential(_) => RelayResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorBody::new(err.to_string()),
        ),
        Error::Upstream {
            status,
            status_text,
            body,
        } => {
            // Only error statuses are mirrored.
            let status = StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let details = if body.is_empty() {
                status_text.clone()
            } else {
                body.clone()
            };

            RelayResponse::error(
                status,
                &ErrorBody::with_details(format!("{}: {}", UPSTREAM_LABEL, status_text), details),
            )
        }
        Error::NoResult(reason) => RelayResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorBody::with_details(NO_RESULT, reason.clone()),
        ),
        Error::MalformedResponse(_)
        | Error::Http(_)
        | Error::Transport(_)
        | Error::Config(_) => RelayResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &ErrorBody::with_details(RELAY_FAILURE, err.to_string()),
        ),
    }
}

/// Extract the generated text, verbatim and unparsed.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String> {
    response
        .first_text()
        .map(|text| text.to_string())
        .ok_or_else(|| Error::NoResult(response.no_result_reason()))
}

/// Relays structured generation requests to a [`GenerationService`].
pub struct Relay {
    provider: Box<dyn GenerationService>,
    api_key: Option<String>,
}

impl Relay {
    /// `api_key` is the server-held credential. `None` makes every call fail
    /// with a configuration error before the provider is touched.
    pub fn new(provider: Box<dyn GenerationService>, api_key: Option<String>) -> Self {
        Self { provider, api_key }
    }

    /// Handle one inbound call.
    pub async fn handle(&self, method: &Method, body: &[u8]) -> RelayResponse {
        let span = tracing::info_span!("relay", request_id = %Uuid::new_v4());

        async {
            match self.process(method, body).await {
                Ok(text) => {
                    info!("Relayed {} bytes of generated content", text.len());
                    RelayResponse::ok(text)
                }
                Err(err) => {
                    let response = error_response(&err);
                    match err {
                        Error::MethodNotAllowed(_) | Error::InvalidJson(_) => {
                            warn!("Rejected request ({}): {}", response.status, err)
                        }
                        _ => error!("Relay call failed ({}): {}", response.status, err),
                    }
                    response
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, method: &Method, body: &[u8]) -> Result<String> {
        if method != Method::POST {
            return Err(Error::MethodNotAllowed(method.to_string()));
        }

        let payload = parse_body(body)?;
        let request = normalize(payload.contents, payload.generation_config);

        let api_key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingCredential(API_KEY_VAR))?;

        let response = self.provider.generate_content(api_key, &request).await?;
        extract_text(&response)
    }
}
