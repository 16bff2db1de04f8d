use super::types::{ApiErrorEnvelope, GenerateContentResponse};
use crate::ai::GenerationService;
use crate::models::{GenerationRequest, DEFAULT_BASE_URL};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

/// Gemini REST client bound to one model.
///
/// Holds no generation settings and no credential; both arrive with each call.
pub struct GeminiClient {
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.0-flash`);
    /// a `models/` prefix is stripped.
    pub fn new(model: String) -> Self {
        Self::new_with_client(model, Client::new())
    }

    pub fn new_with_client(model: String, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Reason phrase for an upstream failure: the canonical one, else Gemini's
/// `error.status` from the body, else the bare code.
fn status_text(status: StatusCode, body: &str) -> String {
    if let Some(reason) = status.canonical_reason() {
        return reason.to_string();
    }

    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.status)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerateContentResponse> {
        tracing::debug!(
            "Sending generateContent request to Gemini (model {}, {} content items)",
            self.model,
            request.contents.len()
        );

        let response = self
            .client
            .post(self.generate_content_url())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::warn!("Failed to read Gemini error body: {}", e);
                String::new()
            });
            tracing::error!("Gemini API error (status {}): {}", status, body);
            return Err(Error::Upstream {
                status: status.as_u16(),
                status_text: status_text(status, &body),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::MalformedResponse(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, ConversationTurn, GenerationConfig, Part};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_CONTENT_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    fn make_client(server: &MockServer, model: &str) -> GeminiClient {
        GeminiClient::new(model.to_string()).with_base_url(server.uri())
    }

    fn sample_request() -> GenerationRequest {
        GenerationRequest {
            contents: vec![ContentItem::Turn(ConversationTurn {
                role: "user".to_string(),
                parts: vec![Part {
                    text: Some("hi".to_string()),
                }],
            })],
            generation_config: GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(json!({ "type": "OBJECT" })),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_generate_content_sends_key_header_and_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hi" }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT" }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "{\"ok\":true}" }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        let response = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap();

        assert_eq!(response.first_text(), Some("{\"ok\":true}"));
    }

    #[tokio::test]
    async fn test_key_is_not_sent_in_query_string() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        client
            .generate_content("secret-key", &sample_request())
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].url.query().is_none());
    }

    #[tokio::test]
    async fn test_strips_models_prefix_from_model_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let client = make_client(&server, "models/gemini-2.0-flash");
        assert_eq!(client.model(), "gemini-2.0-flash");

        client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rate_limit_returns_upstream_error() {
        let server = MockServer::start().await;

        let error_body = json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        });

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_json(error_body.clone()))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        match err {
            Error::Upstream {
                status,
                status_text,
                body,
            } => {
                assert_eq!(status, 429);
                assert_eq!(status_text, "Too Many Requests");
                assert!(body.contains("Quota exceeded"));
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_uncommon_status_uses_provider_status_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(599).set_body_json(json!({
                "error": { "code": 599, "message": "odd", "status": "UNAVAILABLE_ISH" }
            })))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Upstream { status: 599, ref status_text, .. } if status_text == "UNAVAILABLE_ISH"
        ));
    }

    #[tokio::test]
    async fn test_unparsable_success_body_is_malformed_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_null_candidates_decode_without_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_CONTENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": null })))
            .mount(&server)
            .await;

        let client = make_client(&server, "gemini-2.0-flash");
        let response = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap();

        assert!(response.first_text().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let client = GeminiClient::new("gemini-2.0-flash".to_string())
            .with_base_url("http://127.0.0.1:1".to_string());

        let err = client
            .generate_content("test-key", &sample_request())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GeminiClient::new("gemini-2.0-flash".to_string())
            .with_base_url("http://localhost:9000/".to_string());

        assert_eq!(
            client.generate_content_url(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
