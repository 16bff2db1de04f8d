use super::{GenerateContentResponse, GenerationService};
use crate::models::GenerationRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Canned outcome for one mocked `generateContent` call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Response(GenerateContentResponse),
    Upstream {
        status: u16,
        status_text: String,
        body: String,
    },
    Transport(String),
}

impl MockOutcome {
    fn into_result(self) -> Result<GenerateContentResponse> {
        match self {
            MockOutcome::Response(response) => Ok(response),
            MockOutcome::Upstream {
                status,
                status_text,
                body,
            } => Err(Error::Upstream {
                status,
                status_text,
                body,
            }),
            MockOutcome::Transport(message) => Err(Error::Transport(message)),
        }
    }
}

/// In-memory [`GenerationService`] that records every call.
///
/// Outcomes are returned in order, cycling once exhausted. With no outcomes
/// configured it answers `{"mock":true}`.
pub struct MockGenerationClient {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            api_keys: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_text_response(self, text: &str) -> Self {
        self.with_outcome(MockOutcome::Response(GenerateContentResponse::from_text(
            text,
        )))
    }

    pub fn with_response(self, response: GenerateContentResponse) -> Self {
        self.with_outcome(MockOutcome::Response(response))
    }

    pub fn with_upstream_error(self, status: u16, status_text: &str, body: &str) -> Self {
        self.with_outcome(MockOutcome::Upstream {
            status,
            status_text: status_text.to_string(),
            body: body.to_string(),
        })
    }

    pub fn with_transport_error(self, message: &str) -> Self {
        self.with_outcome(MockOutcome::Transport(message.to_string()))
    }

    pub fn with_outcome(self, outcome: MockOutcome) -> Self {
        self.outcomes.lock().unwrap().push(outcome);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// API keys received so far, in call order.
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockGenerationClient {
    /// Clones share call history, so a test can keep a handle after moving
    /// the mock into a relay.
    fn clone(&self) -> Self {
        Self {
            outcomes: Arc::clone(&self.outcomes),
            requests: Arc::clone(&self.requests),
            api_keys: Arc::clone(&self.api_keys),
            call_count: Arc::clone(&self.call_count),
        }
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerateContentResponse> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.requests.lock().unwrap().push(request.clone());
        self.api_keys.lock().unwrap().push(api_key.to_string());

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            Ok(GenerateContentResponse::from_text(r#"{"mock":true}"#))
        } else {
            let index = (count - 1) % outcomes.len();
            outcomes[index].clone().into_result()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response() {
        let client = MockGenerationClient::new();
        let response = client
            .generate_content("key", &GenerationRequest::default())
            .await
            .unwrap();

        assert_eq!(response.first_text(), Some(r#"{"mock":true}"#));
    }

    #[tokio::test]
    async fn test_mock_cycles_outcomes() {
        let client = MockGenerationClient::new()
            .with_text_response("first")
            .with_upstream_error(503, "Service Unavailable", "overloaded");

        let request = GenerationRequest::default();
        let first = client.generate_content("key", &request).await.unwrap();
        assert_eq!(first.first_text(), Some("first"));

        let second = client.generate_content("key", &request).await.unwrap_err();
        assert!(matches!(second, Error::Upstream { status: 503, .. }));

        // Should cycle back
        let third = client.generate_content("key", &request).await.unwrap();
        assert_eq!(third.first_text(), Some("first"));
    }

    #[tokio::test]
    async fn test_mock_records_calls_across_clones() {
        let client = MockGenerationClient::new();
        let handle = client.clone();

        assert_eq!(handle.get_call_count(), 0);

        client
            .generate_content("abc", &GenerationRequest::default())
            .await
            .unwrap();

        assert_eq!(handle.get_call_count(), 1);
        assert_eq!(handle.api_keys(), vec!["abc".to_string()]);
        assert_eq!(handle.requests(), vec![GenerationRequest::default()]);
    }
}
