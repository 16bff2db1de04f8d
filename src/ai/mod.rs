//! Upstream generation service integration
//!
//! [`GenerationService`] is the seam between the relay and the provider: the
//! Gemini REST client implements it for production, [`MockGenerationClient`]
//! for tests.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiClient, GenerateContentResponse};
pub use mock::MockGenerationClient;

use crate::models::GenerationRequest;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Perform exactly one `generateContent` call authenticated with `api_key`.
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GenerateContentResponse>;
}
