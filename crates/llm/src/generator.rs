//! The text-generation capability consumed by the conversation gateway.

use async_trait::async_trait;
use dqbot_core::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, Turn};
use serde::{Deserialize, Serialize};

use crate::ai_types::{ChatRequest, Message};
use crate::client::LlmClient;
use crate::error::LlmError;

/// Per-request generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.to_owned(), temperature: DEFAULT_TEMPERATURE }
    }
}

/// Request/response text generation: ordered turns in, one assistant reply out.
///
/// Timeouts are applied by the caller; retries belong to the implementation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, turns: &[Turn], params: &GenerationParams) -> Result<String, LlmError>;
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, turns: &[Turn], params: &GenerationParams) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: params.model.clone(),
            messages: turns.iter().map(Message::from).collect(),
            temperature: params.temperature,
        };
        tracing::debug!(model = %request.model, turns = turns.len(), "chat completion request");
        self.chat_completion(&request).await
    }
}
