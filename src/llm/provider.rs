//! [`LanguageModel`] backed by the `genai` multi-provider client.

use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::error;

use super::LanguageModel;
use super::error::LlmError;

/// Single-turn, deterministic (temperature 0) chat completion.
///
/// Provider credentials are resolved by `genai` from the usual environment
/// variables (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...) based on the model name.
#[derive(Clone)]
pub struct GenaiModel {
    client: Client,
    temperature: f64,
}

impl std::fmt::Debug for GenaiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiModel")
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

impl Default for GenaiModel {
    fn default() -> Self {
        Self::new(Client::default())
    }
}

impl GenaiModel {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl LanguageModel for GenaiModel {
    async fn complete(&self, prompt: &str, max_tokens: u32, model: &str) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let options = ChatOptions::default()
            .with_max_tokens(max_tokens)
            .with_temperature(self.temperature);

        let response = self
            .client
            .exec_chat(model, request, Some(&options))
            .await
            .map_err(|e| {
                error!(model, error = %e, "Provider chat error");
                LlmError::Provider(e.to_string())
            })?;

        response
            .first_text()
            .map(str::to_string)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
