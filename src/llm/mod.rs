//! Language-model call boundary.
//!
//! The engine needs exactly one capability: `complete(prompt, max_tokens, model)`.
//! [`GenaiModel`] provides it over real providers; [`ModelGateway`] adds caching,
//! the concurrency cap and retries on top of any implementation.

mod error;
pub mod gateway;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;


use async_trait::async_trait;

pub use error::LlmError;
pub use gateway::ModelGateway;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLanguageModel;
pub use provider::GenaiModel;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32, model: &str) -> Result<String, LlmError>;
}
