//! Cached, rate-limited, retried access to a [`LanguageModel`].

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::LanguageModel;
use super::error::LlmError;
use crate::cache::EngineCache;
use crate::hashing::model_call_key;
use crate::retry::{AttemptError, RetryPolicy, retry_async};

/// Every model call of the engine goes through one gateway.
///
/// The call order is: model-output cache, concurrency permit, retried call,
/// cache write. Only successful completions are cached.
#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn LanguageModel>,
    cache: Arc<EngineCache>,
    permits: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ModelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelGateway")
            .field("available_permits", &self.permits.available_permits())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ModelGateway {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        cache: Arc<EngineCache>,
        max_concurrency: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            model,
            cache,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
            retry,
        }
    }

    pub fn cache(&self) -> &Arc<EngineCache> {
        &self.cache
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the completion for `prompt`, from cache when available.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn complete(&self, prompt: &str, max_tokens: u32, model: &str) -> Result<String, LlmError> {
        let key = model_call_key(prompt, model, max_tokens);
        if let Some(cached) = self.cache.model().get(&key) {
            debug!(key = %key, "Model cache hit");
            return Ok(cached);
        }

        let _permit = self.permits.acquire().await.map_err(|_| LlmError::Closed)?;

        let output = retry_async(&self.retry, "model_call", || {
            self.model.complete(prompt, max_tokens, model)
        })
        .await
        .map_err(|e| {
            warn!(attempts = e.attempts, error = %e.last, "Model call exhausted retries");
            match e.last {
                AttemptError::TimedOut(after) if e.attempts == 1 => LlmError::Timeout(after),
                last => LlmError::Exhausted {
                    attempts: e.attempts,
                    last: last.to_string(),
                },
            }
        })?;

        self.cache.model().insert(key, output.clone());
        Ok(output)
    }
}
