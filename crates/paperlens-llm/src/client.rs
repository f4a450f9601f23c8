//! Retrying completion client.
//!
//! Wraps a backend with the adapter-level resilience policy: a fixed
//! number of attempts with exponential backoff on transient failures.
//! Terminal failures surface immediately. The pipeline itself performs
//! no additional retries.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message};

/// Attempt count and backoff bounds for one logical completion call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based attempt that just failed):
    /// base * 2^(n-1), capped at max_delay.
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn LlmBackend>,
    policy: RetryPolicy,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self {
            backend,
            policy: RetryPolicy::default(),
            temperature: 0.0,
            max_tokens: 4000,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Run one completion request through the retry policy.
    pub async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let attempts = self.policy.attempts.max(1);
        let mut last_message = String::new();

        for attempt in 1..=attempts {
            match self.backend.complete(req.clone()).await {
                Ok(resp) => {
                    debug!(
                        model = %resp.model,
                        attempt,
                        completion_tokens = resp.completion_tokens,
                        "Completion succeeded"
                    );
                    return Ok(resp);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        model = self.backend.model_id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient completion failure, retrying"
                    );
                    last_message = e.to_string();
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    last_message = e.to_string();
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::Exhausted { attempts, message: last_message })
    }

    /// Convenience wrapper: system + user message in, reply text out,
    /// using the client's sampling defaults.
    pub async fn complete_text(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let req = CompletionRequest {
            messages: vec![Message::system(system), Message::user(user)],
            model: None,
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };
        Ok(self.complete(req).await?.content)
    }
}
