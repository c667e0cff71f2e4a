/*!
 * Inference client: the single gateway to the completion backend.
 *
 * Layers on top of a provider:
 * - a global semaphore capping simultaneously in-flight calls,
 * - an explicit retry policy (exponential backoff with jitter) applied to
 *   transient failures only,
 * - a fresh timeout window per attempt,
 * - cancellation, which abandons queued calls and aborts in-flight ones.
 *
 * Retries are invisible to the summarizer unless they are exhausted.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use tokio::sync::Semaphore;

use crate::errors::{ProviderError, SummarizeError};
use crate::providers::{CompletionProvider, CompletionRequest, CompletionResponse};
use crate::summarization::cancel::CancellationToken;

/// Retry schedule for transient provider failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (always >= 1)
    pub max_attempts: u32,
    /// Base backoff before the second attempt, in milliseconds
    pub base_delay_ms: u64,
    /// Ceiling on any single backoff delay, in milliseconds
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Build a policy from a retry count (attempts beyond the first)
    pub fn with_retries(retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: retries + 1,
            base_delay_ms,
            max_delay_ms: 30_000,
        }
    }

    /// Backoff delay after the given completed attempt (1-based), doubled
    /// per attempt with up to 25% added jitter
    pub fn delay_after_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let backoff_ms = self
            .base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);
        let jitter = if backoff_ms > 0 {
            rand::rng().random_range(0..=backoff_ms / 4)
        } else {
            0
        };
        Duration::from_millis(backoff_ms + jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_retries(2, 1000)
    }
}

/// A successful completion plus how hard it was to obtain
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text
    pub text: String,
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Prompt tokens reported by the backend
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the backend
    pub completion_tokens: Option<u64>,
}

/// Gateway through which every completion call flows
#[derive(Debug, Clone)]
pub struct InferenceClient {
    /// The completion backend
    provider: Arc<dyn CompletionProvider>,
    /// Global cap on simultaneously in-flight calls
    semaphore: Arc<Semaphore>,
    /// Size the semaphore was created with
    max_concurrent: usize,
    /// Retry schedule for transient failures
    retry: RetryPolicy,
    /// Timeout applied to each individual attempt
    timeout: Duration,
    /// Model identifier sent with every request
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum tokens per completion, None for backend default
    max_output_tokens: Option<u32>,
}

impl InferenceClient {
    /// Create a client over a provider
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        model: impl Into<String>,
        temperature: f32,
        max_concurrent: usize,
        timeout: Duration,
        retry: RetryPolicy,
        max_output_tokens: Option<u32>,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            retry,
            timeout,
            model: model.into(),
            temperature,
            max_output_tokens,
        }
    }

    /// The configured concurrency cap
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Complete a prompt, waiting for a concurrency slot, retrying transient
    /// failures and honoring cancellation throughout.
    pub async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<Completion, SummarizeError> {
        // Queued callers abandon their slot wait on cancellation
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => permit.unwrap(),
        };

        let request = CompletionRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        let mut attempt = 0u32;
        let mut last_error: Option<ProviderError> = None;

        while attempt < self.retry.max_attempts {
            attempt += 1;

            match self.attempt(&request, cancel).await? {
                Ok(response) => {
                    return Ok(Completion {
                        text: response.text,
                        attempts: attempt,
                        prompt_tokens: response.prompt_tokens,
                        completion_tokens: response.completion_tokens,
                    });
                }
                Err(error) if error.is_transient() => {
                    warn!(
                        "{} call failed (attempt {}/{}): {}",
                        self.provider.name(),
                        attempt,
                        self.retry.max_attempts,
                        error
                    );
                    last_error = Some(error);
                }
                Err(error) => {
                    return Err(SummarizeError::InferenceRejected(error));
                }
            }

            if attempt < self.retry.max_attempts {
                let delay = self.retry.delay_after_attempt(attempt);
                debug!("Backing off {:?} before attempt {}", delay, attempt + 1);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SummarizeError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(SummarizeError::InferenceUnavailable {
            attempts: attempt,
            source: last_error
                .unwrap_or_else(|| ProviderError::RequestFailed("no attempts made".to_string())),
        })
    }

    /// One attempt with its own fresh timeout window. The outer error is a
    /// cancellation; the inner result is the attempt outcome.
    async fn attempt(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<Result<CompletionResponse, ProviderError>, SummarizeError> {
        let call = self.provider.complete(request.clone());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SummarizeError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => Ok(result),
                Err(_) => Ok(Err(ProviderError::Timeout(self.timeout))),
            },
        }
    }
}
