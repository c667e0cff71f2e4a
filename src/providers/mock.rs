/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with a summary
 * - `MockProvider::failing()` - Always fails with a non-transient error
 * - `MockProvider::flaky(n)` - Fails the first n calls, then succeeds
 * - `MockProvider::slow(ms)` - Succeeds after a delay, tracking in-flight calls
 */

// Allow dead code - mock constructors are for the test suite
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a condensed echo of the prompt
    Working,
    /// Always fails with a non-transient error
    Failing,
    /// Always fails with a transient error
    TransientFailing,
    /// Fails the first `failures` calls with a transient error, then succeeds
    Flaky {
        /// Number of leading calls that fail
        failures: usize,
    },
    /// Succeeds after a delay (for concurrency and cancellation testing)
    Slow {
        /// Delay before responding
        delay_ms: u64,
    },
    /// Returns an empty response
    Empty,
}

/// Mock provider for testing summarization behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total calls made
    call_count: Arc<AtomicUsize>,
    /// Calls currently in flight
    in_flight: Arc<AtomicUsize>,
    /// High-water mark of simultaneous in-flight calls
    max_in_flight: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors (non-transient)
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that always fails with a transient error
    pub fn transient_failing() -> Self {
        Self::new(MockBehavior::TransientFailing)
    }

    /// Create a mock that fails the first `failures` calls, then succeeds
    pub fn flaky(failures: usize) -> Self {
        Self::new(MockBehavior::Flaky { failures })
    }

    /// Create a mock that responds after a delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Total number of completed calls
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed in flight simultaneously
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Condense a prompt into a deterministic fake summary. The trailing
    /// word count makes outputs distinguishable and strictly shorter than
    /// their inputs, so recursive reduction terminates in tests.
    fn summarize_prompt(prompt: &str) -> String {
        let words: Vec<&str> = prompt.split_whitespace().collect();
        let keep = (words.len() / 10).clamp(3, 30);
        let mut text = String::from("[summary] ");
        text.push_str(&words[words.len().saturating_sub(keep)..].join(" "));
        text
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            call_count: Arc::clone(&self.call_count),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match self.behavior {
            MockBehavior::Working => Ok(CompletionResponse {
                text: Self::summarize_prompt(&request.prompt),
                prompt_tokens: Some(request.prompt.len() as u64 / 4),
                completion_tokens: Some(10),
            }),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 400,
                message: "Simulated provider rejection".to_string(),
            }),

            MockBehavior::TransientFailing => Err(ProviderError::ApiError {
                status_code: 503,
                message: "Simulated provider outage".to_string(),
            }),

            MockBehavior::Flaky { failures } => {
                if count < failures {
                    Err(ProviderError::ConnectionError(format!(
                        "Simulated transient failure (request #{})",
                        count + 1
                    )))
                } else {
                    Ok(CompletionResponse {
                        text: Self::summarize_prompt(&request.prompt),
                        prompt_tokens: Some(10),
                        completion_tokens: Some(10),
                    })
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(CompletionResponse {
                    text: Self::summarize_prompt(&request.prompt),
                    prompt_tokens: Some(10),
                    completion_tokens: Some(10),
                })
            }

            MockBehavior::Empty => Ok(CompletionResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "Simulated connection failure".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
