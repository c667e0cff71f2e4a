/*!
 * Provider implementations for completion backends.
 *
 * This module contains client implementations for text-completion services:
 * - Ollama: Local LLM server
 * - Mock: Scripted behaviors for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single completion request, independent of any backend's wire format
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate, None for the backend default
    pub max_output_tokens: Option<u32>,
}

/// A completion response, reduced to what the summarizer consumes
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated text
    pub text: String,
    /// Prompt tokens consumed, when the backend reports them
    pub prompt_tokens: Option<u64>,
    /// Completion tokens generated, when the backend reports them
    pub completion_tokens: Option<u64>,
}

/// Common trait for all completion providers
///
/// This trait defines the interface that all provider implementations must
/// follow, allowing them to be used interchangeably by the inference client.
/// Errors carry a transient/non-transient classification via
/// [`ProviderError::is_transient`]; retry decisions live in the caller.
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<CompletionResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Human-readable provider name for logs
    fn name(&self) -> &str;
}

pub mod mock;
pub mod ollama;
