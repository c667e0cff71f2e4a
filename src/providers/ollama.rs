use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::providers::{CompletionProvider, CompletionRequest, CompletionResponse};

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct OllamaClient {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

/// Model list response from the Ollama API
#[derive(Debug, Deserialize)]
struct TagsResponse {
    /// Locally available models
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// One locally available model
#[derive(Debug, Deserialize)]
struct ModelTag {
    /// Model name, e.g. "llama3:latest"
    name: String,
}

impl OllamaClient {
    /// Create a new Ollama client from an endpoint string.
    ///
    /// Accepts "host", "host:port" or a full URL; a missing scheme defaults
    /// to http and a missing port to 11434.
    ///
    /// Uses connection pooling for better performance with concurrent
    /// requests. Note: Ollama typically uses HTTP/1.1, so we don't force
    /// HTTP/2. No request timeout is set here; per-attempt timeouts are
    /// enforced by the caller so each retry gets a fresh window.
    pub fn from_endpoint(endpoint: &str, pool_size: usize) -> Result<Self, ProviderError> {
        let base_url = normalize_endpoint(endpoint)?;

        let client = Client::builder()
            // Force HTTP/1.1 - Ollama uses HTTP/1.1
            .http1_only()
            // Keep connections alive for better performance
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(pool_size.max(1))
            // Enable TCP keepalive
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Ok(Self { base_url, client })
    }

    /// Check whether the configured model is available locally
    pub async fn has_model(&self, model: &str) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(tags.models.iter().any(|m| m.name.starts_with(model)))
    }
}

#[async_trait]
impl CompletionProvider for OllamaClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let body = GenerationRequest {
            model: request.model.clone(),
            prompt: request.prompt,
            options: Some(GenerationOptions {
                temperature: Some(request.temperature),
                // -1 generates until a natural stopping point
                num_predict: Some(
                    request
                        .max_output_tokens
                        .map(|n| n as i32)
                        .unwrap_or(-1),
                ),
            }),
            stream: Some(false),
        };

        debug!("POST {} (model {})", url, request.model);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Ollama API error ({}): {}", status, message);
            return Err(classify_status(status.as_u16(), message, &request.model));
        }

        let generated: GenerationResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        Ok(CompletionResponse {
            text: generated.response,
            prompt_tokens: generated.prompt_eval_count,
            completion_tokens: generated.eval_count,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Normalize an endpoint string into a scheme://host:port base URL
fn normalize_endpoint(endpoint: &str) -> Result<String, ProviderError> {
    if endpoint.is_empty() {
        return Err(ProviderError::ConnectionError(
            "Endpoint cannot be empty".to_string(),
        ));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)
    } else {
        Url::parse(&format!("http://{}", endpoint))
    }
    .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint {}: {}", endpoint, e)))?;

    let host = url
        .host_str()
        .ok_or_else(|| {
            ProviderError::ConnectionError(format!("Invalid host in endpoint: {}", endpoint))
        })?
        .to_string();

    let port = url.port().unwrap_or(11434);

    Ok(format!("{}://{}:{}", url.scheme(), host, port))
}

/// Map a reqwest transport error onto the provider error taxonomy
fn classify_reqwest_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(Duration::from_secs(0))
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map an HTTP error status onto the provider error taxonomy
fn classify_status(status_code: u16, message: String, model: &str) -> ProviderError {
    match status_code {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded(message),
        404 if message.contains("model") => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code,
            message,
        },
    }
}
