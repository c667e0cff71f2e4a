use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::transcript_processor::CuePolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Summarization settings
    #[serde(default)]
    pub summarization: SummarizationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Completion backend configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Model name
    #[serde(default = "default_model")]
    pub model: String,

    // @field: Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    // @field: Max concurrent requests
    #[serde(default = "default_concurrent_requests")]
    pub max_concurrent_requests: usize,

    // @field: Per-attempt timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // @field: Base backoff in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    // @field: Max tokens per completion (None = backend default)
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            temperature: default_temperature(),
            max_concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            max_output_tokens: None,
        }
    }
}

impl ProviderConfig {
    /// The per-attempt timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Chunking and reduction configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SummarizationConfig {
    /// Maximum estimated tokens per transcript chunk
    #[serde(default = "default_chunk_token_budget")]
    pub chunk_token_budget: usize,

    /// Estimated tokens of overlap repeated between adjacent chunks
    #[serde(default = "default_overlap_token_budget")]
    pub overlap_token_budget: usize,

    /// Budget the final reduction call must fit within
    #[serde(default = "default_reduction_token_budget")]
    pub reduction_token_budget: usize,

    /// Average characters per token used by the estimator
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// How to handle cues whose start times regress
    #[serde(default)]
    pub cue_policy: CuePolicy,

    /// Skip retry-exhausted chunks instead of failing the job
    #[serde(default)]
    pub allow_partial: bool,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            chunk_token_budget: default_chunk_token_budget(),
            overlap_token_budget: default_overlap_token_budget(),
            reduction_token_budget: default_reduction_token_budget(),
            chars_per_token: default_chars_per_token(),
            cue_policy: CuePolicy::default(),
            allow_partial: false,
        }
    }
}

/// Log level for the application
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            summarization: SummarizationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Validate every setting once, before any work starts.
    ///
    /// Jobs receive the configuration as already-validated; nothing
    /// re-validates per call.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.summarization;
        if s.chunk_token_budget == 0 {
            return Err(ConfigError::NotPositive {
                name: "chunk_token_budget",
            });
        }
        if s.reduction_token_budget == 0 {
            return Err(ConfigError::NotPositive {
                name: "reduction_token_budget",
            });
        }
        if s.overlap_token_budget >= s.chunk_token_budget {
            return Err(ConfigError::BudgetOverlap {
                chunk: s.chunk_token_budget,
                overlap: s.overlap_token_budget,
            });
        }
        if s.overlap_token_budget >= s.reduction_token_budget {
            return Err(ConfigError::BudgetOverlap {
                chunk: s.reduction_token_budget,
                overlap: s.overlap_token_budget,
            });
        }
        if s.chars_per_token == 0 {
            return Err(ConfigError::NotPositive {
                name: "chars_per_token",
            });
        }

        let p = &self.provider;
        if p.max_concurrent_requests == 0 {
            return Err(ConfigError::NotPositive {
                name: "max_concurrent_requests",
            });
        }
        if p.timeout_secs == 0 {
            return Err(ConfigError::NotPositive {
                name: "timeout_secs",
            });
        }
        if !(0.0..=2.0).contains(&p.temperature) {
            return Err(ConfigError::TemperatureOutOfRange(p.temperature));
        }
        if p.model.trim().is_empty() {
            return Err(ConfigError::MissingModel);
        }

        Ok(())
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_concurrent_requests() -> usize {
    3
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_chunk_token_budget() -> usize {
    2000
}

fn default_overlap_token_budget() -> usize {
    200
}

fn default_reduction_token_budget() -> usize {
    3000
}

fn default_chars_per_token() -> usize {
    4
}
