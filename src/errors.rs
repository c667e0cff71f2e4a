/*!
 * Error types for the yatsai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while parsing a transcript document
#[derive(Error, Debug)]
pub enum TranscriptError {
    /// The input document is empty (or whitespace only)
    #[error("Transcript is empty")]
    Empty,

    /// The document contained no parseable cue
    #[error("No valid cues found in transcript")]
    NoCues,

    /// A timestamp line could not be parsed into start/end times
    #[error("Invalid timestamp at line {line}: {text}")]
    InvalidTimestamp {
        /// 1-based line number in the source document
        line: usize,
        /// The offending line
        text: String,
    },

    /// Cue start times regress and the reject policy is active
    #[error("Cue {seq_num} starts before the preceding cue and the cue policy is 'reject'")]
    OutOfOrder {
        /// Sequence number of the offending cue
        seq_num: usize,
    },

    /// The input bytes are not valid UTF-8
    #[error("Transcript is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    /// Error reading the transcript file
    #[error("Failed to read transcript: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors for invalid configuration values, detected before any network call
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Overlap must leave room for forward progress
    #[error("chunk token budget ({chunk}) must be greater than overlap token budget ({overlap})")]
    BudgetOverlap {
        /// Configured chunk budget
        chunk: usize,
        /// Configured overlap budget
        overlap: usize,
    },

    /// A numeric setting that must be strictly positive is not
    #[error("{name} must be greater than zero")]
    NotPositive {
        /// Name of the offending setting
        name: &'static str,
    },

    /// Temperature outside the accepted range
    #[error("temperature {0} is outside the valid range 0.0..=2.0")]
    TemperatureOutOfRange(f32),

    /// No model identifier configured
    #[error("no model configured")]
    MissingModel,

    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur when talking to a completion backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// A single attempt exceeded its timeout window
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The configured model is unknown to the backend
    #[error("Model not found: {0}")]
    ModelNotFound(String),
}

impl ProviderError {
    /// Whether retrying this error has any chance of succeeding.
    ///
    /// Timeouts, connection failures, rate limits and 5xx responses are
    /// expected to resolve on retry; malformed requests, authentication
    /// failures and unknown models are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::Timeout(_)
            | Self::ConnectionError(_)
            | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::ParseError(_) | Self::AuthenticationError(_) | Self::ModelNotFound(_) => false,
        }
    }
}

/// Errors that terminate a summarization job
#[derive(Error, Debug)]
pub enum SummarizeError {
    /// Bad input document
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Invalid budgets or limits
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transient failures exhausted every retry attempt
    #[error("Inference backend unavailable after {attempts} attempts: {source}")]
    InferenceUnavailable {
        /// Number of attempts made before giving up
        attempts: u32,
        /// The last underlying cause
        #[source]
        source: ProviderError,
    },

    /// The backend rejected the request; retrying cannot fix it
    #[error("Inference backend rejected the request: {0}")]
    InferenceRejected(#[source] ProviderError),

    /// The job was cancelled before completing
    #[error("Job was cancelled")]
    Cancelled,

    /// A reduction level failed to shrink its input
    #[error("Reduction made no progress at level {level}: {tokens} tokens did not shrink")]
    NoProgress {
        /// The level that stalled
        level: usize,
        /// The level's estimated token count
        tokens: usize,
    },
}

impl SummarizeError {
    /// Whether this failure was caused by a cancellation signal
    /// rather than a system fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from transcript parsing
    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from a summarization job
    #[error("Summarization error: {0}")]
    Summarize(#[from] SummarizeError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
