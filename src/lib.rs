/*!
 * # yatsai - Yet Another Transcript Summarizer with AI
 *
 * A Rust library for summarizing subtitle/transcript files with AI, however
 * far the input exceeds the model's context window.
 *
 * ## Features
 *
 * - Parse WebVTT and SRT transcripts into timed cues
 * - Split transcripts into overlapping, token-budget-bounded chunks
 * - Summarize chunks concurrently against an Ollama backend, with
 *   retry/backoff, per-attempt timeouts and cancellation
 * - Recursively reduce chunk summaries until a single summary fits the
 *   reduction budget
 * - Configurable budgets, concurrency and cue-ordering policy
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `transcript_processor`: Transcript file parsing into cues
 * - `token_budget`: Token cost estimation shared by every sizing decision
 * - `chunker`: Overlapping window construction
 * - `summarization`: The map-reduce engine:
 *   - `summarization::engine`: Job state machine
 *   - `summarization::client`: Inference client (concurrency, retry, timeout)
 *   - `summarization::prompts`: Prompt templates
 *   - `summarization::cancel`: Cancellation signalling
 * - `providers`: Client implementations for completion backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: Scripted provider for tests
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod chunker;
pub mod errors;
pub mod providers;
pub mod summarization;
pub mod token_budget;
pub mod transcript_processor;

// Re-export main types for easier usage
pub use app_config::Config;
pub use chunker::{Chunk, Chunker};
pub use errors::{AppError, ConfigError, ProviderError, SummarizeError, TranscriptError};
pub use summarization::{InferenceClient, JobOutcome, JobStats, MapReduceSummarizer};
pub use token_budget::TokenEstimator;
pub use transcript_processor::{CuePolicy, TranscriptCollection, TranscriptCue};
