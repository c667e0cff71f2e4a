/*!
 * Map-reduce summarization of transcripts using AI providers.
 *
 * This module contains the core summarization pipeline. It is split into
 * several submodules:
 *
 * - `engine`: The map-reduce state machine over a summarization job
 * - `client`: Inference client with concurrency, retry and timeout handling
 * - `prompts`: Prompt templates for chunk and reduction calls
 * - `cancel`: Job-level cancellation signalling
 */

// Re-export main types for easier usage
pub use self::cancel::CancellationToken;
pub use self::client::{Completion, InferenceClient, RetryPolicy};
pub use self::engine::{ChunkSummary, JobOutcome, JobPhase, JobStats, MapReduceSummarizer};
pub use self::prompts::{PromptSet, PromptTemplate};

// Submodules
pub mod cancel;
pub mod client;
pub mod engine;
pub mod prompts;
