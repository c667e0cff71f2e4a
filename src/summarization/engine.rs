/*!
 * Map-reduce summarization engine.
 *
 * A job walks a fixed state machine: MAPPING summarizes every chunk of the
 * current level under the client's concurrency cap, the reduction check
 * decides whether the concatenated summaries fit the reduction budget, and
 * REDUCING makes the single final call. When a level does not fit, its
 * concatenation is re-chunked into a new level and mapped again; each level
 * must strictly shrink, which bounds the level count and guarantees
 * termination.
 *
 * Chunk summaries are collected concurrently but always reassembled in
 * chunk order before reduction; reduction input order is a correctness
 * requirement, not cosmetic.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use log::{debug, warn};

use crate::chunker::{Chunk, Chunker};
use crate::errors::{ConfigError, ProviderError, SummarizeError, TranscriptError};
use crate::summarization::cancel::CancellationToken;
use crate::summarization::client::InferenceClient;
use crate::summarization::prompts::PromptSet;
use crate::token_budget::TokenEstimator;
use crate::transcript_processor::TranscriptCue;

/// Pipeline phase reported to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    /// Summarizing the chunks of the current level
    Mapping,
    /// Producing the final summary
    Reducing,
}

/// Summary of a single chunk or reduction input
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    /// Index of the source chunk within its level; None for the final summary
    pub chunk_index: Option<usize>,

    /// Summary text
    pub text: String,

    /// Estimated token cost of `text`
    pub token_count: usize,

    /// Attempts the inference client needed; zero when no call was made
    pub attempts: u32,
}

/// Aggregate statistics for one finished job
#[derive(Debug, Clone)]
pub struct JobStats {
    /// Chunks dispatched across all mapping passes
    pub chunks_processed: usize,

    /// Levels walked, counting the final reduction as one
    pub levels: usize,

    /// Inference attempts made, including retries
    pub total_attempts: u32,

    /// Prompt tokens reported by the backend
    pub prompt_tokens: u64,

    /// Completion tokens reported by the backend
    pub completion_tokens: u64,

    /// Wall-clock duration of the job
    pub elapsed: Duration,

    /// Character count of the input text
    pub original_chars: usize,

    /// Character count of the final summary
    pub summary_chars: usize,
}

impl JobStats {
    /// Input characters per summary character
    pub fn compression_ratio(&self) -> f64 {
        if self.summary_chars == 0 {
            0.0
        } else {
            self.original_chars as f64 / self.summary_chars as f64
        }
    }

    /// Generate a human-readable summary of the job statistics
    pub fn report(&self) -> String {
        format!(
            "Job Statistics:\n\
             Chunks processed: {}\n\
             Levels: {}\n\
             Inference attempts: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Elapsed: {:.2}s\n\
             Compression ratio: {:.1}x",
            self.chunks_processed,
            self.levels,
            self.total_attempts,
            self.prompt_tokens,
            self.completion_tokens,
            self.elapsed.as_secs_f64(),
            self.compression_ratio()
        )
    }
}

/// The result handed back to whoever started the job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Final summary text
    pub summary: String,

    /// Aggregate statistics
    pub stats: JobStats,

    /// Whether any chunk was skipped under the partial-failure policy
    pub partial: bool,

    /// Indices of first-level chunks skipped under the partial-failure policy
    pub skipped_chunks: Vec<usize>,
}

/// Orchestrates one summarization job over an inference client.
///
/// A summarizer is single-job: once its cancellation token fires, every
/// subsequent call fails with `Cancelled`. Construct a new one to restart.
#[derive(Debug, Clone)]
pub struct MapReduceSummarizer {
    /// Gateway to the completion backend
    client: InferenceClient,

    /// Shared token estimator
    estimator: TokenEstimator,

    /// Chunker for the initial transcript pass
    chunker: Chunker,

    /// Chunker for re-chunking summaries between levels
    level_chunker: Chunker,

    /// Budget the final reduction call must fit within
    reduction_token_budget: usize,

    /// Prompt templates
    prompts: PromptSet,

    /// Skip retry-exhausted chunks instead of failing the job
    allow_partial: bool,

    /// Job-level cancellation signal
    cancel: CancellationToken,
}

impl MapReduceSummarizer {
    /// Create a summarizer. Budget relationships are validated here, before
    /// any network call can happen.
    pub fn new(
        client: InferenceClient,
        estimator: TokenEstimator,
        chunk_token_budget: usize,
        overlap_token_budget: usize,
        reduction_token_budget: usize,
        allow_partial: bool,
    ) -> Result<Self, ConfigError> {
        let chunker = Chunker::new(estimator, chunk_token_budget, overlap_token_budget)?;
        if reduction_token_budget == 0 {
            return Err(ConfigError::NotPositive {
                name: "reduction_token_budget",
            });
        }
        // Levels re-chunk with the reduction budget; the overlap must leave
        // room there as well
        let level_chunker = Chunker::new(estimator, reduction_token_budget, overlap_token_budget)?;

        Ok(Self {
            client,
            estimator,
            chunker,
            level_chunker,
            reduction_token_budget,
            prompts: PromptSet::default(),
            allow_partial,
            cancel: CancellationToken::new(),
        })
    }

    /// A token that cancels this job when fired
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Summarize a parsed cue sequence - used by tests and external consumers
    #[allow(dead_code)]
    pub async fn summarize_cues(
        &self,
        cues: &[TranscriptCue],
    ) -> Result<JobOutcome, SummarizeError> {
        self.summarize_cues_with_progress(cues, |_, _, _| {}).await
    }

    /// Summarize a parsed cue sequence, reporting progress per completed call
    pub async fn summarize_cues_with_progress<F>(
        &self,
        cues: &[TranscriptCue],
        progress: F,
    ) -> Result<JobOutcome, SummarizeError>
    where
        F: Fn(JobPhase, usize, usize) + Clone + Send + 'static,
    {
        if cues.is_empty() {
            return Err(TranscriptError::NoCues.into());
        }

        let original_chars = cues
            .iter()
            .map(|c| c.text.chars().count() + 1)
            .sum::<usize>()
            .saturating_sub(1);
        let chunks = self.chunker.chunk_cues(cues);
        self.run(chunks, original_chars, progress).await
    }

    /// Summarize plain text - used by tests and external consumers
    #[allow(dead_code)]
    pub async fn summarize_text(&self, text: &str) -> Result<JobOutcome, SummarizeError> {
        self.summarize_text_with_progress(text, |_, _, _| {}).await
    }

    /// Summarize plain text, reporting progress per completed call
    #[allow(dead_code)]
    pub async fn summarize_text_with_progress<F>(
        &self,
        text: &str,
        progress: F,
    ) -> Result<JobOutcome, SummarizeError>
    where
        F: Fn(JobPhase, usize, usize) + Clone + Send + 'static,
    {
        if text.trim().is_empty() {
            return Err(TranscriptError::Empty.into());
        }

        let chunks = self.chunker.chunk_text(text);
        self.run(chunks, text.chars().count(), progress).await
    }

    /// Drive the state machine over an initial chunk sequence
    async fn run<F>(
        &self,
        mut chunks: Vec<Chunk>,
        original_chars: usize,
        progress: F,
    ) -> Result<JobOutcome, SummarizeError>
    where
        F: Fn(JobPhase, usize, usize) + Clone + Send + 'static,
    {
        if chunks.is_empty() {
            return Err(TranscriptError::Empty.into());
        }

        let started = Instant::now();
        let reduction_overhead = self.prompts.reduction.overhead_tokens(&self.estimator);

        let mut map_passes = 0;
        let mut chunks_processed = 0;
        let mut total_attempts = 0u32;
        let mut prompt_tokens = 0u64;
        let mut completion_tokens = 0u64;
        let mut skipped_chunks: Vec<usize> = Vec::new();
        let mut partial = false;

        // A transcript that fits a single chunk goes straight to reduction;
        // summarizing it first would only lose detail
        let mut single_chunk_fast_path = chunks.len() == 1;
        let mut prev_level_tokens: Option<usize> = None;
        let mut level = 0;

        let joined = loop {
            level += 1;
            if self.cancel.is_cancelled() {
                return Err(SummarizeError::Cancelled);
            }

            let summaries = if single_chunk_fast_path {
                single_chunk_fast_path = false;
                debug!("Single chunk; skipping the mapping pass");
                chunks_processed += 1;
                vec![ChunkSummary {
                    chunk_index: Some(0),
                    text: chunks[0].text.clone(),
                    token_count: chunks[0].token_count,
                    attempts: 0,
                }]
            } else {
                map_passes += 1;
                chunks_processed += chunks.len();
                let (summaries, level_skipped) = self
                    .map_level(
                        level,
                        &chunks,
                        &mut total_attempts,
                        &mut prompt_tokens,
                        &mut completion_tokens,
                        &progress,
                    )
                    .await?;
                if !level_skipped.is_empty() {
                    partial = true;
                    if level == 1 {
                        skipped_chunks.extend(level_skipped);
                    }
                }
                summaries
            };

            // REDUCTION CHECK: does the level fit one reduction call?
            let content_tokens: usize = summaries.iter().map(|s| s.token_count).sum();
            debug!(
                "Level {}: {} summaries holding ~{} content tokens",
                level,
                summaries.len(),
                content_tokens
            );

            let texts: Vec<&str> = summaries.iter().map(|s| s.text.as_str()).collect();
            let joined = texts.join("\n\n");
            let level_tokens = self.estimator.estimate(&joined) + reduction_overhead;

            if level_tokens <= self.reduction_token_budget {
                break joined;
            }

            debug!(
                "Level {} holds {} tokens, over the reduction budget {}; re-chunking",
                level, level_tokens, self.reduction_token_budget
            );

            // Each level must strictly shrink or the recursion cannot
            // terminate
            if let Some(prev) = prev_level_tokens {
                if level_tokens >= prev {
                    return Err(SummarizeError::NoProgress {
                        level,
                        tokens: level_tokens,
                    });
                }
            }
            prev_level_tokens = Some(level_tokens);

            chunks = self.level_chunker.chunk_text(&joined);
        };

        // REDUCING: the single final call
        progress(JobPhase::Reducing, 0, 1);
        let reduction_prompt = self.prompts.render_reduction(&joined);
        let completion = self.client.complete(&reduction_prompt, &self.cancel).await?;
        total_attempts += completion.attempts;
        prompt_tokens += completion.prompt_tokens.unwrap_or(0);
        completion_tokens += completion.completion_tokens.unwrap_or(0);
        progress(JobPhase::Reducing, 1, 1);

        let summary = completion.text.trim().to_string();
        let stats = JobStats {
            chunks_processed,
            levels: map_passes + 1,
            total_attempts,
            prompt_tokens,
            completion_tokens,
            elapsed: started.elapsed(),
            original_chars,
            summary_chars: summary.chars().count(),
        };

        Ok(JobOutcome {
            summary,
            stats,
            partial,
            skipped_chunks,
        })
    }

    /// MAPPING: summarize every chunk of one level concurrently, then
    /// reassemble in chunk order.
    async fn map_level<F>(
        &self,
        level: usize,
        chunks: &[Chunk],
        total_attempts: &mut u32,
        prompt_tokens: &mut u64,
        completion_tokens: &mut u64,
        progress: &F,
    ) -> Result<(Vec<ChunkSummary>, Vec<usize>), SummarizeError>
    where
        F: Fn(JobPhase, usize, usize) + Clone + Send + 'static,
    {
        let total = chunks.len();
        let done = Arc::new(AtomicUsize::new(0));

        let results = stream::iter(chunks.iter())
            .map(|chunk| {
                let client = self.client.clone();
                let cancel = self.cancel.clone();
                let prompt = self.prompts.render_chunk(chunk.index + 1, total, &chunk.text);
                let progress = progress.clone();
                let done = done.clone();
                let idx = chunk.index;

                async move {
                    let result = client.complete(&prompt, &cancel).await;
                    let current = done.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(JobPhase::Mapping, current, total);
                    (idx, result)
                }
            })
            .buffer_unordered(self.client.max_concurrent())
            .collect::<Vec<_>>()
            .await;

        // Restore chunk order; completion order depends on scheduling
        let mut sorted = results;
        sorted.sort_by_key(|(idx, _)| *idx);

        let mut summaries = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        let mut first_error: Option<SummarizeError> = None;

        for (idx, result) in sorted {
            match result {
                Ok(completion) => {
                    *total_attempts += completion.attempts;
                    *prompt_tokens += completion.prompt_tokens.unwrap_or(0);
                    *completion_tokens += completion.completion_tokens.unwrap_or(0);

                    let text = completion.text.trim().to_string();
                    let token_count = self.estimator.estimate(&text);
                    summaries.push(ChunkSummary {
                        chunk_index: Some(idx),
                        text,
                        token_count,
                        attempts: completion.attempts,
                    });
                }
                Err(SummarizeError::Cancelled) => {
                    // Completed summaries are discarded; a cancelled job has
                    // no partial result
                    return Err(SummarizeError::Cancelled);
                }
                Err(error @ SummarizeError::InferenceUnavailable { .. }) if self.allow_partial => {
                    warn!("Skipping chunk {} at level {}: {}", idx, level, error);
                    if let SummarizeError::InferenceUnavailable { attempts, .. } = &error {
                        *total_attempts += attempts;
                    }
                    skipped.push(idx);
                }
                Err(error) => {
                    if let SummarizeError::InferenceUnavailable { attempts, .. } = &error {
                        *total_attempts += attempts;
                    }
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        let retried: Vec<usize> = summaries
            .iter()
            .filter(|s| s.attempts > 1)
            .filter_map(|s| s.chunk_index)
            .collect();
        if !retried.is_empty() {
            debug!("Chunks retried at level {}: {:?}", level, retried);
        }

        if summaries.is_empty() {
            return Err(SummarizeError::InferenceUnavailable {
                attempts: *total_attempts,
                source: ProviderError::RequestFailed(format!(
                    "every chunk failed at level {}",
                    level
                )),
            });
        }

        Ok((summaries, skipped))
    }
}
