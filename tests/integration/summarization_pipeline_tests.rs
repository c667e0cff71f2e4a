/*!
 * End-to-end tests for the map-reduce summarization pipeline, run against
 * mock providers: chunk accounting, ordering under concurrency, retry
 * behavior, recursive reduction, cancellation and the partial-failure
 * policy.
 */

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use yatsai::errors::{ProviderError, SummarizeError, TranscriptError};
use yatsai::providers::mock::MockProvider;
use yatsai::providers::{CompletionProvider, CompletionRequest, CompletionResponse};
use yatsai::summarization::MapReduceSummarizer;
use yatsai::token_budget::TokenEstimator;
use yatsai::transcript_processor::TranscriptCue;

use crate::common::mock_providers::{RecordingProvider, SelectiveFailProvider};
use crate::common::{CUE_TEXT_40_CHARS, build_client, build_cues};

/// Five cues whose chunks carry distinguishable markers; with an
/// 15-token chunk budget each lands in its own chunk.
fn marker_cues() -> Vec<TranscriptCue> {
    (0..5)
        .map(|i| {
            TranscriptCue::new(
                i + 1,
                (i as u64) * 2000,
                (i as u64) * 2000 + 1500,
                format!("marker{} the speaker covers the next point", i),
            )
        })
        .collect()
}

fn summarizer(
    provider: Arc<dyn CompletionProvider>,
    max_concurrent: usize,
    retries: u32,
    chunk_budget: usize,
    overlap_budget: usize,
    reduction_budget: usize,
    allow_partial: bool,
) -> MapReduceSummarizer {
    MapReduceSummarizer::new(
        build_client(provider, max_concurrent, retries),
        TokenEstimator::default(),
        chunk_budget,
        overlap_budget,
        reduction_budget,
        allow_partial,
    )
    .unwrap()
}

#[tokio::test]
async fn test_three_chunk_transcript_should_map_once_and_reduce_once() {
    // 507 cues of exactly 10 tokens pack into exactly three 2000-token
    // chunks with a 200-token overlap
    let cues = build_cues(507, CUE_TEXT_40_CHARS);
    let provider = MockProvider::working();
    let summarizer = summarizer(Arc::new(provider.clone()), 3, 2, 2000, 200, 3000, false);

    let outcome = summarizer.summarize_cues(&cues).await.unwrap();

    assert_eq!(outcome.stats.chunks_processed, 3);
    // One mapping pass plus the final reduction
    assert_eq!(outcome.stats.levels, 2);
    // Three chunk calls and one reduction call
    assert_eq!(provider.call_count(), 4);
    assert!(!outcome.summary.is_empty());
    assert!(!outcome.partial);
}

#[tokio::test]
async fn test_chunk_summaries_should_be_reduced_in_chunk_order() {
    let provider = RecordingProvider::new();
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 0, 15, 0, 3000, false);

    let outcome = summarizer.summarize_cues(&marker_cues()).await.unwrap();
    assert_eq!(outcome.stats.chunks_processed, 5);

    // The reduction prompt is the last call; its summaries must appear in
    // chunk order even though earlier chunks responded slower
    let prompts = provider.prompts();
    let reduce_prompt = prompts.last().unwrap();
    let positions: Vec<usize> = (0..5)
        .map(|i| {
            reduce_prompt
                .find(&format!("summary-of-marker{}", i))
                .unwrap_or_else(|| panic!("summary for chunk {} missing from reduction", i))
        })
        .collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "summaries out of order in reduction prompt: {:?}",
        positions
    );
}

#[tokio::test]
async fn test_concurrency_should_stay_within_the_configured_cap() {
    let provider = RecordingProvider::new();
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 0, 15, 0, 3000, false);

    summarizer.summarize_cues(&marker_cues()).await.unwrap();

    assert_eq!(
        provider.max_in_flight(),
        2,
        "five slow chunks behind a cap of 2 should saturate but never exceed it"
    );
}

#[tokio::test]
async fn test_retries_should_be_invisible_until_exhausted() {
    // The first call fails once; with retries available the job still
    // succeeds and the extra attempt shows up in the stats
    let cues = marker_cues();
    let provider = MockProvider::flaky(1);
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 2, 15, 0, 3000, false);

    let outcome = summarizer.summarize_cues(&cues).await.unwrap();

    // 5 chunk calls + 1 reduce call + 1 retry of the failed attempt
    assert_eq!(provider.call_count(), 7);
    assert_eq!(outcome.stats.total_attempts, 7);
}

#[tokio::test]
async fn test_single_chunk_transcript_should_skip_mapping() {
    // One chunk goes straight to the reduction call; a flaky backend
    // succeeding on attempt N records exactly N attempts
    let cues = build_cues(3, CUE_TEXT_40_CHARS);
    let provider = MockProvider::flaky(2);
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 3, 2000, 200, 3000, false);

    let outcome = summarizer.summarize_cues(&cues).await.unwrap();

    assert_eq!(outcome.stats.chunks_processed, 1);
    assert_eq!(outcome.stats.levels, 1);
    assert_eq!(outcome.stats.total_attempts, 3);
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_oversized_level_should_trigger_another_mapping_pass() {
    // 60 cues -> 15 four-cue chunks; their summaries exceed a 250-token
    // reduction budget, so a second mapping pass must run before reduction
    let cues = build_cues(60, CUE_TEXT_40_CHARS);
    let provider = MockProvider::working();
    let summarizer = summarizer(Arc::new(provider.clone()), 3, 1, 50, 5, 250, false);

    let outcome = summarizer.summarize_cues(&cues).await.unwrap();

    assert!(
        outcome.stats.levels >= 3,
        "expected at least two mapping passes, got {} levels",
        outcome.stats.levels
    );
    assert!(
        outcome.stats.levels <= 5,
        "reduction failed to converge quickly: {} levels",
        outcome.stats.levels
    );
    assert!(outcome.stats.chunks_processed > 15);
    assert!(!outcome.summary.is_empty());
}

/// Echoes every prompt back verbatim: summaries that never compress
#[derive(Debug)]
struct EchoProvider;

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        Ok(CompletionResponse {
            text: request.prompt,
            prompt_tokens: None,
            completion_tokens: None,
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "echo-mock"
    }
}

#[tokio::test]
async fn test_non_compressing_backend_should_fail_instead_of_looping() {
    let cues = build_cues(60, CUE_TEXT_40_CHARS);
    let summarizer = summarizer(Arc::new(EchoProvider), 3, 0, 50, 5, 250, false);

    let error = summarizer.summarize_cues(&cues).await.unwrap_err();
    assert!(matches!(error, SummarizeError::NoProgress { .. }));
}

#[tokio::test]
async fn test_cancellation_mid_mapping_should_fail_with_cancelled() {
    let cues = marker_cues();
    let provider = MockProvider::slow(5_000);
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 0, 15, 0, 3000, false);

    let cancel = summarizer.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let error = summarizer.summarize_cues(&cues).await.unwrap_err();
    assert!(matches!(error, SummarizeError::Cancelled));
    assert!(error.is_cancellation());

    // Queued chunks behind the cap were abandoned without dispatch
    assert!(
        provider.call_count() <= 2,
        "cancellation should halt further dispatch, saw {} calls",
        provider.call_count()
    );
}

#[tokio::test]
async fn test_cancelled_summarizer_should_stay_cancelled() {
    let summarizer = summarizer(Arc::new(MockProvider::working()), 2, 0, 15, 0, 3000, false);
    summarizer.cancellation_token().cancel();

    let error = summarizer
        .summarize_cues(&marker_cues())
        .await
        .unwrap_err();
    assert!(matches!(error, SummarizeError::Cancelled));
}

#[tokio::test]
async fn test_partial_policy_should_skip_failed_chunk_and_record_it() {
    let provider = SelectiveFailProvider::new("marker2");
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 1, 15, 0, 3000, true);

    let outcome = summarizer.summarize_cues(&marker_cues()).await.unwrap();

    assert!(outcome.partial);
    assert_eq!(outcome.skipped_chunks, vec![2]);
    assert!(!outcome.summary.is_empty());
}

#[tokio::test]
async fn test_default_policy_should_fail_job_on_chunk_failure() {
    let provider = SelectiveFailProvider::new("marker2");
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 1, 15, 0, 3000, false);

    let error = summarizer.summarize_cues(&marker_cues()).await.unwrap_err();
    match error {
        SummarizeError::InferenceUnavailable { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected InferenceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_transient_failure_should_fail_without_retry() {
    let cues = marker_cues();
    let provider = MockProvider::failing();
    let summarizer = summarizer(Arc::new(provider.clone()), 1, 5, 15, 0, 3000, false);

    let error = summarizer.summarize_cues(&cues).await.unwrap_err();
    assert!(matches!(error, SummarizeError::InferenceRejected(_)));
    // The rejection surfaced from the first chunk's first attempt
    assert!(provider.call_count() >= 1);
}

#[tokio::test]
async fn test_empty_inputs_should_fail_before_any_call() {
    let provider = MockProvider::working();
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 0, 15, 0, 3000, false);

    let error = summarizer.summarize_cues(&[]).await.unwrap_err();
    assert!(matches!(
        error,
        SummarizeError::Transcript(TranscriptError::NoCues)
    ));

    let error = summarizer.summarize_text("   ").await.unwrap_err();
    assert!(matches!(
        error,
        SummarizeError::Transcript(TranscriptError::Empty)
    ));

    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_summarize_text_should_work_like_cues() {
    let text = "First sentence of the talk. Second sentence with more detail. \
                Third sentence concluding the point."
        .repeat(20);
    let provider = MockProvider::working();
    let summarizer = summarizer(Arc::new(provider.clone()), 2, 1, 50, 5, 3000, false);

    let outcome = summarizer.summarize_text(&text).await.unwrap();
    assert!(outcome.stats.chunks_processed > 1);
    assert!(!outcome.summary.is_empty());
    assert!(outcome.stats.compression_ratio() > 1.0);
}
