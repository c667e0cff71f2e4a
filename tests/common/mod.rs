/*!
 * Common test utilities shared across the test suite
 */


use std::sync::Arc;
use std::time::Duration;

use yatsai::providers::CompletionProvider;
use yatsai::summarization::{InferenceClient, RetryPolicy};
use yatsai::transcript_processor::TranscriptCue;

/// A 40-character cue body: 10 tokens under the default 4-chars-per-token
/// estimator, which makes chunk arithmetic in tests exact.
pub const CUE_TEXT_40_CHARS: &str = "the speaker continues the discussion now";

/// Build `count` sequential cues with the given text
pub fn build_cues(count: usize, text: &str) -> Vec<TranscriptCue> {
    (0..count)
        .map(|i| {
            TranscriptCue::new(
                i + 1,
                (i as u64) * 3000,
                (i as u64) * 3000 + 2500,
                text.to_string(),
            )
        })
        .collect()
}

/// Build an inference client over a provider with fast test timings
pub fn build_client(
    provider: Arc<dyn CompletionProvider>,
    max_concurrent: usize,
    retries: u32,
) -> InferenceClient {
    InferenceClient::new(
        provider,
        "mock-model",
        0.3,
        max_concurrent,
        Duration::from_secs(10),
        RetryPolicy {
            max_attempts: retries + 1,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
        None,
    )
}

/// A small, valid WebVTT document
pub fn sample_vtt() -> &'static str {
    "WEBVTT\n\
     \n\
     1\n\
     00:00.000 --> 00:02.500\n\
     Welcome to the talk.\n\
     \n\
     2\n\
     00:02.500 --> 00:05.000\n\
     Today we discuss transcripts\n\
     and how to summarize them.\n\
     \n\
     3\n\
     00:05.000 --> 00:08.000\n\
     Thank you for listening.\n"
}

/// A small, valid SRT document
pub fn sample_srt() -> &'static str {
    "1\n\
     00:00:00,000 --> 00:00:02,500\n\
     Welcome to the talk.\n\
     \n\
     2\n\
     00:00:02,500 --> 00:00:05,000\n\
     Today we discuss transcripts\n\
     and how to summarize them.\n\
     \n\
     3\n\
     00:00:05,000 --> 00:00:08,000\n\
     Thank you for listening.\n"
}
