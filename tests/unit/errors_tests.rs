/*!
 * Unit tests for the error taxonomy, in particular the
 * transient/non-transient classification driving retry decisions.
 */

use std::time::Duration;

use yatsai::errors::{ProviderError, SummarizeError, TranscriptError};

#[test]
fn test_timeouts_and_connection_errors_should_be_transient() {
    assert!(ProviderError::Timeout(Duration::from_secs(30)).is_transient());
    assert!(ProviderError::ConnectionError("reset".into()).is_transient());
    assert!(ProviderError::RateLimitExceeded("429".into()).is_transient());
    assert!(ProviderError::RequestFailed("broken pipe".into()).is_transient());
}

#[test]
fn test_server_errors_should_be_transient() {
    let err = ProviderError::ApiError {
        status_code: 503,
        message: "overloaded".into(),
    };
    assert!(err.is_transient());
}

#[test]
fn test_client_errors_should_not_be_transient() {
    let err = ProviderError::ApiError {
        status_code: 400,
        message: "bad request".into(),
    };
    assert!(!err.is_transient());
    assert!(!ProviderError::AuthenticationError("bad key".into()).is_transient());
    assert!(!ProviderError::ModelNotFound("nope".into()).is_transient());
    assert!(!ProviderError::ParseError("garbage".into()).is_transient());
}

#[test]
fn test_cancellation_should_be_distinguishable() {
    assert!(SummarizeError::Cancelled.is_cancellation());
    assert!(
        !SummarizeError::InferenceUnavailable {
            attempts: 3,
            source: ProviderError::ConnectionError("down".into()),
        }
        .is_cancellation()
    );
}

#[test]
fn test_inference_unavailable_should_carry_attempt_count() {
    let err = SummarizeError::InferenceUnavailable {
        attempts: 4,
        source: ProviderError::Timeout(Duration::from_secs(30)),
    };
    let message = err.to_string();
    assert!(message.contains("4 attempts"));
}

#[test]
fn test_transcript_errors_should_name_the_location() {
    let err = TranscriptError::InvalidTimestamp {
        line: 12,
        text: "00:99 --> banana".into(),
    };
    let message = err.to_string();
    assert!(message.contains("line 12"));
    assert!(message.contains("banana"));
}

#[test]
fn test_summarize_error_should_wrap_transcript_error() {
    let err: SummarizeError = TranscriptError::Empty.into();
    assert!(matches!(err, SummarizeError::Transcript(_)));
}
