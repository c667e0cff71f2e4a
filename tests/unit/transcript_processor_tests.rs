/*!
 * Unit tests for transcript parsing: WebVTT and SRT documents, tolerance
 * for messy-but-valid input, and the cue ordering policies.
 */

use std::io::Write;

use yatsai::errors::TranscriptError;
use yatsai::transcript_processor::{
    CuePolicy, TranscriptCollection, TranscriptCue, TranscriptFormat,
};

use crate::common::{sample_srt, sample_vtt};

fn parse_vtt(content: &str) -> Result<Vec<TranscriptCue>, TranscriptError> {
    TranscriptCollection::parse_string(content, TranscriptFormat::Vtt, CuePolicy::DocumentOrder)
}

fn parse_srt(content: &str) -> Result<Vec<TranscriptCue>, TranscriptError> {
    TranscriptCollection::parse_string(content, TranscriptFormat::Srt, CuePolicy::DocumentOrder)
}

#[test]
fn test_parse_vtt_should_extract_all_cues() {
    let cues = parse_vtt(sample_vtt()).unwrap();
    assert_eq!(cues.len(), 3);
    assert_eq!(cues[0].text, "Welcome to the talk.");
    assert_eq!(cues[0].start_time_ms, 0);
    assert_eq!(cues[0].end_time_ms, 2500);
}

#[test]
fn test_parse_vtt_should_join_multiline_bodies_with_space() {
    let cues = parse_vtt(sample_vtt()).unwrap();
    assert_eq!(
        cues[1].text,
        "Today we discuss transcripts and how to summarize them."
    );
}

#[test]
fn test_parse_vtt_should_tolerate_bom_and_header() {
    let content = format!("\u{feff}{}", sample_vtt());
    let cues = parse_vtt(&content).unwrap();
    assert_eq!(cues.len(), 3);
}

#[test]
fn test_parse_vtt_should_skip_note_and_style_blocks() {
    let content = "WEBVTT\n\
                   \n\
                   NOTE\n\
                   This is a comment about the file\n\
                   \n\
                   STYLE\n\
                   ::cue { color: red }\n\
                   \n\
                   00:01.000 --> 00:03.000\n\
                   Actual dialogue here.\n";
    let cues = parse_vtt(content).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Actual dialogue here.");
}

#[test]
fn test_parse_vtt_should_accept_cue_identifiers_and_settings() {
    let content = "WEBVTT\n\
                   \n\
                   intro-cue\n\
                   00:00:01.000 --> 00:00:03.000 align:start position:10%\n\
                   Hello there.\n";
    let cues = parse_vtt(content).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_time_ms, 1000);
    assert_eq!(cues[0].text, "Hello there.");
}

#[test]
fn test_parse_vtt_should_accept_hourless_timestamps() {
    let content = "WEBVTT\n\n01:02.500 --> 01:04.000\nShort form.\n";
    let cues = parse_vtt(content).unwrap();
    assert_eq!(cues[0].start_time_ms, 62_500);
    assert_eq!(cues[0].end_time_ms, 64_000);
}

#[test]
fn test_parse_empty_content_should_fail() {
    assert!(matches!(parse_vtt(""), Err(TranscriptError::Empty)));
    assert!(matches!(parse_vtt("   \n  \n"), Err(TranscriptError::Empty)));
}

#[test]
fn test_parse_content_without_cues_should_fail() {
    let content = "WEBVTT\n\nNOTE\nnothing but comments here\n";
    assert!(matches!(parse_vtt(content), Err(TranscriptError::NoCues)));
}

#[test]
fn test_parse_unparseable_timestamp_should_fail_with_line() {
    let content = "WEBVTT\n\n00:xx.000 --> 00:03.000\nBroken.\n";
    match parse_vtt(content) {
        Err(TranscriptError::InvalidTimestamp { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected InvalidTimestamp, got {:?}", other),
    }
}

#[test]
fn test_parse_srt_should_extract_all_cues() {
    let cues = parse_srt(sample_srt()).unwrap();
    assert_eq!(cues.len(), 3);
    assert_eq!(cues[2].text, "Thank you for listening.");
    assert_eq!(cues[2].start_time_ms, 5000);
}

#[test]
fn test_parse_srt_should_tolerate_dot_millisecond_separator() {
    let content = "1\n00:00:01.000 --> 00:00:02.000\nDotted timestamps.\n";
    let cues = parse_srt(content).unwrap();
    assert_eq!(cues[0].start_time_ms, 1000);
}

#[test]
fn test_parse_srt_should_skip_cues_with_invalid_time_range() {
    // Second cue ends before it starts and is dropped, not fatal
    let content = "1\n\
                   00:00:01,000 --> 00:00:02,000\n\
                   Good cue.\n\
                   \n\
                   2\n\
                   00:00:05,000 --> 00:00:04,000\n\
                   Backwards cue.\n";
    let cues = parse_srt(content).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Good cue.");
}

#[test]
fn test_document_order_policy_should_keep_unordered_cues() {
    let content = "WEBVTT\n\
                   \n\
                   00:10.000 --> 00:12.000\n\
                   Second in time, first in file.\n\
                   \n\
                   00:01.000 --> 00:03.000\n\
                   First in time, second in file.\n";
    let cues = parse_vtt(content).unwrap();
    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].start_time_ms, 10_000);
}

#[test]
fn test_sort_by_start_policy_should_reorder_cues() {
    let content = "WEBVTT\n\
                   \n\
                   00:10.000 --> 00:12.000\n\
                   Later cue.\n\
                   \n\
                   00:01.000 --> 00:03.000\n\
                   Earlier cue.\n";
    let cues =
        TranscriptCollection::parse_string(content, TranscriptFormat::Vtt, CuePolicy::SortByStart)
            .unwrap();
    assert_eq!(cues[0].start_time_ms, 1000);
    assert_eq!(cues[1].start_time_ms, 10_000);
}

#[test]
fn test_reject_policy_should_fail_on_unordered_cues() {
    let content = "WEBVTT\n\
                   \n\
                   00:10.000 --> 00:12.000\n\
                   Later cue.\n\
                   \n\
                   00:01.000 --> 00:03.000\n\
                   Earlier cue.\n";
    let result =
        TranscriptCollection::parse_string(content, TranscriptFormat::Vtt, CuePolicy::Reject);
    assert!(matches!(result, Err(TranscriptError::OutOfOrder { .. })));
}

#[test]
fn test_reject_policy_should_accept_ordered_cues() {
    let cues =
        TranscriptCollection::parse_string(sample_vtt(), TranscriptFormat::Vtt, CuePolicy::Reject)
            .unwrap();
    assert_eq!(cues.len(), 3);
}

#[test]
fn test_overlapping_cues_should_be_tolerated() {
    // Overlap in time is normal in real transcripts
    let content = "WEBVTT\n\
                   \n\
                   00:01.000 --> 00:05.000\n\
                   Speaker one talks.\n\
                   \n\
                   00:03.000 --> 00:06.000\n\
                   Speaker two interrupts.\n";
    let cues =
        TranscriptCollection::parse_string(content, TranscriptFormat::Vtt, CuePolicy::Reject)
            .unwrap();
    assert_eq!(cues.len(), 2);
}

#[test]
fn test_full_text_should_join_cues_with_spaces() {
    let collection = TranscriptCollection::from_string(
        sample_vtt(),
        TranscriptFormat::Vtt,
        CuePolicy::DocumentOrder,
    )
    .unwrap();
    let text = collection.full_text();
    assert!(text.starts_with("Welcome to the talk."));
    assert!(text.ends_with("Thank you for listening."));
    assert!(!text.contains('\n'));
}

#[test]
fn test_format_detection_should_use_extension_then_content() {
    use std::path::Path;
    assert_eq!(
        TranscriptFormat::from_extension(Path::new("talk.vtt")),
        Some(TranscriptFormat::Vtt)
    );
    assert_eq!(
        TranscriptFormat::from_extension(Path::new("talk.SRT")),
        Some(TranscriptFormat::Srt)
    );
    assert_eq!(TranscriptFormat::from_extension(Path::new("talk.txt")), None);

    assert_eq!(TranscriptFormat::sniff("WEBVTT\n"), TranscriptFormat::Vtt);
    assert_eq!(
        TranscriptFormat::sniff("1\n00:00:01,000 --> 00:00:02,000\nHi\n"),
        TranscriptFormat::Srt
    );
}

#[test]
fn test_from_file_should_parse_a_written_transcript() {
    let mut file = tempfile::Builder::new().suffix(".vtt").tempfile().unwrap();
    write!(file, "{}", sample_vtt()).unwrap();

    let collection =
        TranscriptCollection::from_file(file.path(), CuePolicy::DocumentOrder).unwrap();
    assert_eq!(collection.format, TranscriptFormat::Vtt);
    assert_eq!(collection.cues.len(), 3);
}

#[test]
fn test_from_file_should_reject_invalid_utf8() {
    let mut file = tempfile::Builder::new().suffix(".vtt").tempfile().unwrap();
    file.write_all(&[0x57, 0x45, 0x42, 0xff, 0xfe, 0x00]).unwrap();

    let result = TranscriptCollection::from_file(file.path(), CuePolicy::DocumentOrder);
    assert!(matches!(result, Err(TranscriptError::InvalidEncoding(_))));
}

#[test]
fn test_from_file_should_report_missing_file() {
    let result =
        TranscriptCollection::from_file("/nonexistent/talk.vtt", CuePolicy::DocumentOrder);
    assert!(matches!(result, Err(TranscriptError::Io(_))));
}
