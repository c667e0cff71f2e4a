use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::TranscriptError;

// @module: Transcript parsing and cue handling

// @const: SRT timestamp regex (tolerates '.' as millisecond separator)
static SRT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})")
        .unwrap()
});

// @const: WebVTT timestamp regex (hours optional, settings may follow)
static VTT_TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(?:(\d{1,2}):)?(\d{2}):(\d{2})\.(\d{3})",
    )
    .unwrap()
});

/// Supported transcript document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    /// WebVTT (.vtt)
    Vtt,
    /// SubRip (.srt)
    Srt,
}

impl TranscriptFormat {
    /// Guess the format from a file extension, if recognizable
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("vtt") => Some(Self::Vtt),
            Some(ext) if ext.eq_ignore_ascii_case("srt") => Some(Self::Srt),
            _ => None,
        }
    }

    /// Sniff the format from document content
    pub fn sniff(content: &str) -> Self {
        let head = content.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            Self::Vtt
        } else {
            Self::Srt
        }
    }
}

/// What to do with cues whose start times regress relative to document order.
///
/// File order is normally authoritative, but some producers emit unordered
/// cues; callers choose whether those are normalized, re-sorted, or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuePolicy {
    /// Keep cues in the order they appear in the file (default)
    #[default]
    DocumentOrder,
    /// Stable-sort cues by start time
    SortByStart,
    /// Fail parsing when a cue starts before its predecessor
    Reject,
}

// @struct: Single timed cue
#[derive(Debug, Clone)]
pub struct TranscriptCue {
    // @field: Sequence number (1-based, document order)
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Cue text, multi-line bodies joined with a single space
    pub text: String,
}

impl TranscriptCue {
    /// Creates a new cue - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        TranscriptCue {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(
        seq_num: usize,
        start_time_ms: u64,
        end_time_ms: u64,
        text: String,
    ) -> Result<Self, String> {
        if end_time_ms <= start_time_ms {
            return Err(format!(
                "invalid time range: end time {} <= start time {}",
                end_time_ms, start_time_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(format!("empty cue text for cue {}", seq_num));
        }

        Ok(TranscriptCue {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for TranscriptCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{} --> {}] {}",
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms),
            self.text
        )
    }
}

/// An ordered collection of cues parsed from one transcript document
#[derive(Debug)]
pub struct TranscriptCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// Parsed cues, ordered per the active cue policy
    pub cues: Vec<TranscriptCue>,

    /// Detected document format
    pub format: TranscriptFormat,
}

impl TranscriptCollection {
    /// Read and parse a transcript file.
    ///
    /// The format is taken from the file extension when recognizable and
    /// sniffed from the content otherwise. Invalid UTF-8 is a parse error,
    /// not a lossy decode.
    pub fn from_file<P: AsRef<Path>>(path: P, policy: CuePolicy) -> Result<Self, TranscriptError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let content = String::from_utf8(bytes)
            .map_err(|e| TranscriptError::InvalidEncoding(e.to_string()))?;

        let format = TranscriptFormat::from_extension(path)
            .unwrap_or_else(|| TranscriptFormat::sniff(&content));

        let cues = Self::parse_string(&content, format, policy)?;
        debug!(
            "Parsed {} cues from {} ({:?})",
            cues.len(),
            path.display(),
            format
        );

        Ok(TranscriptCollection {
            source_file: path.to_path_buf(),
            cues,
            format,
        })
    }

    /// Parse transcript content that is already in memory - used by tests
    /// and external consumers
    #[allow(dead_code)]
    pub fn from_string(
        content: &str,
        format: TranscriptFormat,
        policy: CuePolicy,
    ) -> Result<Self, TranscriptError> {
        let cues = Self::parse_string(content, format, policy)?;
        Ok(TranscriptCollection {
            source_file: PathBuf::new(),
            cues,
            format,
        })
    }

    /// The full transcript text: cue texts joined with a single space -
    /// used by tests and external consumers
    #[allow(dead_code)]
    pub fn full_text(&self) -> String {
        let texts: Vec<&str> = self.cues.iter().map(|c| c.text.as_str()).collect();
        texts.join(" ")
    }

    /// Parse a transcript string in the given format and apply the cue policy
    pub fn parse_string(
        content: &str,
        format: TranscriptFormat,
        policy: CuePolicy,
    ) -> Result<Vec<TranscriptCue>, TranscriptError> {
        let content = content.trim_start_matches('\u{feff}');
        if content.trim().is_empty() {
            return Err(TranscriptError::Empty);
        }

        let cues = match format {
            TranscriptFormat::Vtt => Self::parse_vtt_string(content)?,
            TranscriptFormat::Srt => Self::parse_srt_string(content)?,
        };

        if cues.is_empty() {
            return Err(TranscriptError::NoCues);
        }

        Self::apply_policy(cues, policy)
    }

    /// Parse WebVTT content into cues.
    ///
    /// Tolerates a missing WEBVTT header, cue identifiers, cue settings after
    /// the timestamp line, and NOTE/STYLE/REGION blocks (skipped).
    pub fn parse_vtt_string(content: &str) -> Result<Vec<TranscriptCue>, TranscriptError> {
        let content = content.trim_start_matches('\u{feff}');
        let mut cues = Vec::new();
        let mut seq_num = 1;

        for block in Self::split_blocks(content) {
            let (first_line_no, first) = block[0];

            // Non-cue blocks
            if first.starts_with("NOTE")
                || first.starts_with("STYLE")
                || first.starts_with("REGION")
            {
                continue;
            }

            // Header block; a header with a cue attached (no blank line
            // after WEBVTT) still gets parsed below
            if first.starts_with("WEBVTT") && !block.iter().any(|(_, line)| line.contains("-->")) {
                continue;
            }

            // Locate the timestamp line; anything before it is a cue identifier
            let Some(ts_pos) = block.iter().position(|(_, line)| line.contains("-->")) else {
                warn!(
                    "Skipping block at line {} with no timestamp line: {}",
                    first_line_no, first
                );
                continue;
            };

            let (ts_line_no, ts_line) = block[ts_pos];
            let caps = VTT_TIMESTAMP_REGEX.captures(ts_line).ok_or_else(|| {
                TranscriptError::InvalidTimestamp {
                    line: ts_line_no,
                    text: ts_line.to_string(),
                }
            })?;

            let start_ms = Self::vtt_caps_to_ms(&caps, 1);
            let end_ms = Self::vtt_caps_to_ms(&caps, 5);

            let body = Self::join_body(&block[ts_pos + 1..]);
            match TranscriptCue::new_validated(seq_num, start_ms, end_ms, body) {
                Ok(cue) => {
                    cues.push(cue);
                    seq_num += 1;
                }
                Err(e) => warn!("Skipping invalid cue at line {}: {}", ts_line_no, e),
            }
        }

        Ok(cues)
    }

    /// Parse SubRip content into cues.
    ///
    /// Tolerates missing sequence numbers and '.' in place of ',' before the
    /// milliseconds field.
    pub fn parse_srt_string(content: &str) -> Result<Vec<TranscriptCue>, TranscriptError> {
        let content = content.trim_start_matches('\u{feff}');
        let mut cues = Vec::new();
        let mut seq_num = 1;

        for block in Self::split_blocks(content) {
            let (first_line_no, first) = block[0];

            let Some(ts_pos) = block.iter().position(|(_, line)| line.contains("-->")) else {
                warn!(
                    "Skipping block at line {} with no timestamp line: {}",
                    first_line_no, first
                );
                continue;
            };

            let (ts_line_no, ts_line) = block[ts_pos];
            let caps = SRT_TIMESTAMP_REGEX.captures(ts_line).ok_or_else(|| {
                TranscriptError::InvalidTimestamp {
                    line: ts_line_no,
                    text: ts_line.to_string(),
                }
            })?;

            let start_ms = Self::srt_caps_to_ms(&caps, 1);
            let end_ms = Self::srt_caps_to_ms(&caps, 5);

            let body = Self::join_body(&block[ts_pos + 1..]);
            match TranscriptCue::new_validated(seq_num, start_ms, end_ms, body) {
                Ok(cue) => {
                    cues.push(cue);
                    seq_num += 1;
                }
                Err(e) => warn!("Skipping invalid cue at line {}: {}", ts_line_no, e),
            }
        }

        Ok(cues)
    }

    /// Split content into blank-line-separated blocks, keeping 1-based line numbers
    fn split_blocks(content: &str) -> Vec<Vec<(usize, &str)>> {
        let mut blocks = Vec::new();
        let mut current: Vec<(usize, &str)> = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                if !current.is_empty() {
                    blocks.push(std::mem::take(&mut current));
                }
            } else {
                current.push((idx + 1, trimmed));
            }
        }
        if !current.is_empty() {
            blocks.push(current);
        }

        blocks
    }

    /// Join cue body lines with a single space
    fn join_body(lines: &[(usize, &str)]) -> String {
        let texts: Vec<&str> = lines.iter().map(|(_, line)| *line).collect();
        texts.join(" ")
    }

    /// Convert VTT regex captures starting at `base` into milliseconds.
    /// The hours group is optional.
    fn vtt_caps_to_ms(caps: &regex::Captures, base: usize) -> u64 {
        let hours: u64 = caps
            .get(base)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        let minutes: u64 = caps[base + 1].parse().unwrap_or(0);
        let seconds: u64 = caps[base + 2].parse().unwrap_or(0);
        let millis: u64 = caps[base + 3].parse().unwrap_or(0);

        hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis
    }

    /// Convert SRT regex captures starting at `base` into milliseconds
    fn srt_caps_to_ms(caps: &regex::Captures, base: usize) -> u64 {
        let hours: u64 = caps[base].parse().unwrap_or(0);
        let minutes: u64 = caps[base + 1].parse().unwrap_or(0);
        let seconds: u64 = caps[base + 2].parse().unwrap_or(0);
        let millis: u64 = caps[base + 3].parse().unwrap_or(0);

        hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis
    }

    /// Apply the cue ordering policy to freshly parsed cues
    fn apply_policy(
        mut cues: Vec<TranscriptCue>,
        policy: CuePolicy,
    ) -> Result<Vec<TranscriptCue>, TranscriptError> {
        match policy {
            CuePolicy::DocumentOrder => {}
            CuePolicy::SortByStart => {
                cues.sort_by_key(|c| (c.start_time_ms, c.end_time_ms));
            }
            CuePolicy::Reject => {
                let mut last_start = 0;
                for cue in &cues {
                    if cue.start_time_ms < last_start {
                        return Err(TranscriptError::OutOfOrder {
                            seq_num: cue.seq_num,
                        });
                    }
                    last_start = cue.start_time_ms;
                }
            }
        }
        Ok(cues)
    }
}
