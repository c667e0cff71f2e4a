/*!
 * Splits a cue sequence into overlapping, token-budget-bounded windows.
 *
 * Chunks never split inside a cue except when a single cue alone exceeds
 * the whole budget, in which case it is force-split at whitespace
 * boundaries and isolated into its own chunks. Adjacent chunks repeat a
 * configured amount of trailing text so context survives the boundary.
 */

use log::{debug, warn};

use crate::errors::ConfigError;
use crate::token_budget::TokenEstimator;
use crate::transcript_processor::TranscriptCue;

/// One token-budget-bounded window of transcript text
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Position in the chunk sequence; reduction consumes chunks in this order
    pub index: usize,

    /// Window text, source segments joined with a single space
    pub text: String,

    /// Estimated token cost of `text`
    pub token_count: usize,

    /// Inclusive range of source segment indices covered by this window.
    /// For cue input these are cue indices; overlap means ranges may overlap.
    pub source_range: (usize, usize),
}

/// Splits cue sequences and plain text into overlapping windows
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Shared token estimator
    estimator: TokenEstimator,

    /// Maximum estimated tokens per chunk
    chunk_token_budget: usize,

    /// Estimated tokens of trailing text repeated into the next chunk
    overlap_token_budget: usize,
}

impl Chunker {
    /// Create a chunker, validating that the overlap leaves room for
    /// forward progress.
    pub fn new(
        estimator: TokenEstimator,
        chunk_token_budget: usize,
        overlap_token_budget: usize,
    ) -> Result<Self, ConfigError> {
        if chunk_token_budget == 0 {
            return Err(ConfigError::NotPositive {
                name: "chunk_token_budget",
            });
        }
        if chunk_token_budget <= overlap_token_budget {
            return Err(ConfigError::BudgetOverlap {
                chunk: chunk_token_budget,
                overlap: overlap_token_budget,
            });
        }

        Ok(Self {
            estimator,
            chunk_token_budget,
            overlap_token_budget,
        })
    }

    /// Split a cue sequence into chunks. Cue boundaries are chunk-split
    /// boundaries; `source_range` indexes into `cues`.
    pub fn chunk_cues(&self, cues: &[TranscriptCue]) -> Vec<Chunk> {
        let segments: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
        self.chunk_segments(&segments)
    }

    /// Split plain text into chunks, used when re-chunking concatenated
    /// summaries between reduction levels. Sentences act as the segment
    /// unit so windows stay readable.
    pub fn chunk_text(&self, text: &str) -> Vec<Chunk> {
        let sentences = split_sentences(text);
        self.chunk_segments(&sentences)
    }

    /// Core walk: accumulate whole segments until the budget would be
    /// exceeded, close the chunk at the last fitting boundary, seed the next
    /// chunk with trailing segments worth up to the overlap budget.
    fn chunk_segments(&self, segments: &[&str]) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        // (segment index, text) pairs accumulated into the open chunk
        let mut current: Vec<(usize, &str)> = Vec::new();
        let mut current_tokens = 0;

        for (idx, segment) in segments.iter().enumerate() {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let segment_tokens = self.estimator.estimate(segment);

            // A segment that alone exceeds the budget is isolated and
            // force-split rather than dropped.
            if segment_tokens > self.chunk_token_budget {
                if !current.is_empty() {
                    self.close_chunk(&mut chunks, &current);
                }
                warn!(
                    "Segment {} is oversized ({} tokens > {} budget), force-splitting",
                    idx, segment_tokens, self.chunk_token_budget
                );
                for piece in self.split_oversized(segment) {
                    let token_count = self.estimator.estimate(&piece);
                    chunks.push(Chunk {
                        index: chunks.len(),
                        text: piece,
                        token_count,
                        source_range: (idx, idx),
                    });
                }
                current.clear();
                current_tokens = 0;
                continue;
            }

            // Separator costs one token when the chunk already has content
            let added = if current.is_empty() {
                segment_tokens
            } else {
                segment_tokens + 1
            };

            if current_tokens + added > self.chunk_token_budget && !current.is_empty() {
                self.close_chunk(&mut chunks, &current);

                // Seed the next chunk with trailing segments up to the
                // overlap budget
                let (overlap, overlap_tokens) = self.trailing_overlap(&current);
                current = overlap;
                current_tokens = overlap_tokens;

                // Shed leading overlap until the incoming segment fits
                while !current.is_empty()
                    && current_tokens + segment_tokens + 1 > self.chunk_token_budget
                {
                    current.remove(0);
                    current_tokens = self
                        .estimator
                        .estimate_joined(current.iter().map(|(_, text)| *text));
                }
            }

            let added = if current.is_empty() {
                segment_tokens
            } else {
                segment_tokens + 1
            };
            current.push((idx, segment));
            current_tokens += added;
        }

        if !current.is_empty() {
            // Drop a final chunk that only repeats overlap from its
            // predecessor; it carries no new source text.
            let all_overlap = chunks
                .last()
                .is_some_and(|last| current.iter().all(|(idx, _)| *idx <= last.source_range.1));
            if !all_overlap {
                self.close_chunk(&mut chunks, &current);
            }
        }

        debug!("Produced {} chunks from {} segments", chunks.len(), segments.len());
        chunks
    }

    /// Finalize the accumulated segments into a chunk
    fn close_chunk(&self, chunks: &mut Vec<Chunk>, current: &[(usize, &str)]) {
        let texts: Vec<&str> = current.iter().map(|(_, text)| *text).collect();
        let text = texts.join(" ");
        let token_count = self.estimator.estimate(&text);
        chunks.push(Chunk {
            index: chunks.len(),
            text,
            token_count,
            source_range: (current[0].0, current[current.len() - 1].0),
        });
    }

    /// Trailing segments of the just-closed chunk worth up to the overlap
    /// budget, in forward order, with their accumulated token cost
    fn trailing_overlap<'a>(
        &self,
        closed: &[(usize, &'a str)],
    ) -> (Vec<(usize, &'a str)>, usize) {
        let mut overlap: Vec<(usize, &'a str)> = Vec::new();
        let mut tokens = 0;

        for &(idx, text) in closed.iter().rev() {
            let cost = if overlap.is_empty() {
                self.estimator.estimate(text)
            } else {
                self.estimator.estimate(text) + 1
            };
            if tokens + cost > self.overlap_token_budget {
                break;
            }
            overlap.push((idx, text));
            tokens += cost;
        }

        overlap.reverse();
        (overlap, tokens)
    }

    /// Force-split an oversized segment at whitespace boundaries nearest the
    /// budget limit. A single word longer than the whole budget becomes its
    /// own piece; it cannot be split at whitespace.
    fn split_oversized(&self, segment: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for word in segment.split_whitespace() {
            let word_tokens = self.estimator.estimate(word);
            let added = if current.is_empty() {
                word_tokens
            } else {
                word_tokens + 1
            };

            if current_tokens + added > self.chunk_token_budget && !current.is_empty() {
                pieces.push(current.join(" "));
                current.clear();
                current_tokens = 0;
            }

            let added = if current.is_empty() {
                word_tokens
            } else {
                word_tokens + 1
            };
            current.push(word);
            current_tokens += added;
        }

        if !current.is_empty() {
            pieces.push(current.join(" "));
        }

        pieces
    }
}

/// Split text into sentence-ish segments: break after '.', '!' or '?'
/// followed by whitespace. Falls back to the whole text when no boundary
/// exists.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev_terminator = false;

    for (pos, ch) in text.char_indices() {
        if prev_terminator && ch.is_whitespace() {
            let sentence = text[start..pos].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = pos;
        }
        prev_terminator = matches!(ch, '.' | '!' | '?');
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}
