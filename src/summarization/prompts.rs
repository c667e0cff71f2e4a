/*!
 * Prompt templates for transcript summarization.
 *
 * Two templates drive the whole pipeline: one for summarizing a single
 * transcript window, one for reducing a set of summaries into a higher-level
 * summary. The reduction template's own token cost counts against the
 * reduction budget, so it is measurable.
 */

use crate::token_budget::TokenEstimator;

/// A prompt template with named placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Template for summarizing one transcript window
    pub const CHUNK_SUMMARY: &'static str = r#"You are an expert at summarizing transcript content. Provide a concise but comprehensive summary of the following transcript segment.

This is segment {chunk_number} of {chunk_total} from a larger transcript.

Requirements:
- Capture the main topics and key points discussed
- Preserve important details, names, and specific information
- Maintain the chronological flow of information
- Use clear, professional language

Transcript segment:
{chunk_text}

Summary:"#;

    /// Template for reducing several summaries into one
    pub const REDUCTION: &'static str = r#"You are an expert at creating cohesive summaries from multiple related text segments. Below are summaries of different parts of a transcript. Create a final summary that:

1. Integrates all the key information from the segments
2. Maintains logical flow and structure
3. Eliminates redundancy while preserving important details
4. Provides a clear overview of the main topics and conclusions

Segment summaries:
{summaries}

Final summary:"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default chunk summary template.
    pub fn chunk_summary() -> Self {
        Self::new(Self::CHUNK_SUMMARY)
    }

    /// Create the default reduction template.
    pub fn reduction() -> Self {
        Self::new(Self::REDUCTION)
    }

    /// Render the template with the given variables.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let mut rendered = self.template.clone();
        for (name, value) in vars {
            rendered = rendered.replace(&format!("{{{}}}", name), value);
        }
        rendered
    }

    /// Token cost of the template text itself, with placeholders emptied.
    /// Sizing decisions add this overhead on top of the content cost.
    pub fn overhead_tokens(&self, estimator: &TokenEstimator) -> usize {
        let empty = self.render(&[
            ("chunk_number", ""),
            ("chunk_total", ""),
            ("chunk_text", ""),
            ("summaries", ""),
        ]);
        estimator.estimate(&empty)
    }
}

/// The template pair used by one summarization job
#[derive(Debug, Clone)]
pub struct PromptSet {
    /// Per-window summary prompt
    pub chunk: PromptTemplate,
    /// Summary-of-summaries prompt
    pub reduction: PromptTemplate,
}

impl PromptSet {
    /// Render the prompt for one transcript window
    pub fn render_chunk(&self, chunk_number: usize, chunk_total: usize, text: &str) -> String {
        self.chunk.render(&[
            ("chunk_number", &chunk_number.to_string()),
            ("chunk_total", &chunk_total.to_string()),
            ("chunk_text", text),
        ])
    }

    /// Render the reduction prompt over joined summaries
    pub fn render_reduction(&self, summaries: &str) -> String {
        self.reduction.render(&[("summaries", summaries)])
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            chunk: PromptTemplate::chunk_summary(),
            reduction: PromptTemplate::reduction(),
        }
    }
}
