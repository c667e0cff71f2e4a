/*!
 * Token cost estimation for sizing decisions.
 *
 * Every component that sizes text against a model context window goes
 * through the same estimator, so chunking and reduction budgets agree.
 */

/// Approximate characters per token for LLaMA-family models
const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Deterministic token-count approximation.
///
/// Uses a characters-per-token heuristic rather than a real tokenizer: the
/// estimate only has to be consistent and monotonic under concatenation,
/// not exact.
#[derive(Debug, Clone, Copy)]
pub struct TokenEstimator {
    /// Average characters per token
    chars_per_token: usize,
}

impl TokenEstimator {
    /// Create an estimator with a custom chars-per-token ratio.
    /// A ratio of zero is clamped to one.
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }

    /// Estimate the token cost of a text span.
    pub fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }

    /// Estimate the cost of joining `parts` with a one-character separator.
    ///
    /// Counts each part's estimate plus one token per separator, which is an
    /// upper bound on `estimate` of the joined text. The chunker accumulates
    /// with this so a closed chunk never exceeds its budget.
    pub fn estimate_joined<'a, I>(&self, parts: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut total = 0;
        let mut first = true;
        for part in parts {
            if !first {
                total += 1;
            }
            total += self.estimate(part);
            first = false;
        }
        total
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_CHARS_PER_TOKEN)
    }
}
