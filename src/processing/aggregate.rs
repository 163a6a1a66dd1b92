//! Merging of per-chunk summaries.

use super::types::count_words;

/// Space-joined chunk summaries together with their word count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSummary {
    /// Chunk summaries joined by single spaces, in chunk order.
    pub text: String,
    /// Number of words in `text`.
    pub word_count: usize,
}

/// Outcome of merging chunk summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregation {
    /// The merged summary fits the word budget and can be returned.
    Final(AggregatedSummary),
    /// The merged summary is too long and must go through another pass.
    NeedsResummarization(AggregatedSummary),
}

impl Aggregation {
    /// Borrow the merged summary regardless of the outcome.
    pub fn summary(&self) -> &AggregatedSummary {
        match self {
            Self::Final(summary) | Self::NeedsResummarization(summary) => summary,
        }
    }
}

/// Join `summaries` in order and decide whether the result fits within `max_words`.
///
/// The aggregator never summarizes on its own; an over-budget join is handed back so the
/// orchestrator can run it through chunking and summarization again.
pub fn aggregate<S: AsRef<str>>(summaries: &[S], max_words: usize) -> Aggregation {
    let text = summaries
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ");
    let word_count = count_words(&text);
    let summary = AggregatedSummary { text, word_count };

    if word_count <= max_words {
        Aggregation::Final(summary)
    } else {
        Aggregation::NeedsResummarization(summary)
    }
}
