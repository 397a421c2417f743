//! Extractive summarization through graph-based phrase ranking.
//!
//! Sentences are segmented, content words become nodes of a co-occurrence
//! graph, and a PageRank pass scores them. Adjacent content words merge into
//! ranked phrases; the top phrases then vote for the sentences that carry
//! them. The ranker sits behind [`PhraseRanker`] so a different ranking
//! capability can be swapped in without touching callers.

pub mod graph;
pub mod ranker;
pub mod text;
pub mod types;

pub use ranker::{PhraseRanker, TextRankRanker};
pub use types::{ExtractError, ExtractiveSummary, RankedPhrase};

/// Summarize with the default ranker.
pub fn summarize_extractive(
    text: &str,
    limit_phrases: usize,
    limit_sentences: usize,
) -> Result<ExtractiveSummary, ExtractError> {
    TextRankRanker::default().summarize(text, limit_phrases, limit_sentences)
}
