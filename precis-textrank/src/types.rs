use thiserror::Error;

/// A phrase with its importance score.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedPhrase {
    pub text: String,
    pub score: f64,
}

/// Sentences in document order plus phrases in descending score order.
#[derive(Clone, Debug)]
pub struct ExtractiveSummary {
    pub sentences: Vec<String>,
    pub phrases: Vec<RankedPhrase>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document contains no sentences")]
    EmptyDocument,
    #[error("`{0}` must be at least 1")]
    ZeroLimit(&'static str),
}
