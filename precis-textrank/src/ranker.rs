//! Phrase ranking and sentence selection.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    graph::{GraphBuilder, PageRank},
    text::{split_sentences, words, StopwordFilter},
    types::{ExtractError, ExtractiveSummary, RankedPhrase},
};

/// The parser-plus-ranker capability. Implementations take raw text and
/// return top sentences (verbatim, document order) with ranked phrases.
pub trait PhraseRanker {
    fn summarize(
        &self,
        text: &str,
        limit_phrases: usize,
        limit_sentences: usize,
    ) -> Result<ExtractiveSummary, ExtractError>;
}

/// Default ranker: content words co-occurring within a window form a
/// weighted graph, PageRank scores the words, and adjacent content words
/// merge into phrases scored by their members.
#[derive(Debug, Clone)]
pub struct TextRankRanker {
    window: usize,
    max_phrase_words: usize,
    pagerank: PageRank,
    stopwords: StopwordFilter,
}

impl Default for TextRankRanker {
    fn default() -> Self {
        Self {
            window: 4,
            max_phrase_words: 3,
            pagerank: PageRank::default(),
            stopwords: StopwordFilter::default(),
        }
    }
}

impl TextRankRanker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(2);
        self
    }

    pub fn with_pagerank(mut self, pagerank: PageRank) -> Self {
        self.pagerank = pagerank;
        self
    }

    pub fn with_stopwords(mut self, stopwords: StopwordFilter) -> Self {
        self.stopwords = stopwords;
        self
    }

    /// PageRank scores for every content word of the document.
    fn rank_words(&self, sentence_words: &[Vec<String>]) -> HashMap<String, f64> {
        let mut builder = GraphBuilder::new();
        for tokens in sentence_words {
            let content: Vec<usize> = tokens
                .iter()
                .filter(|w| self.stopwords.is_content_word(w))
                .map(|w| builder.get_or_create_node(w))
                .collect();

            for (i, &a) in content.iter().enumerate() {
                for &b in content.iter().skip(i + 1).take(self.window - 1) {
                    builder.increment_edge(a, b, 1.0);
                }
            }
        }

        let graph = builder.build();
        let result = self.pagerank.run(&graph);
        debug!(
            nodes = graph.node_count(),
            iterations = result.iterations,
            converged = result.converged,
            "ranked content words"
        );

        (0..graph.node_count())
            .map(|node| (graph.label(node).to_string(), result.scores[node]))
            .collect()
    }

    /// Merges adjacent content words into phrases, remembering which
    /// sentences each phrase occurs in.
    fn collect_phrases(
        &self,
        sentence_words: &[Vec<String>],
        word_scores: &HashMap<String, f64>,
    ) -> (Vec<RankedPhrase>, HashMap<String, HashSet<usize>>) {
        let mut occurrences: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut scores: HashMap<String, f64> = HashMap::new();

        for (sentence_index, tokens) in sentence_words.iter().enumerate() {
            let mut run: Vec<&str> = Vec::new();
            for token in tokens.iter().map(String::as_str).chain(std::iter::once("")) {
                if self.stopwords.is_content_word(token) {
                    run.push(token);
                    continue;
                }
                for chunk in run.chunks(self.max_phrase_words) {
                    let text = chunk.join(" ");
                    let score: f64 = chunk
                        .iter()
                        .map(|w| word_scores.get(*w).copied().unwrap_or(0.0))
                        .sum();
                    occurrences.entry(text.clone()).or_default().insert(sentence_index);
                    scores.entry(text).or_insert(score);
                }
                run.clear();
            }
        }

        let mut phrases: Vec<RankedPhrase> = scores
            .into_iter()
            .map(|(text, score)| RankedPhrase { text, score })
            .collect();
        phrases.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.text.cmp(&b.text))
        });

        (phrases, occurrences)
    }
}

impl PhraseRanker for TextRankRanker {
    /// The top `limit_phrases` phrases vote for the sentences containing
    /// them; the `limit_sentences` best sentences are returned verbatim in
    /// document order, with the full descending phrase ranking alongside.
    fn summarize(
        &self,
        text: &str,
        limit_phrases: usize,
        limit_sentences: usize,
    ) -> Result<ExtractiveSummary, ExtractError> {
        if limit_phrases == 0 {
            return Err(ExtractError::ZeroLimit("limit_phrases"));
        }
        if limit_sentences == 0 {
            return Err(ExtractError::ZeroLimit("limit_sentences"));
        }

        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Err(ExtractError::EmptyDocument);
        }

        let sentence_words: Vec<Vec<String>> =
            sentences.iter().map(|s| words(s)).collect();
        let word_scores = self.rank_words(&sentence_words);
        let (phrases, occurrences) = self.collect_phrases(&sentence_words, &word_scores);

        let mut sentence_scores = vec![0.0; sentences.len()];
        for phrase in phrases.iter().take(limit_phrases) {
            if let Some(indices) = occurrences.get(&phrase.text) {
                for &index in indices {
                    sentence_scores[index] += phrase.score;
                }
            }
        }

        let mut order: Vec<usize> = (0..sentences.len()).collect();
        order.sort_by(|&a, &b| {
            sentence_scores[b]
                .partial_cmp(&sentence_scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });
        let mut selected: Vec<usize> = order.into_iter().take(limit_sentences).collect();
        selected.sort_unstable();

        debug!(
            sentences = sentences.len(),
            selected = selected.len(),
            phrases = phrases.len(),
            "extractive summary assembled"
        );

        Ok(ExtractiveSummary {
            sentences: selected.into_iter().map(|i| sentences[i].clone()).collect(),
            phrases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_SENTENCES: &str = "Graph ranking drives the summary construction. \
        The ranking formula weights every graph edge. \
        Weighted edges connect related candidate phrases. \
        A cat sat quietly on the mat. \
        The final summary keeps the highest ranking sentences.";

    #[test]
    fn test_limit_sentences_is_honored_exactly() {
        let summary = TextRankRanker::default()
            .summarize(FIVE_SENTENCES, 3, 2)
            .unwrap();
        assert_eq!(summary.sentences.len(), 2);
    }

    #[test]
    fn test_selected_sentences_are_verbatim() {
        let summary = TextRankRanker::default()
            .summarize(FIVE_SENTENCES, 3, 2)
            .unwrap();
        let originals = split_sentences(FIVE_SENTENCES);
        for sentence in &summary.sentences {
            assert!(originals.contains(sentence), "not verbatim: {sentence}");
        }
    }

    #[test]
    fn test_sentences_come_back_in_document_order() {
        let summary = TextRankRanker::default()
            .summarize(FIVE_SENTENCES, 3, 3)
            .unwrap();
        let originals = split_sentences(FIVE_SENTENCES);
        let positions: Vec<usize> = summary
            .sentences
            .iter()
            .map(|s| originals.iter().position(|o| o == s).unwrap())
            .collect();
        for pair in positions.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_phrases_sorted_by_descending_score() {
        let summary = TextRankRanker::default()
            .summarize(FIVE_SENTENCES, 3, 2)
            .unwrap();
        assert!(!summary.phrases.is_empty());
        for pair in summary.phrases.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_recurring_term_dominates_ranking() {
        let text = "Ranking signals guide the extraction step. \
            Ranking scores order the candidate phrases. \
            Strong ranking beats weak heuristics. \
            Bananas are yellow.";
        let summary = TextRankRanker::default().summarize(text, 3, 1).unwrap();
        assert!(summary.phrases[0].text.contains("ranking"));
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let err = TextRankRanker::default().summarize("   ", 3, 2).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        let ranker = TextRankRanker::default();
        assert!(matches!(
            ranker.summarize("Some text.", 0, 2),
            Err(ExtractError::ZeroLimit("limit_phrases"))
        ));
        assert!(matches!(
            ranker.summarize("Some text.", 3, 0),
            Err(ExtractError::ZeroLimit("limit_sentences"))
        ));
    }

    #[test]
    fn test_stopword_only_document_still_selects_sentences() {
        let ranker = TextRankRanker::default().with_stopwords(StopwordFilter::from_list(&[
            "it", "is", "what", "was", "and", "so", "does",
        ]));
        let summary = ranker
            .summarize("It is what it was. And so it does.", 3, 1)
            .unwrap();
        assert_eq!(summary.sentences.len(), 1);
        assert_eq!(summary.sentences[0], "It is what it was.");
    }

    #[test]
    fn test_fewer_sentences_than_limit_returns_all() {
        let summary = TextRankRanker::default()
            .summarize("Only one sentence here.", 3, 5)
            .unwrap();
        assert_eq!(summary.sentences.len(), 1);
    }
}
