//! Sentence and word segmentation plus stopword filtering.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

/// Splits a document into trimmed, non-empty sentences, verbatim otherwise.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Lowercased word tokens of a sentence, punctuation dropped.
pub fn words(sentence: &str) -> Vec<String> {
    sentence
        .unicode_words()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Filter wrapping a stopword set for one language.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    stopwords: HashSet<String>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl StopwordFilter {
    pub fn english() -> Self {
        let stopwords = get(LANGUAGE::English).into_iter().collect();
        Self { stopwords }
    }

    pub fn from_list(words: &[&str]) -> Self {
        Self {
            stopwords: words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// A word that should become a graph node: alphabetic and not a
    /// stopword.
    pub fn is_content_word(&self, word: &str) -> bool {
        !self.is_stopword(word) && word.chars().any(char::is_alphabetic)
    }
}
