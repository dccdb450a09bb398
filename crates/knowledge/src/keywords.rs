//! Question to search-term extraction.

use crate::types::SearchTerm;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

/// Maps a question to the terms used by the lexical search.
///
/// An empty result is a normal outcome; the pipeline stops before searching.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, question: &str) -> Vec<SearchTerm>;
}

impl<F> KeywordExtractor for F
where
    F: Fn(&str) -> Vec<SearchTerm> + Send + Sync,
{
    fn extract(&self, question: &str) -> Vec<SearchTerm> {
        self(question)
    }
}

const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "could", "did", "do", "does", "for", "from", "had", "has", "have", "how", "i", "in", "is",
    "it", "its", "me", "my", "of", "on", "or", "should", "tell", "that", "the", "their", "them",
    "there", "these", "they", "this", "those", "to", "was", "were", "what", "when", "where",
    "which", "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// Word-segmentation extractor with a stop-word list.
///
/// Terms are lowercased Unicode words, in first-occurrence order, without
/// stop words, numbers, or single characters (CJK ideographs excepted).
#[derive(Debug, Clone)]
pub struct StopwordExtractor {
    stop_words: HashSet<String>,
}

impl StopwordExtractor {
    pub fn new() -> Self {
        Self::with_stop_words(DEFAULT_STOP_WORDS.iter().copied())
    }

    pub fn with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: stop_words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn keep(&self, word: &str) -> bool {
        if self.stop_words.contains(word) {
            return false;
        }
        if word.chars().all(|c| c.is_numeric()) {
            return false;
        }
        let mut chars = word.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => is_ideograph(c),
            _ => true,
        }
    }
}

impl Default for StopwordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor for StopwordExtractor {
    fn extract(&self, question: &str) -> Vec<SearchTerm> {
        let mut seen = HashSet::new();
        question
            .unicode_words()
            .map(str::to_lowercase)
            .filter(|word| self.keep(word))
            .filter(|word| seen.insert(word.clone()))
            .collect()
    }
}

/// CJK ideographs carry meaning on their own.
fn is_ideograph(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F)
}
