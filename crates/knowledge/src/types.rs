//! Value types flowing through the question-answering pipeline.
//!
//! Every value here is built once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A search term produced by keyword extraction.
pub type SearchTerm = String;

/// One sentence of the corpus, addressed by file and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence text, trimmed
    pub text: String,

    /// Position of the sentence within its file, starting at 0
    pub ordinal: usize,

    /// File path relative to the corpus root
    pub source_file: String,
}

impl Sentence {
    pub fn new(text: impl Into<String>, ordinal: usize, source_file: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ordinal,
            source_file: source_file.into(),
        }
    }
}

/// Outcome of the lexical pre-filter.
///
/// `found()` is false exactly when no sentence matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexicalSearchResult {
    sentences: Vec<Sentence>,
    found: bool,
}

impl LexicalSearchResult {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        let found = !sentences.is_empty();
        Self { sentences, found }
    }

    /// Result of a search that matched nothing.
    pub fn not_found() -> Self {
        Self::new(Vec::new())
    }

    pub fn found(&self) -> bool {
        self.found
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn into_sentences(self) -> Vec<Sentence> {
        self.sentences
    }
}

/// A candidate sentence scored against the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub text: String,
    pub ordinal: usize,
    pub source_file: String,

    /// Cosine similarity to the question
    pub rank_score: f32,
}

impl RankedChunk {
    pub fn from_sentence(sentence: &Sentence, rank_score: f32) -> Self {
        Self {
            text: sentence.text.clone(),
            ordinal: sentence.ordinal,
            source_file: sentence.source_file.clone(),
            rank_score,
        }
    }
}

/// A non-empty answer extracted from one generation sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Answer(String);

impl Answer {
    /// Wrap trimmed text; `None` when nothing is left.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final result handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSet {
    question: String,
    answers: Vec<Answer>,
    chunks: Vec<RankedChunk>,
}

impl AnswerSet {
    pub(crate) fn new(question: String, answers: Vec<Answer>, chunks: Vec<RankedChunk>) -> Self {
        Self {
            question,
            answers,
            chunks,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn chunks(&self) -> &[RankedChunk] {
        &self.chunks
    }

    /// True when generation produced no usable answer.
    pub fn is_degenerate(&self) -> bool {
        self.answers.is_empty()
    }
}
