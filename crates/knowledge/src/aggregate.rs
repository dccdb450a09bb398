//! Answer aggregation and reporting.

use crate::types::{Answer, AnswerSet, RankedChunk};
use std::fmt::Write;

/// Bundle the question, its answers and the context chunks.
///
/// Answers and chunks are kept exactly as produced, duplicates included.
pub fn assemble(question: &str, answers: Vec<Answer>, chunks: Vec<RankedChunk>) -> AnswerSet {
    AnswerSet::new(question.to_string(), answers, chunks)
}

/// Plain-text report of an answer set, identical for identical input.
pub fn render_text(set: &AnswerSet) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Question: {}", set.question());
    let _ = writeln!(out);

    if set.is_degenerate() {
        let _ = writeln!(out, "No answer was generated.");
    } else {
        let _ = writeln!(out, "Answers ({}):", set.answers().len());
        for (i, answer) in set.answers().iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, answer);
        }
    }

    if !set.chunks().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Sources:");
        for (i, chunk) in set.chunks().iter().enumerate() {
            let _ = writeln!(
                out,
                "  [{}] {}#{} (score {:.3})",
                i + 1,
                chunk.source_file,
                chunk.ordinal,
                chunk.rank_score
            );
            let _ = writeln!(out, "      {}", chunk.text);
        }
    }

    out
}
