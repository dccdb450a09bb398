//! Retrieval and answering over a local document folder.
//!
//! The crate turns a question into answers in stages: keyword extraction,
//! bounded lexical search over corpus sentences, embedding-based reranking,
//! prompt assembly and repeated sampling from a generation model. See
//! [`pipeline`] for how the stages are gated.
//!
//! # Example
//! ```no_run
//! use docqa_core::AppConfig;
//! use docqa_knowledge::{Pipeline, PipelineOutcome};
//!
//! # async fn example() -> docqa_core::AppResult<()> {
//! let config = AppConfig::load(None)?;
//! let pipeline = Pipeline::from_config(&config).await?;
//! match pipeline.run("What is the boiling point of water?").await? {
//!     PipelineOutcome::Completed(set) => println!("{}", docqa_knowledge::render_text(&set)),
//!     PipelineOutcome::Halted(reason) => println!("Stopped: {}", reason),
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod corpus;
pub mod embeddings;
pub mod keywords;
pub mod lexical;
pub mod parser;
pub mod pipeline;
pub mod rerank;
pub mod sampler;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use aggregate::{assemble, render_text};
pub use corpus::{FolderSentenceStore, SentenceStore};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use keywords::{KeywordExtractor, StopwordExtractor};
pub use lexical::LexicalSearch;
pub use pipeline::{HaltReason, Pipeline, PipelineOutcome, Retrieval};
pub use rerank::VectorReranker;
pub use sampler::{extract_answer, GenerationSampler, SamplerOptions};
pub use types::{Answer, AnswerSet, LexicalSearchResult, RankedChunk, SearchTerm, Sentence};
