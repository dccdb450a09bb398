//! Command handlers for the docqa CLI.

pub mod ask;
pub mod search;

pub use ask::AskCommand;
pub use search::SearchCommand;

use clap::Args;
use docqa_core::config::ConfigOverrides;
use std::path::PathBuf;

/// Corpus and pipeline limits shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Folder holding the documents to search
    #[arg(short = 'd', long, env = "DOCQA_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Maximum number of candidate sentences from keyword search
    #[arg(long = "max-doc")]
    pub max_doc: Option<usize>,

    /// Maximum number of sentences kept after reranking
    #[arg(long = "max-results")]
    pub max_results: Option<usize>,
}

impl PipelineArgs {
    pub fn apply(&self, overrides: &mut ConfigOverrides) {
        overrides.data_path = self.data_path.clone();
        overrides.max_candidate_docs = self.max_doc;
        overrides.max_reranked_results = self.max_results;
    }
}
