//! Search command handler.
//!
//! Runs retrieval only and lists the ranked sentences; no model is called.

use super::PipelineArgs;
use clap::Args;
use docqa_core::config::{AppConfig, ConfigOverrides};
use docqa_core::AppResult;
use docqa_knowledge::{Pipeline, Retrieval};

/// Show the sentences that would be given to the model
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// The question to retrieve context for
    pub question: String,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub fn apply(&self, overrides: &mut ConfigOverrides) {
        self.pipeline.apply(overrides);
    }

    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let question = self.question.trim();

        let pipeline = Pipeline::from_config(config).await?;
        let retrieval = pipeline.retrieve(question).await?;

        if self.json {
            let output = match &retrieval {
                Retrieval::Chunks(chunks) => serde_json::json!({
                    "status": "found",
                    "question": question,
                    "chunks": chunks,
                }),
                Retrieval::Halted(reason) => serde_json::json!({
                    "status": "halted",
                    "question": question,
                    "reason": reason.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        match retrieval {
            Retrieval::Chunks(chunks) => {
                for (i, chunk) in chunks.iter().enumerate() {
                    println!(
                        "{}. [{:.3}] {}#{}: {}",
                        i + 1,
                        chunk.rank_score,
                        chunk.source_file,
                        chunk.ordinal,
                        chunk.text
                    );
                }
            }
            Retrieval::Halted(reason) => println!("Stopped: {}.", reason),
        }

        Ok(())
    }
}
