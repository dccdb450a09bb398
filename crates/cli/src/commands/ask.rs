//! Ask command handler.
//!
//! Runs the full pipeline and prints the answer report.

use super::PipelineArgs;
use clap::Args;
use docqa_core::config::{AppConfig, ConfigOverrides};
use docqa_core::AppResult;
use docqa_knowledge::{render_text, Pipeline, PipelineOutcome};

/// Answer a question from the document folder
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to answer
    pub question: String,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Number of answers to sample from the model
    #[arg(short = 'n', long = "generate-num")]
    pub generate_num: Option<usize>,

    /// Generation model identifier
    #[arg(short, long, env = "DOCQA_MODEL")]
    pub model: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub fn apply(&self, overrides: &mut ConfigOverrides) {
        self.pipeline.apply(overrides);
        overrides.sample_count = self.generate_num;
        overrides.model = self.model.clone();
    }

    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question.trim();

        let pipeline = Pipeline::from_config(config).await?;
        let outcome = pipeline.run(question).await?;

        if self.json {
            let output = match &outcome {
                PipelineOutcome::Completed(set) => serde_json::json!({
                    "status": "completed",
                    "model": config.generation.model,
                    "result": set,
                }),
                PipelineOutcome::Halted(reason) => serde_json::json!({
                    "status": "halted",
                    "question": question,
                    "reason": reason.to_string(),
                }),
            };
            let json = serde_json::to_string_pretty(&output)?;
            println!("{}", json);
            return Ok(());
        }

        match outcome {
            PipelineOutcome::Completed(set) => print!("{}", render_text(&set)),
            PipelineOutcome::Halted(reason) => println!("Stopped: {}.", reason),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blank_question_stops_without_error() {
        let command = AskCommand {
            question: "   ".to_string(),
            pipeline: PipelineArgs::default(),
            generate_num: None,
            model: None,
            json: true,
        };

        assert!(command.execute(&AppConfig::default()).await.is_ok());
    }
}
