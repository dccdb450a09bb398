//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Answers questions from a local folder of documents.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, SearchCommand};
use docqa_core::config::{AppConfig, ConfigOverrides};
use docqa_core::{logging, AppResult};
use std::path::PathBuf;

/// docqa - answer questions from your own documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Answer questions from a local document folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question using retrieved context
    Ask(AskCommand),

    /// Retrieve and rank context without generating
    Search(SearchCommand),
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            log_level: self.log_level.clone(),
            verbose: self.verbose,
            no_color: self.no_color,
            ..ConfigOverrides::default()
        };
        match &self.command {
            Commands::Ask(cmd) => cmd.apply(&mut overrides),
            Commands::Search(cmd) => cmd.apply(&mut overrides),
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Defaults, then config file and environment, then flags
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(cli.overrides());
    config.validate()?;

    logging::init_logging(&config.logging)?;

    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Corpus: {:?}", config.input.data_path);
    tracing::debug!(
        "Generation: {} ({}), {} samples",
        config.generation.model,
        config.generation.provider,
        config.generation.sample_count
    );

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Search(_) => "search",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match &cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
