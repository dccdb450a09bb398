//! Configuration management for the docqa CLI.
//!
//! Configuration is resolved once at startup from several layers, lowest
//! precedence first:
//! - Built-in defaults
//! - Config file (`--config`, `DOCQA_CONFIG`, or `./docqa.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The resolved `AppConfig` is an immutable value handed to each component.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Config file looked up in the current directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "docqa.yaml";

const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];
const KNOWN_GENERATION_PROVIDERS: [&str; 1] = ["ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Config file this configuration was read from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Verbose mode (enables debug logging)
    #[serde(skip)]
    pub verbose: bool,

    pub input: InputConfig,
    pub search: SearchConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
    pub logging: LoggingConfig,
}

/// Corpus location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Folder containing the documents to search
    pub data_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
        }
    }
}

/// Whether a sentence must contain any or all of the search terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// At least one term occurs in the sentence
    #[default]
    Any,
    /// Every term occurs in the sentence
    All,
}

/// Lexical search and reranking limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on sentences collected by the lexical search
    pub max_candidate_docs: usize,

    /// Upper bound on chunks kept after vector reranking
    pub max_reranked_results: usize,

    /// Term matching policy
    pub match_policy: MatchPolicy,

    /// Compare terms and sentences case-sensitively
    pub case_sensitive: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_candidate_docs: 100,
            max_reranked_results: 5,
            match_policy: MatchPolicy::Any,
            case_sensitive: false,
        }
    }
}

/// Embedding service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Embedding model identifier
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Service endpoint (provider-specific default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Generation service and sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// LLM provider (e.g., "ollama")
    pub provider: String,

    /// Service endpoint
    pub endpoint: String,

    /// Generation model identifier
    pub model: String,

    /// Number of independent samples requested per question
    pub sample_count: usize,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens per sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-call timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Number of samples requested in flight at once (1 = sequential)
    pub concurrency: usize,

    /// Marker preceding the answer in a generated transcript
    pub answer_marker: String,

    /// Search the marker in prompt + completion rather than the completion alone
    pub echo_prompt: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            sample_count: 3,
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
            concurrency: 1,
            answer_marker: "### Answer:".to_string(),
            echo_prompt: false,
        }
    }
}

/// Prompt template configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// YAML prompt definition replacing the built-in template
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter (e.g., "info", "docqa_knowledge=debug")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Colored output on stderr
    pub color: bool,

    /// Additional log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            color: true,
            file: None,
        }
    }
}

/// The settings the pipeline reads while answering one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationSettings {
    pub sample_count: usize,
    pub embedding_model_id: String,
    pub max_candidate_docs: usize,
    pub max_reranked_results: usize,
}

/// Values supplied on the command line; `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_path: Option<PathBuf>,
    pub max_candidate_docs: Option<usize>,
    pub max_reranked_results: Option<usize>,
    pub sample_count: Option<usize>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration from a config file, the environment and defaults.
    ///
    /// An explicitly given `config_file` must exist. Otherwise `DOCQA_CONFIG`
    /// is consulted, then `./docqa.yaml`; when neither exists the defaults
    /// are used.
    ///
    /// Environment variables:
    /// - `DOCQA_CONFIG`: Path to config file
    /// - `DOCQA_DATA_PATH`: Corpus folder
    /// - `DOCQA_OLLAMA_URL`: Generation endpoint
    /// - `DOCQA_MODEL`: Generation model
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use docqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None).expect("Failed to load config");
    /// println!("Corpus: {:?}", config.input.data_path);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("DOCQA_CONFIG").ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Self::from_yaml_file(&path)?
            }
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_yaml_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Parse a YAML config file.
    pub fn from_yaml_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut config = Self::from_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        config.config_file = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse YAML configuration; missing keys keep their defaults.
    pub fn from_yaml_str(contents: &str) -> AppResult<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("DOCQA_DATA_PATH") {
            self.input.data_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("DOCQA_OLLAMA_URL") {
            self.generation.endpoint = url;
        }

        if let Ok(model) = std::env::var("DOCQA_MODEL") {
            self.generation.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.logging.color = false;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over the config file and environment.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(data_path) = overrides.data_path {
            self.input.data_path = data_path;
        }

        if let Some(max_candidate_docs) = overrides.max_candidate_docs {
            self.search.max_candidate_docs = max_candidate_docs;
        }

        if let Some(max_reranked_results) = overrides.max_reranked_results {
            self.search.max_reranked_results = max_reranked_results;
        }

        if let Some(sample_count) = overrides.sample_count {
            self.generation.sample_count = sample_count;
        }

        if let Some(model) = overrides.model {
            self.generation.model = model;
        }

        if let Some(log_level) = overrides.log_level {
            self.logging.level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.logging.level.is_none() {
                self.logging.level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.logging.color = false;
        }

        self
    }

    /// Snapshot of the values the pipeline stages consume.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            sample_count: self.generation.sample_count,
            embedding_model_id: self.embedding.model.clone(),
            max_candidate_docs: self.search.max_candidate_docs,
            max_reranked_results: self.search.max_reranked_results,
        }
    }

    /// Validate the configuration before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        let embedding_provider = self.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&embedding_provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        let generation_provider = self.generation.provider.to_lowercase();
        if !KNOWN_GENERATION_PROVIDERS.contains(&generation_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                self.generation.provider,
                KNOWN_GENERATION_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        if self.search.max_candidate_docs == 0 {
            return Err(AppError::Config(
                "search.max_candidate_docs must be greater than 0".to_string(),
            ));
        }

        if self.search.max_reranked_results == 0 {
            return Err(AppError::Config(
                "search.max_reranked_results must be greater than 0".to_string(),
            ));
        }

        if self.generation.concurrency == 0 {
            return Err(AppError::Config(
                "generation.concurrency must be greater than 0".to_string(),
            ));
        }

        if self.generation.answer_marker.is_empty() {
            return Err(AppError::Config(
                "generation.answer_marker cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.input.data_path, PathBuf::from("data"));
        assert_eq!(config.search.max_candidate_docs, 100);
        assert_eq!(config.search.max_reranked_results, 5);
        assert_eq!(config.search.match_policy, MatchPolicy::Any);
        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.generation.sample_count, 3);
        assert!(!config.generation.echo_prompt);
        assert_eq!(config.generation.concurrency, 1);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
search:
  max_candidate_docs: 20
  match_policy: all
generation:
  sample_count: 7
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.search.max_candidate_docs, 20);
        assert_eq!(config.search.match_policy, MatchPolicy::All);
        assert_eq!(config.search.max_reranked_results, 5);
        assert_eq!(config.generation.sample_count, 7);
        assert_eq!(config.generation.model, "llama3.2");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(config.search.max_candidate_docs, 100);
    }

    #[test]
    fn test_from_yaml_file_records_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docqa.yaml");
        std::fs::write(&path, "input:\n  data_path: /srv/docs\n").unwrap();

        let config = AppConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.input.data_path, PathBuf::from("/srv/docs"));
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_invalid_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        std::fs::write(&path, "search: [unclosed").unwrap();

        let result = AppConfig::from_yaml_file(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/docqa.yaml")));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            data_path: Some(PathBuf::from("corpus")),
            max_candidate_docs: Some(10),
            max_reranked_results: Some(2),
            sample_count: Some(0),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.input.data_path, PathBuf::from("corpus"));
        assert_eq!(config.search.max_candidate_docs, 10);
        assert_eq!(config.search.max_reranked_results, 2);
        assert_eq!(config.generation.sample_count, 0);
        assert!(config.verbose);
        assert_eq!(config.logging.level, Some("debug".to_string()));
    }

    #[test]
    fn test_generation_settings_snapshot() {
        let mut config = AppConfig::default();
        config.embedding.model = "nomic-embed-text".to_string();
        config.search.max_reranked_results = 2;

        let settings = config.generation_settings();
        assert_eq!(
            settings,
            GenerationSettings {
                sample_count: 3,
                embedding_model_id: "nomic-embed-text".to_string(),
                max_candidate_docs: 100,
                max_reranked_results: 2,
            }
        );
    }

    #[test]
    fn test_validate_unknown_embedding_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_limits() {
        let mut config = AppConfig::default();
        config.search.max_reranked_results = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.generation.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_samples_is_valid() {
        let mut config = AppConfig::default();
        config.generation.sample_count = 0;
        assert!(config.validate().is_ok());
    }
}
