//! Embedding provider trait and factory.

use docqa_core::config::EmbeddingConfig;
use docqa_core::{AppError, AppResult};
use std::sync::Arc;

use super::providers::{ollama::OllamaProvider, trigram::TrigramProvider, trigram::TRIGRAM_MODEL};

/// Trait for embedding providers.
///
/// Embeddings are deterministic for a given model: the same text always
/// maps to the same fixed-length vector.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, one vector per text in order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Nothing is contacted here; the Ollama provider checks the service on its
/// first embedding.
pub fn create_provider(config: &EmbeddingConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "trigram" => {
            if config.model != TRIGRAM_MODEL {
                return Err(AppError::Config(format!(
                    "Trigram provider only supports model '{}', got '{}'",
                    TRIGRAM_MODEL, config.model
                )));
            }
            Ok(Arc::new(TrigramProvider::new(config.dimensions)))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            config.provider
        ))),
    }
}
