//! Question answering pipeline.
//!
//! Stages run in a fixed order, each gated on the previous one producing
//! something to work with:
//!
//! 1. keyword extraction, halting when no search terms remain
//! 2. bounded lexical search, halting when no sentence matches
//! 3. vector reranking, halting when no chunk survives
//! 4. prompt assembly and repeated sampling
//! 5. aggregation into an [`AnswerSet`]
//!
//! A halt is a normal outcome carrying a [`HaltReason`], not an error.
//! Generation is never gated: zero answers still yield an `AnswerSet`.

use crate::aggregate;
use crate::corpus::{FolderSentenceStore, SentenceStore};
use crate::embeddings::create_provider;
use crate::keywords::{KeywordExtractor, StopwordExtractor};
use crate::lexical::LexicalSearch;
use crate::rerank::VectorReranker;
use crate::sampler::{GenerationSampler, SamplerOptions};
use crate::types::{AnswerSet, RankedChunk};
use docqa_core::{AppConfig, AppResult, GenerationSettings};
use docqa_prompt::{format_context, load_prompt, PromptBuilder};
use std::fmt;
use std::sync::Arc;
use tracing::{info, info_span, instrument, Instrument};

/// Why the pipeline stopped before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    NoSearchTerms,
    NoMatchingSentences,
    NoRelevantChunks,
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            HaltReason::NoSearchTerms => "no search terms derivable from the question",
            HaltReason::NoMatchingSentences => "no matching sentences in the corpus",
            HaltReason::NoRelevantChunks => "no relevant chunks after reranking",
        };
        f.write_str(message)
    }
}

/// Result of the retrieval stages alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    Halted(HaltReason),
    Chunks(Vec<RankedChunk>),
}

/// Result of a full run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Halted(HaltReason),
    Completed(AnswerSet),
}

/// Retrieval-augmented question answering over one corpus.
pub struct Pipeline {
    settings: GenerationSettings,
    store: Arc<dyn SentenceStore>,
    extractor: Arc<dyn KeywordExtractor>,
    lexical: LexicalSearch,
    reranker: VectorReranker,
    prompt: PromptBuilder,
    sampler: GenerationSampler,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        settings: GenerationSettings,
        store: Arc<dyn SentenceStore>,
        extractor: Arc<dyn KeywordExtractor>,
        lexical: LexicalSearch,
        reranker: VectorReranker,
        prompt: PromptBuilder,
        sampler: GenerationSampler,
    ) -> Self {
        Self {
            settings,
            store,
            extractor,
            lexical,
            reranker,
            prompt,
            sampler,
        }
    }

    /// Build every stage from a validated configuration.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let store = FolderSentenceStore::new(&config.input.data_path);

        let provider = create_provider(&config.embedding)?;
        tracing::debug!(
            "Embedding provider: {} ({})",
            provider.provider_name(),
            provider.model_name()
        );

        let prompt = match &config.prompt.file {
            Some(path) => PromptBuilder::from_definition(&load_prompt(path)?)?,
            None => PromptBuilder::new()?,
        };
        prompt.ensure_marker(&config.generation.answer_marker)?;

        let client = docqa_llm::create_client(
            &config.generation.provider,
            Some(config.generation.endpoint.as_str()),
        )?;

        Ok(Self::new(
            config.generation_settings(),
            Arc::new(store),
            Arc::new(StopwordExtractor::new()),
            LexicalSearch::from_config(&config.search),
            VectorReranker::new(provider),
            prompt,
            GenerationSampler::new(client, SamplerOptions::from_config(&config.generation)),
        ))
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Run keyword extraction, lexical search and reranking.
    pub async fn retrieve(&self, question: &str) -> AppResult<Retrieval> {
        let terms = self.extractor.extract(question);
        if terms.is_empty() {
            info!("Halted: {}", HaltReason::NoSearchTerms);
            return Ok(Retrieval::Halted(HaltReason::NoSearchTerms));
        }
        info!("Search terms: {}", terms.join(", "));

        let lexical = info_span!("lexical_search").in_scope(|| {
            self.lexical.search(
                self.store.as_ref(),
                &terms,
                self.settings.max_candidate_docs,
            )
        })?;
        if !lexical.found() {
            info!("Halted: {}", HaltReason::NoMatchingSentences);
            return Ok(Retrieval::Halted(HaltReason::NoMatchingSentences));
        }
        info!("Candidate sentences: {}", lexical.len());

        let chunks = self
            .reranker
            .rerank(
                question,
                lexical.sentences(),
                &self.settings.embedding_model_id,
                self.settings.max_reranked_results,
            )
            .instrument(info_span!("rerank", candidates = lexical.len()))
            .await?;
        if chunks.is_empty() {
            info!("Halted: {}", HaltReason::NoRelevantChunks);
            return Ok(Retrieval::Halted(HaltReason::NoRelevantChunks));
        }
        info!("Context chunks: {}", chunks.len());

        Ok(Retrieval::Chunks(chunks))
    }

    /// Answer one question end to end.
    #[instrument(name = "pipeline", skip_all)]
    pub async fn run(&self, question: &str) -> AppResult<PipelineOutcome> {
        info!("Question: {}", question);

        let chunks = match self.retrieve(question).await? {
            Retrieval::Halted(reason) => return Ok(PipelineOutcome::Halted(reason)),
            Retrieval::Chunks(chunks) => chunks,
        };

        let texts = || chunks.iter().map(|c| c.text.as_str());
        let prompt = self.prompt.build(question, texts())?;
        info!("Retrieved context:\n{}", format_context(texts()).trim_end());
        tracing::debug!("Prompt ({}):\n{}", self.prompt.source_id(), prompt);

        let answers = self
            .sampler
            .sample(&prompt, self.settings.sample_count)
            .instrument(info_span!("sample", count = self.settings.sample_count))
            .await?;
        if answers.is_empty() {
            info!("No answers generated");
        }

        Ok(PipelineOutcome::Completed(aggregate::assemble(
            question, answers, chunks,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ollama_stub::serve_json;
    use docqa_core::AppError;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_halt_reason_messages() {
        assert_eq!(
            HaltReason::NoSearchTerms.to_string(),
            "no search terms derivable from the question"
        );
        assert_eq!(
            HaltReason::NoMatchingSentences.to_string(),
            "no matching sentences in the corpus"
        );
        assert_eq!(
            HaltReason::NoRelevantChunks.to_string(),
            "no relevant chunks after reranking"
        );
    }

    #[tokio::test]
    async fn test_from_config_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.input.data_path = dir.path().to_path_buf();

        let pipeline = Pipeline::from_config(&config).await.unwrap();
        assert_eq!(pipeline.settings().sample_count, 3);
        assert_eq!(pipeline.settings().embedding_model_id, "trigram-v1");
    }

    #[tokio::test]
    async fn test_from_config_rejects_bad_prompt_file() {
        let mut config = AppConfig::default();
        config.prompt.file = Some("/nonexistent/prompt.yaml".into());

        assert!(Pipeline::from_config(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_rejects_prompt_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.yml");
        std::fs::write(
            &path,
            "id: short\ntitle: Short\napiVersion: \"1.0\"\ntemplate: \"{{question}}\\n{{context}}\\nAnswer:\"\n",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.prompt.file = Some(path);
        let err = Pipeline::from_config(&config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("### Answer:"));

        config.generation.answer_marker = "Answer:".to_string();
        assert!(Pipeline::from_config(&config).await.is_ok());
    }

    #[tokio::test]
    async fn test_ollama_embeddings_untouched_when_no_terms() {
        let (url, requests) = serve_json(r#"{"embedding":[1.0]}"#).await;
        let mut config = AppConfig::default();
        config.embedding.provider = "ollama".to_string();
        config.embedding.model = "nomic-embed-text".to_string();
        config.embedding.dimensions = 1;
        config.embedding.endpoint = Some(url);

        let pipeline = Pipeline::from_config(&config).await.unwrap();
        let outcome = pipeline.run("What is it?").await.unwrap();

        assert_eq!(outcome, PipelineOutcome::Halted(HaltReason::NoSearchTerms));
        assert_eq!(requests.load(Ordering::SeqCst), 0);
    }
}
