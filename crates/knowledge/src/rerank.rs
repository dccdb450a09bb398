//! Embedding-based reranking of lexical candidates.

use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::types::{RankedChunk, Sentence};
use docqa_core::{AppError, AppResult};
use std::cmp::Ordering;
use std::sync::Arc;

/// Orders candidate sentences by cosine similarity to the question.
#[derive(Debug, Clone)]
pub struct VectorReranker {
    provider: Arc<dyn EmbeddingProvider>,
}

impl VectorReranker {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    /// Score every candidate against the question and keep the best
    /// `max_reranked_results`, highest score first.
    ///
    /// `embedding_model_id` must name the provider's model. Candidates with
    /// equal scores keep their input order. Nothing is embedded when there
    /// are no candidates.
    pub async fn rerank(
        &self,
        question: &str,
        candidates: &[Sentence],
        embedding_model_id: &str,
        max_reranked_results: usize,
    ) -> AppResult<Vec<RankedChunk>> {
        if embedding_model_id != self.provider.model_name() {
            return Err(AppError::Embedding(format!(
                "Embedding model '{}' requested but provider '{}' serves '{}'",
                embedding_model_id,
                self.provider.provider_name(),
                self.provider.model_name()
            )));
        }
        if candidates.is_empty() || max_reranked_results == 0 {
            return Ok(Vec::new());
        }

        let mut texts = Vec::with_capacity(candidates.len() + 1);
        texts.push(question.to_string());
        texts.extend(candidates.iter().map(|s| s.text.clone()));

        let embeddings = self.provider.embed_batch(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider '{}' returned {} embeddings for {} texts",
                self.provider.provider_name(),
                embeddings.len(),
                texts.len()
            )));
        }

        let (question_vec, candidate_vecs) = embeddings.split_at(1);
        let question_vec = &question_vec[0];

        let mut ranked = candidates
            .iter()
            .zip(candidate_vecs)
            .map(|(sentence, vector)| {
                cosine_similarity(question_vec, vector)
                    .map(|score| RankedChunk::from_sentence(sentence, score))
            })
            .collect::<AppResult<Vec<_>>>()?;

        // sort_by is stable: ties stay in lexical order
        ranked.sort_by(|a, b| descending_score(a.rank_score, b.rank_score));
        ranked.truncate(max_reranked_results);

        tracing::debug!(
            "Reranked {} candidates with {}/{}, kept {}",
            candidates.len(),
            self.provider.provider_name(),
            self.provider.model_name(),
            ranked.len()
        );

        Ok(ranked)
    }
}

/// Total descending order on scores; NaN sorts after every number.
fn descending_score(a: f32, b: f32) -> Ordering {
    let key = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score };
    key(b).total_cmp(&key(a))
}
