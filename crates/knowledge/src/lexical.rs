//! Bounded keyword search over corpus sentences.

use crate::corpus::SentenceStore;
use crate::types::{LexicalSearchResult, SearchTerm};
use docqa_core::config::SearchConfig;
use docqa_core::{AppResult, MatchPolicy};

/// Substring matcher collecting the first sentences that contain the terms.
///
/// The scan stops as soon as `max_candidate_docs` sentences are collected,
/// so later files are never read.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSearch {
    policy: MatchPolicy,
    case_sensitive: bool,
}

impl LexicalSearch {
    pub fn new(policy: MatchPolicy, case_sensitive: bool) -> Self {
        Self {
            policy,
            case_sensitive,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.match_policy, config.case_sensitive)
    }

    /// Collect up to `max_candidate_docs` matching sentences in store order.
    pub fn search(
        &self,
        store: &dyn SentenceStore,
        terms: &[SearchTerm],
        max_candidate_docs: usize,
    ) -> AppResult<LexicalSearchResult> {
        let terms = self.prepare_terms(terms);
        if terms.is_empty() || max_candidate_docs == 0 {
            return Ok(LexicalSearchResult::not_found());
        }

        let mut matches = Vec::new();
        let mut scanned = 0usize;

        for sentence in store.sentences()? {
            let sentence = sentence?;
            scanned += 1;

            if self.is_match(&sentence.text, &terms) {
                matches.push(sentence);
                if matches.len() >= max_candidate_docs {
                    tracing::debug!("Candidate limit {} reached", max_candidate_docs);
                    break;
                }
            }
        }

        tracing::debug!(
            "Lexical search scanned {} sentences, {} matched ({:?} policy)",
            scanned,
            matches.len(),
            self.policy
        );

        Ok(LexicalSearchResult::new(matches))
    }

    /// Normalize case and drop empty terms (they would match everything).
    fn prepare_terms(&self, terms: &[SearchTerm]) -> Vec<String> {
        terms
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| self.normalize(t))
            .collect()
    }

    fn normalize(&self, text: &str) -> String {
        if self.case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        }
    }

    fn is_match(&self, text: &str, terms: &[String]) -> bool {
        let text = self.normalize(text);
        match self.policy {
            MatchPolicy::Any => terms.iter().any(|t| text.contains(t.as_str())),
            MatchPolicy::All => terms.iter().all(|t| text.contains(t.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SentenceIter;
    use crate::types::Sentence;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store counting how many sentences were pulled.
    struct VecStore {
        sentences: Vec<Sentence>,
        pulled: AtomicUsize,
    }

    impl VecStore {
        fn new(texts: &[&str]) -> Self {
            Self {
                sentences: texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Sentence::new(*t, i, "mem.txt"))
                    .collect(),
                pulled: AtomicUsize::new(0),
            }
        }
    }

    impl SentenceStore for VecStore {
        fn sentences(&self) -> AppResult<SentenceIter<'_>> {
            Ok(Box::new(self.sentences.iter().cloned().map(move |s| {
                self.pulled.fetch_add(1, Ordering::SeqCst);
                Ok(s)
            })))
        }
    }

    fn terms(items: &[&str]) -> Vec<SearchTerm> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_any_term_case_insensitive() {
        let store = VecStore::new(&["Alpha particles.", "Beta decay.", "Gamma rays."]);
        let search = LexicalSearch::default();

        let result = search.search(&store, &terms(&["alpha", "GAMMA"]), 10).unwrap();
        let texts: Vec<&str> = result.sentences().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Alpha particles.", "Gamma rays."]);
        assert!(result.found());
    }

    #[test]
    fn test_all_terms_policy() {
        let store = VecStore::new(&["alpha and beta", "alpha only", "beta only"]);
        let search = LexicalSearch::new(MatchPolicy::All, false);

        let result = search.search(&store, &terms(&["alpha", "beta"]), 10).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.sentences()[0].text, "alpha and beta");
    }

    #[test]
    fn test_case_sensitive() {
        let store = VecStore::new(&["Alpha", "alpha"]);
        let search = LexicalSearch::new(MatchPolicy::Any, true);

        let result = search.search(&store, &terms(&["alpha"]), 10).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.sentences()[0].ordinal, 1);
    }

    #[test]
    fn test_stops_at_candidate_limit() {
        let store = VecStore::new(&["alpha 1", "alpha 2", "alpha 3", "alpha 4", "alpha 5"]);
        let search = LexicalSearch::default();

        let result = search.search(&store, &terms(&["alpha"]), 2).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.sentences()[1].text, "alpha 2");
        assert_eq!(store.pulled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_no_match_is_not_found() {
        let store = VecStore::new(&["beta", "gamma"]);
        let result = LexicalSearch::default()
            .search(&store, &terms(&["alpha"]), 10)
            .unwrap();
        assert!(!result.found());
        assert!(result.is_empty());
    }

    #[test]
    fn test_empty_terms_never_read_store() {
        let store = VecStore::new(&["alpha"]);
        let result = LexicalSearch::default()
            .search(&store, &terms(&["", ""]), 10)
            .unwrap();
        assert!(!result.found());
        assert_eq!(store.pulled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_terms_do_not_duplicate_matches() {
        let store = VecStore::new(&["alpha"]);
        let result = LexicalSearch::default()
            .search(&store, &terms(&["alpha", "alpha"]), 10)
            .unwrap();
        assert_eq!(result.len(), 1);
    }
}
