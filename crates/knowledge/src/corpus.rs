//! Sentence store over a folder of documents.
//!
//! Files are visited in path order and read one at a time, only when the
//! consumer of the sentence iterator gets to them.

use crate::parser::{extract_text, ContentType};
use crate::types::Sentence;
use docqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use unicode_segmentation::UnicodeSegmentation;
use walkdir::WalkDir;

/// Lazily produced sentences; an `Err` item aborts the scan.
pub type SentenceIter<'a> = Box<dyn Iterator<Item = AppResult<Sentence>> + Send + 'a>;

/// Source of addressable sentences.
pub trait SentenceStore: Send + Sync {
    /// Iterate all sentences in a stable order (file, then ordinal).
    fn sentences(&self) -> AppResult<SentenceIter<'_>>;
}

/// Reads every supported document under a folder.
#[derive(Debug, Clone)]
pub struct FolderSentenceStore {
    root: PathBuf,
}

impl FolderSentenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Supported documents under the root, sorted by path; hidden entries skipped.
    fn document_paths(&self) -> AppResult<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(AppError::Knowledge(format!(
                "Corpus folder does not exist or is not a directory: {:?}",
                self.root
            )));
        }

        let mut paths = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        for entry in walker {
            let entry = entry.map_err(|e| {
                AppError::Knowledge(format!("Failed to walk corpus {:?}: {}", self.root, e))
            })?;

            if entry.file_type().is_file() && ContentType::from_path(entry.path()).is_some() {
                paths.push(entry.into_path());
            }
        }

        tracing::debug!("Found {} documents under {:?}", paths.len(), self.root);
        Ok(paths)
    }

    /// Read one document and split it into sentences.
    ///
    /// Non-UTF-8 files are skipped with a warning.
    fn read_sentences(&self, path: &Path) -> AppResult<Vec<Sentence>> {
        let content_type = match ContentType::from_path(path) {
            Some(content_type) => content_type,
            None => return Ok(Vec::new()),
        };

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::warn!("Skipping non UTF-8 file: {:?}", path);
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::Knowledge(format!(
                    "Failed to read {:?}: {}",
                    path, e
                )))
            }
        };

        let source_file = path
            .strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        let text = extract_text(&raw, content_type);
        let sentences: Vec<Sentence> = split_sentences(&text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Sentence::new(text, ordinal, source_file.clone()))
            .collect();

        tracing::trace!(
            "Read {} sentences from {} ({})",
            sentences.len(),
            source_file,
            content_type.as_str()
        );

        Ok(sentences)
    }
}

impl SentenceStore for FolderSentenceStore {
    fn sentences(&self) -> AppResult<SentenceIter<'_>> {
        let paths = self.document_paths()?;

        let iter = paths
            .into_iter()
            .flat_map(move |path| match self.read_sentences(&path) {
                Ok(sentences) => sentences.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            });

        Ok(Box::new(iter))
    }
}

/// Split text on Unicode sentence boundaries (UAX #29).
///
/// Line breaks also end a sentence. Segments are trimmed and blank ones dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
