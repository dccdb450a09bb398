//! Document text extraction.

use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Html,
    PlainText,
}

impl ContentType {
    /// Detect content type from file extension.
    ///
    /// Returns `None` for files that are not read as corpus documents.
    /// Extension-less files are treated as plain text.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Some(Self::PlainText),
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "md" | "markdown" => Some(Self::Markdown),
                "html" | "htm" => Some(Self::Html),
                "txt" | "text" => Some(Self::PlainText),
                _ => None,
            },
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::PlainText => "text",
        }
    }
}

/// Reduce raw file content to plain text.
pub fn extract_text(raw: &str, content_type: ContentType) -> String {
    match content_type {
        ContentType::Markdown => clean_markdown(raw),
        ContentType::Html => clean_html(raw),
        ContentType::PlainText => raw.to_string(),
    }
}

/// Clean markdown by removing heading marks, rules and code fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }

        if in_fence || trimmed.starts_with("---") {
            continue;
        }

        let content = trimmed.trim_start_matches('#').trim();
        if !content.is_empty() {
            result.push_str(content);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
///
/// Block-level closing tags become line breaks so paragraphs stay apart.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut tag = String::new();
    let mut in_tag = false;
    let mut skip_depth = 0usize;

    for ch in text.chars() {
        match ch {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .trim_start_matches('/')
                    .split(|c: char| c.is_whitespace() || c == '/')
                    .next()
                    .unwrap_or("")
                    .to_ascii_lowercase();
                let closing = tag.starts_with('/');

                if name == "script" || name == "style" {
                    if closing {
                        skip_depth = skip_depth.saturating_sub(1);
                    } else {
                        skip_depth += 1;
                    }
                } else if matches!(
                    name.as_str(),
                    "p" | "br" | "div" | "li" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "tr"
                ) {
                    result.push('\n');
                }
            }
            _ if in_tag => tag.push(ch),
            _ if skip_depth == 0 => result.push(ch),
            _ => {}
        }
    }

    // Collapse whitespace within lines
    result
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
