//! Core types for DocScout

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A documentation file extracted from a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Raw file content
    pub content: String,
    /// Title from front matter or the first heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Document {
    /// Create a document, deriving its title from the content
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let title = derive_title(&content);
        Self {
            path: path.into(),
            content,
            title,
        }
    }
}

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// Path of the matching file relative to the repository root
    pub filename: String,
    /// Document title, when one could be derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Relevance score, higher is better
    pub score: f32,
    /// Leading part of the file content
    pub content: String,
}

impl SearchResult {
    /// Build a result from a document, cutting the content to `max_chars`
    pub fn from_document(doc: &Document, score: f32, max_chars: usize) -> Self {
        Self {
            filename: doc.path.clone(),
            title: doc.title.clone(),
            score,
            content: excerpt(&doc.content, max_chars),
        }
    }
}

/// First `max_chars` characters of `content`, with `...` appended when cut
pub fn excerpt(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

/// Title from YAML front matter (`title:`) or the first `#` heading
fn derive_title(content: &str) -> Option<String> {
    let mut lines = content.lines();

    if content.starts_with("---") {
        lines.next();
        for line in lines.by_ref() {
            let line = line.trim();
            if line == "---" {
                break;
            }
            if let Some(value) = line.strip_prefix("title:") {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }

    lines
        .map(str::trim_start)
        .find_map(|line| {
            let heading = line.trim_start_matches('#');
            let level = line.len() - heading.len();
            if (1..=6).contains(&level) && heading.starts_with(' ') {
                Some(heading.trim().trim_end_matches('#').trim().to_string())
            } else {
                None
            }
        })
        .filter(|title| !title.is_empty())
}
