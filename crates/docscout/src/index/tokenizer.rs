//! Text tokenizer with stop word removal.
//!
//! Lowercases text, splits on non-alphanumeric characters, and drops
//! single-character tokens and common English stop words.

use std::collections::HashSet;
use std::sync::LazyLock;

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "been", "but", "by", "can", "could", "do", "does", "for", "from", "had", "has", "have",
        "he", "her", "his", "how", "if", "in", "into", "is", "it", "its", "may", "more", "no",
        "not", "of", "on", "only", "or", "other", "our", "she", "should", "so", "such", "than",
        "that", "the", "their", "them", "then", "there", "these", "they", "this", "those", "to",
        "too", "up", "was", "we", "were", "what", "when", "where", "which", "while", "who",
        "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Tokenize text into owned lowercase terms, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("The quick brown fox jumps over the lazy dog");
        assert!(!tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"quick".to_string()));
        assert!(tokens.contains(&"fox".to_string()));
    }

    #[test]
    fn test_tokenize_splits_punctuation_and_paths() {
        let tokens = tokenize("docs/getting-started.md: Vector_Search!");
        assert_eq!(
            tokens,
            vec!["docs", "getting", "started", "md", "vector", "search"]
        );
    }

    #[test]
    fn test_tokenize_drops_single_chars() {
        assert!(tokenize("a b c x").is_empty());
        assert!(tokenize("").is_empty());
    }
}
