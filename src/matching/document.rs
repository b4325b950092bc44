// src/matching/document.rs - Per-document lookup structures, built once and shared read-only

use std::collections::{HashMap, HashSet};

use super::normalize::{normalize_mapped, NormalizedText};

/// Upper bound on the length of any snippet shown to a reviewer.
pub const MAX_SNIPPET_CHARS: usize = 200;

/// A whitespace-delimited token of the normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TokenSpan {
    start: usize,
    end: usize,
}

#[derive(Debug, Default)]
pub struct DocumentIndex {
    original: String,
    normalized: NormalizedText,
    // normalized text wrapped in single spaces, for token-aligned phrase search
    padded: String,
    tokens: Vec<TokenSpan>,
    words: HashSet<String>,
    word_positions: HashMap<String, Vec<usize>>,
}

impl DocumentIndex {
    /// Build the index in one pass over the document. An empty document
    /// yields an empty index rather than an error.
    pub fn build(document_text: &str) -> Self {
        let normalized = normalize_mapped(document_text);

        let mut tokens = Vec::new();
        let mut words = HashSet::new();
        let mut word_positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut start = 0;
        for word in normalized.as_str().split(' ') {
            if !word.is_empty() {
                tokens.push(TokenSpan {
                    start,
                    end: start + word.len(),
                });
                if !words.contains(word) {
                    words.insert(word.to_string());
                }
                word_positions.entry(word.to_string()).or_default().push(start);
            }
            start += word.len() + 1;
        }

        let padded = format!(" {} ", normalized.as_str());

        Self {
            original: document_text.to_string(),
            normalized,
            padded,
            tokens,
            words,
            word_positions,
        }
    }

    /// True when the document has no matchable content at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn normalized_text(&self) -> &str {
        self.normalized.as_str()
    }

    /// Plain substring test against the normalized text.
    pub fn contains_substring(&self, needle: &str) -> bool {
        !needle.is_empty() && self.normalized.as_str().contains(needle)
    }

    /// Substring test that only accepts occurrences aligned on token
    /// boundaries, so "viapol" does not match inside "viapolimeros".
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        !self.phrase_positions(phrase, 1).is_empty()
    }

    /// Normalized byte offsets of token-aligned occurrences of `phrase`,
    /// in document order, at most `limit` of them.
    pub fn phrase_positions(&self, phrase: &str, limit: usize) -> Vec<usize> {
        if phrase.is_empty() || limit == 0 {
            return Vec::new();
        }
        let needle = format!(" {} ", phrase);
        let mut positions = Vec::new();
        let mut from = 0;
        while let Some(found) = self.padded[from..].find(&needle) {
            let at = from + found;
            // the leading pad byte sits exactly at the phrase offset in the
            // unpadded text
            positions.push(at);
            if positions.len() >= limit {
                break;
            }
            // step past the leading space only, so adjacent repeats are found
            from = at + 1;
        }
        positions
    }

    pub fn word_set(&self) -> &HashSet<String> {
        &self.words
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Normalized byte offsets of every occurrence of `word`.
    pub fn word_positions(&self, word: &str) -> &[usize] {
        self.word_positions
            .get(word)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens
            .get(index)
            .map(|span| &self.normalized.as_str()[span.start..span.end])
    }

    pub fn token_start(&self, index: usize) -> Option<usize> {
        self.tokens.get(index).map(|span| span.start)
    }

    /// Text of `width` consecutive tokens starting at token `index`.
    pub fn token_window(&self, index: usize, width: usize) -> Option<&str> {
        if width == 0 {
            return None;
        }
        let first = self.tokens.get(index)?;
        let last = self.tokens.get(index + width - 1)?;
        Some(&self.normalized.as_str()[first.start..last.end])
    }

    /// Window of normalized text around a match, `radius` bytes either side
    /// of `[offset, offset + len)`, widened to char boundaries.
    pub fn normalized_window(&self, offset: usize, len: usize, radius: usize) -> &str {
        let text = self.normalized.as_str();
        let start = floor_char_boundary(text, offset.saturating_sub(radius));
        let end = ceil_char_boundary(text, offset.saturating_add(len).saturating_add(radius));
        &text[start..end]
    }

    /// Snippet of the original, non-normalized document around a normalized
    /// offset: up to `radius` chars either side, whitespace runs squeezed and
    /// capped at [`MAX_SNIPPET_CHARS`].
    pub fn context_around(&self, offset: usize, radius: usize) -> String {
        if self.original.is_empty() {
            return String::new();
        }
        let source_offset = self.normalized.source_offset(offset).min(self.original.len());
        let source_offset = floor_char_boundary(&self.original, source_offset);

        let before: Vec<char> = self.original[..source_offset]
            .chars()
            .rev()
            .take(radius)
            .collect();
        let after = self.original[source_offset..].chars().take(radius);

        let raw: String = before.into_iter().rev().chain(after).collect();
        let squeezed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        truncate_chars(&squeezed, MAX_SNIPPET_CHARS)
    }
}

/// Cut to at most `max` chars, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_builds_empty_index() {
        let index = DocumentIndex::build("");
        assert!(index.is_empty());
        assert_eq!(index.token_count(), 0);
        assert!(!index.contains_phrase("viapol"));
        assert_eq!(index.context_around(0, 20), "");

        let punctuation_only = DocumentIndex::build(" ... --- ");
        assert!(punctuation_only.is_empty());
    }

    #[test]
    fn test_word_set_and_positions() {
        let index = DocumentIndex::build("A empresa Viapol forneceu; VIAPOL entregou.");
        assert!(index.contains_word("viapol"));
        assert!(index.word_set().contains("forneceu"));
        assert_eq!(index.word_positions("viapol").len(), 2);
        assert!(index.word_positions("ausente").is_empty());
    }

    #[test]
    fn test_phrase_search_respects_token_boundaries() {
        let index = DocumentIndex::build("Viapolimeros e Tintas Viapol Ltda");
        assert!(index.contains_substring("viapoli"));
        assert!(!index.contains_phrase("viapoli"));
        assert!(index.contains_phrase("viapol"));
        assert!(index.contains_phrase("viapol ltda"));
        assert_eq!(index.phrase_positions("viapol", 10), vec![22]);
    }

    #[test]
    fn test_phrase_positions_find_adjacent_repeats() {
        let index = DocumentIndex::build("ems ems ems");
        assert_eq!(index.phrase_positions("ems", 10), vec![0, 4, 8]);
        assert_eq!(index.phrase_positions("ems", 2), vec![0, 4]);
    }

    #[test]
    fn test_token_windows() {
        let index = DocumentIndex::build("Máquinas Furtan Ltda.");
        assert_eq!(index.token(1), Some("furtan"));
        assert_eq!(index.token_window(0, 2), Some("maquinas furtan"));
        assert_eq!(index.token_window(1, 5), None);
        assert_eq!(index.token_start(2), Some(16));
    }

    #[test]
    fn test_context_comes_from_original_text() {
        let text = "Relatório anual.\nA empresa Viapol forneceu os materiais.";
        let index = DocumentIndex::build(text);
        assert_eq!(index.original_text(), text);
        let offset = index.phrase_positions("viapol", 1)[0];
        let context = index.context_around(offset, 12);
        assert!(context.contains("Viapol"), "context was {:?}", context);
        assert!(!context.contains('\n'));
    }

    #[test]
    fn test_context_is_bounded() {
        let text = format!("{} Viapol {}", "palavra ".repeat(100), "outra ".repeat(100));
        let index = DocumentIndex::build(&text);
        let offset = index.phrase_positions("viapol", 1)[0];
        let context = index.context_around(offset, 500);
        assert!(context.chars().count() <= MAX_SNIPPET_CHARS);
        assert!(context.ends_with("..."));
    }

    #[test]
    fn test_normalized_window_is_char_safe() {
        let index = DocumentIndex::build("informações sobre EMS não se aplicam");
        let offset = index.phrase_positions("ems", 1)[0];
        let window = index.normalized_window(offset, 3, 20);
        assert!(window.contains("sobre ems nao"));
    }
}
