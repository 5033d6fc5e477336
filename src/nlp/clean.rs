//! Raw-text cleanup producing tokenized sentences for embedding training.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentences with fewer space-separated words are discarded.
pub const MIN_SENTENCE_WORDS: usize = 5;

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[(\[].*?[)\]]").expect("valid regex"));
static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w[?.](\s)").expect("valid regex"));

/// Split after a word character followed by `.` or `?` and whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut from = 0;
    for captures in SENTENCE_END.captures_iter(text) {
        if let Some(space) = captures.get(1) {
            parts.push(&text[from..space.start()]);
            from = space.end();
        }
    }
    parts.push(&text[from..]);
    parts
}

/// Remove asides and ellipses, split into sentences, drop short ones, then
/// lower-case and strip ASCII punctuation.
pub fn clean_text(text: &str) -> Vec<String> {
    let without_asides = BRACKETED.replace_all(text, "");
    let without_ellipses = without_asides.replace("...", "");
    split_sentences(&without_ellipses)
        .into_iter()
        .map(str::trim)
        .filter(|sentence| sentence.split(' ').count() >= MIN_SENTENCE_WORDS)
        .map(|sentence| {
            sentence
                .chars()
                .filter(|ch| !ch.is_ascii_punctuation())
                .flat_map(char::to_lowercase)
                .collect()
        })
        .collect()
}

/// Whitespace tokenization with optional stop-word removal.
pub fn tokenize_sentence(sentence: &str, stopwords: &HashSet<String>) -> Vec<String> {
    sentence
        .split_whitespace()
        .filter(|word| !stopwords.contains(*word))
        .map(str::to_string)
        .collect()
}
