//! Offset-preserving word tokenizer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Tag carried by tokens outside any entity.
pub const OUTSIDE: &str = "O";

/// A token with character offsets into its document (`end` exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub tag: String,
}

/// Splits text into word tokens and single punctuation marks.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Rule-based tokenizer: words keep inner hyphens and apostrophes, every other
/// non-space character becomes its own token.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleTokenizer;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:['\-]\w+)*|[^\w\s]").expect("valid token regex"));

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut byte_cursor = 0;
        let mut char_cursor = 0;
        for found in TOKEN_PATTERN.find_iter(text) {
            char_cursor += text[byte_cursor..found.start()].chars().count();
            let len = found.as_str().chars().count();
            tokens.push(Token {
                text: found.as_str().to_string(),
                start: char_cursor,
                end: char_cursor + len,
                tag: OUTSIDE.to_string(),
            });
            char_cursor += len;
            byte_cursor = found.end();
        }
        tokens
    }
}

/// Slice `text` by character offsets, clamping to the text length.
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let mut indices = text.char_indices().map(|(idx, _)| idx).chain(std::iter::once(text.len()));
    let from = indices.nth(start).unwrap_or(text.len());
    let to = if end > start {
        indices.nth(end - start - 1).unwrap_or(text.len())
    } else {
        from
    };
    &text[from..to]
}
