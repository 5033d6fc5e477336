//! Collocation detection joining frequent word pairs into single tokens.

use std::collections::HashMap;

use tracing::debug;

pub const PHRASE_DELIMITER: &str = "_";

#[derive(Debug, Clone)]
pub struct PhraseModel {
    unigrams: HashMap<String, u64>,
    bigrams: HashMap<(String, String), u64>,
    min_count: u64,
    threshold: f64,
}

impl PhraseModel {
    /// Count unigrams and adjacent pairs over `sentences`.
    pub fn learn(sentences: &[Vec<String>], min_count: u64, threshold: f64) -> Self {
        let mut unigrams: HashMap<String, u64> = HashMap::new();
        let mut bigrams: HashMap<(String, String), u64> = HashMap::new();
        for sentence in sentences {
            for word in sentence {
                *unigrams.entry(word.clone()).or_default() += 1;
            }
            for pair in sentence.windows(2) {
                *bigrams.entry((pair[0].clone(), pair[1].clone())).or_default() += 1;
            }
        }
        debug!(unigrams = unigrams.len(), bigrams = bigrams.len(), "phrase vocabulary built");
        Self {
            unigrams,
            bigrams,
            min_count,
            threshold,
        }
    }

    pub fn vocab_size(&self) -> usize {
        self.unigrams.len() + self.bigrams.len()
    }

    /// `(count(ab) - min_count) / count(a) / count(b) * vocab_size`, or `None`
    /// for an unseen pair.
    pub fn score(&self, first: &str, second: &str) -> Option<f64> {
        let pair = *self.bigrams.get(&(first.to_string(), second.to_string()))?;
        let a = *self.unigrams.get(first)? as f64;
        let b = *self.unigrams.get(second)? as f64;
        Some((pair as f64 - self.min_count as f64) / a / b * self.vocab_size() as f64)
    }

    /// Join scoring pairs left to right; a word takes part in at most one phrase.
    pub fn apply(&self, sentence: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(sentence.len());
        let mut idx = 0;
        while idx < sentence.len() {
            if let Some(next) = sentence.get(idx + 1) {
                if self
                    .score(&sentence[idx], next)
                    .is_some_and(|score| score > self.threshold)
                {
                    out.push(format!("{}{PHRASE_DELIMITER}{}", sentence[idx], next));
                    idx += 2;
                    continue;
                }
            }
            out.push(sentence[idx].clone());
            idx += 1;
        }
        out
    }
}
