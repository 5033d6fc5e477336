//! In-memory representation of an annotated document.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use super::tokenizer::Token;

/// Entity aligned to tokens. Token bounds are inclusive; `end_char` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub id: String,
    pub label: String,
    pub start_token: usize,
    pub end_token: usize,
    pub start_char: usize,
    pub end_char: usize,
}

impl EntitySpan {
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start_token <= other.end_token && other.start_token <= self.end_token
    }

    pub fn within(&self, first_token: usize, last_token: usize) -> bool {
        self.start_token >= first_token && self.end_token <= last_token
    }
}

/// Directed relation between two entities of the same document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub id: String,
    pub subject: String,
    pub object: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub id: String,
    pub text: String,
    pub tokens: Vec<Token>,
    pub entities: Vec<EntitySpan>,
    pub relations: IndexMap<String, Relation>,
}

impl AnnotatedDocument {
    pub fn entity(&self, id: &str) -> Option<&EntitySpan> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tokens.iter().map(|token| token.tag.as_str()).collect()
    }
}

/// Collect the `(subject type, object type)` pairs seen across relations.
pub fn entity_pair_labels(documents: &[AnnotatedDocument]) -> BTreeSet<(String, String)> {
    let mut pairs = BTreeSet::new();
    for doc in documents {
        for relation in doc.relations.values() {
            if let (Some(subject), Some(object)) = (doc.entity(&relation.subject), doc.entity(&relation.object)) {
                pairs.insert((subject.label.clone(), object.label.clone()));
            }
        }
    }
    pairs
}
