//! Sentence segmentation and serialization into training files.

use std::{fmt, fs, path::Path, str::FromStr};

use tracing::{debug, info};

use super::{document::AnnotatedDocument, tags, tokenizer::char_slice};
use crate::error::{PrepError, Result};

/// Column declaration written at the top of relation-augmented files.
pub const COLUMNS_HEADER: &str = "# global.columns = id form ner";
/// Document separator of the plain tag-per-line format.
pub const DOCSTART: &str = "-DOCSTART-";

const TEXT_PREFIX: &str = "# text = ";
const RELATIONS_PREFIX: &str = "# relations = ";

/// Training file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Header, `# text =` and `# relations =` comments, `id form ner` rows.
    /// Only relation-bearing sentences are kept.
    Conllu,
    /// `form ner` rows with a `-DOCSTART-` marker per document; every sentence kept.
    Plain,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Conllu => "conllu",
            Self::Plain => "bioes",
        }
    }
}

/// Relation expressed in 1-indexed, inclusive sentence-local token positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodedRelation {
    pub subject_start: usize,
    pub subject_end: usize,
    pub object_start: usize,
    pub object_end: usize,
    pub label: String,
}

impl fmt::Display for EncodedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{}",
            self.subject_start, self.subject_end, self.object_start, self.object_end, self.label
        )
    }
}

impl FromStr for EncodedRelation {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = value.splitn(5, ';').collect();
        let [s1, s2, o1, o2, label] = parts.as_slice() else {
            return Err(format!("expected 5 ';'-separated fields in {value:?}"));
        };
        let position = |raw: &str| {
            raw.trim()
                .parse::<usize>()
                .map_err(|err| format!("bad position {raw:?}: {err}"))
        };
        Ok(Self {
            subject_start: position(*s1)?,
            subject_end: position(*s2)?,
            object_start: position(*o1)?,
            object_end: position(*o2)?,
            label: label.trim().to_string(),
        })
    }
}

/// Join relations into the `# relations =` field.
pub fn format_relations(relations: &[EncodedRelation]) -> String {
    relations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

pub fn parse_relations(field: &str) -> std::result::Result<Vec<EncodedRelation>, String> {
    if field.trim().is_empty() {
        return Ok(Vec::new());
    }
    field.split('|').map(EncodedRelation::from_str).collect()
}

/// Inclusive token range of one sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceBounds {
    pub first: usize,
    pub last: usize,
}

/// Split at tokens that are exactly `.` or `?`; trailing tokens form a final sentence.
///
/// Entities are not consulted, so an entity containing a `.` token such as
/// "Dr. Smith" is cut in two: the first sentence ends inside it and the next
/// one starts with its `E-` tag. Relations touching such an entity are never
/// within a single sentence and are not emitted.
pub fn sentence_bounds(doc: &AnnotatedDocument) -> Vec<SentenceBounds> {
    let mut bounds = Vec::new();
    let mut first = 0;
    for (idx, token) in doc.tokens.iter().enumerate() {
        if token.text == "." || token.text == "?" {
            bounds.push(SentenceBounds { first, last: idx });
            first = idx + 1;
        }
    }
    if first < doc.tokens.len() {
        bounds.push(SentenceBounds {
            first,
            last: doc.tokens.len() - 1,
        });
    }
    bounds
}

/// Relations whose endpoints both lie inside the sentence, re-based to it.
pub fn sentence_relations(doc: &AnnotatedDocument, bounds: SentenceBounds) -> Vec<EncodedRelation> {
    let local = |token: usize| token - bounds.first + 1;
    doc.relations
        .values()
        .filter_map(|relation| {
            let subject = doc.entity(&relation.subject)?;
            let object = doc.entity(&relation.object)?;
            if !subject.within(bounds.first, bounds.last) || !object.within(bounds.first, bounds.last) {
                return None;
            }
            Some(EncodedRelation {
                subject_start: local(subject.start_token),
                subject_end: local(subject.end_token),
                object_start: local(object.start_token),
                object_end: local(object.end_token),
                label: relation.label.clone(),
            })
        })
        .collect()
}

/// Serialize one document without the file header.
pub fn encode_document(doc: &AnnotatedDocument, format: OutputFormat) -> String {
    let tags = tags::iob_to_bioes(doc.tags().as_slice());
    let mut out = String::new();
    if format == OutputFormat::Plain {
        out.push_str(DOCSTART);
        out.push_str("\tO\n\n");
    }
    let mut dropped = 0usize;
    for bounds in sentence_bounds(doc) {
        for entity in doc
            .entities
            .iter()
            .filter(|entity| entity.start_token <= bounds.last && entity.end_token > bounds.last)
        {
            debug!(doc_id = %doc.id, entity_id = %entity.id, boundary = bounds.last, "sentence boundary inside entity");
        }
        match format {
            OutputFormat::Conllu => {
                let relations = sentence_relations(doc, bounds);
                if relations.is_empty() {
                    dropped += 1;
                    continue;
                }
                let first = &doc.tokens[bounds.first];
                let last = &doc.tokens[bounds.last];
                let text = char_slice(&doc.text, first.start, last.end).replace(['\n', '\r'], " ");
                out.push_str(&format!("{TEXT_PREFIX}{text}\n"));
                out.push_str(&format!("{RELATIONS_PREFIX}{}\n", format_relations(&relations)));
                for (position, idx) in (bounds.first..=bounds.last).enumerate() {
                    out.push_str(&format!("{}\t{}\t{}\n", position + 1, doc.tokens[idx].text, tags[idx]));
                }
            }
            OutputFormat::Plain => {
                for idx in bounds.first..=bounds.last {
                    out.push_str(&format!("{}\t{}\n", doc.tokens[idx].text, tags[idx]));
                }
            }
        }
        out.push('\n');
    }
    if dropped > 0 {
        debug!(doc_id = %doc.id, dropped, "sentences without relations dropped");
    }
    out
}

/// Serialize a sequence of documents into one training file body.
pub fn encode(documents: &[AnnotatedDocument], format: OutputFormat) -> String {
    let mut out = String::new();
    if format == OutputFormat::Conllu {
        out.push_str(COLUMNS_HEADER);
        out.push('\n');
    }
    for doc in documents {
        out.push_str(&encode_document(doc, format));
    }
    out
}

pub fn write_corpus(path: &Path, documents: &[AnnotatedDocument], format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode(documents, format))?;
    info!(path = %path.display(), documents = documents.len(), ?format, "wrote training file");
    Ok(())
}

/// A sentence block read back from a relation-augmented file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceBlock {
    pub text: String,
    pub relations: Vec<EncodedRelation>,
    /// `(form, tag)` per token in position order.
    pub tokens: Vec<(String, String)>,
}

/// Parse a relation-augmented file body into sentence blocks.
pub fn parse_blocks(content: &str) -> Result<Vec<SentenceBlock>> {
    let mut blocks = Vec::new();
    let mut current = SentenceBlock::default();
    let mut in_block = false;
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let format_err = |reason: String| PrepError::Format { line: line_no, reason };
        if line.trim().is_empty() {
            if in_block {
                blocks.push(std::mem::take(&mut current));
                in_block = false;
            }
            continue;
        }
        in_block = true;
        if let Some(text) = line.strip_prefix(TEXT_PREFIX) {
            current.text = text.to_string();
        } else if let Some(field) = line.strip_prefix(RELATIONS_PREFIX) {
            current.relations = parse_relations(field).map_err(format_err)?;
        } else if line.starts_with('#') {
            if current.tokens.is_empty() && current.text.is_empty() && current.relations.is_empty() {
                in_block = false;
            }
        } else {
            let fields: Vec<&str> = line.split('\t').collect();
            let [position, form, tag] = fields.as_slice() else {
                return Err(format_err(format!("expected 3 tab-separated columns, got {}", fields.len())));
            };
            let position: usize = position
                .parse()
                .map_err(|_| format_err(format!("bad token position {position:?}")))?;
            if position != current.tokens.len() + 1 {
                return Err(format_err(format!(
                    "token position {position} out of sequence"
                )));
            }
            current.tokens.push((form.to_string(), tag.to_string()));
        }
    }
    if in_block {
        blocks.push(current);
    }
    Ok(blocks)
}
