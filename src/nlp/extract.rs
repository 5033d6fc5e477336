//! Resolution of exported entity spans and relations onto tokenized documents.

use std::{
    collections::{BTreeSet, HashSet},
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{
    document::{AnnotatedDocument, EntitySpan, Relation},
    tokenizer::{char_slice, Token, Tokenizer},
};
use crate::{
    data::{
        labelbox::{EntityObject, ExportRecord, RelationshipObject},
        mapping::LabelMapper,
    },
    error::{PrepError, Result},
};

/// How side files are opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// Audit outputs written at the end of an extraction pass.
#[derive(Debug, Clone)]
pub struct SideFiles {
    pub entity_locations: PathBuf,
    pub relations: PathBuf,
    pub mode: WriteMode,
}

/// Row of the entity-locations audit file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntityLocationRow {
    pub entity_id: String,
    pub start_token: usize,
    pub end_token: usize,
    pub label: String,
    pub source_text: String,
}

/// Row of the relations audit file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelationRow {
    pub relation_id: String,
    pub label: String,
    pub subject_id: String,
    pub object_id: String,
    pub document_text: String,
    pub document_id: String,
}

/// Outcome of one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    pub documents: Vec<AnnotatedDocument>,
    /// Lower-cased raw relation labels encountered in the export.
    pub relation_labels: BTreeSet<String>,
    pub entity_rows: Vec<EntityLocationRow>,
    pub relation_rows: Vec<RelationRow>,
}

pub struct Extractor<'a, T: Tokenizer> {
    mapper: &'a LabelMapper,
    tokenizer: T,
    side_files: Option<SideFiles>,
}

impl<'a, T: Tokenizer> Extractor<'a, T> {
    pub fn new(mapper: &'a LabelMapper, tokenizer: T) -> Self {
        Self {
            mapper,
            tokenizer,
            side_files: None,
        }
    }

    pub fn with_side_files(mut self, side_files: SideFiles) -> Self {
        self.side_files = Some(side_files);
        self
    }

    /// Convert export records into annotated documents.
    ///
    /// Entities and relations that cannot be resolved are logged and skipped;
    /// a record that cannot be used at all is logged and left out.
    pub fn extract(&self, records: &[ExportRecord]) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        let mut seen_ids = HashSet::new();
        for (index, record) in records.iter().enumerate() {
            if !seen_ids.insert(record.id.as_str()) {
                let err = PrepError::Document {
                    index,
                    doc_id: record.id.clone(),
                    reason: "duplicate document id".into(),
                };
                error!(%err, text = %record.text, "skipping document");
                continue;
            }
            self.extract_one(record, &mut extraction);
        }
        info!(
            documents = extraction.documents.len(),
            entities = extraction.entity_rows.len(),
            relations = extraction.relation_rows.len(),
            "extraction finished"
        );
        if let Some(side_files) = &self.side_files {
            write_rows(&side_files.entity_locations, &extraction.entity_rows, side_files.mode)?;
            write_rows(&side_files.relations, &extraction.relation_rows, side_files.mode)?;
        }
        Ok(extraction)
    }

    fn extract_one(&self, record: &ExportRecord, extraction: &mut Extraction) {
        let mut tokens = self.tokenizer.tokenize(&record.text);
        let mut entities: Vec<EntitySpan> = Vec::new();
        for object in &record.label.objects {
            match self.resolve_entity(record, &tokens, object, &entities) {
                Ok(span) => {
                    extraction.entity_rows.push(EntityLocationRow {
                        entity_id: span.id.clone(),
                        start_token: span.start_token,
                        end_token: span.end_token,
                        label: span.label.clone(),
                        source_text: char_slice(&record.text, span.start_char, span.end_char).to_string(),
                    });
                    entities.push(span);
                }
                Err(err) => warn!(%err, doc_id = %record.id, "skipping entity"),
            }
        }
        assign_iob_tags(&mut tokens, &entities);

        let mut relations: IndexMap<String, Relation> = IndexMap::new();
        for relationship in &record.label.relationships {
            if let Some(label) = &relationship.data.label {
                extraction.relation_labels.insert(label.to_lowercase());
            }
            if relations.contains_key(&relationship.feature_id) {
                let err = PrepError::DuplicateRelation {
                    doc_id: record.id.clone(),
                    relation_id: relationship.feature_id.clone(),
                };
                warn!(%err, "skipping relation");
                continue;
            }
            match self.resolve_relation(record, relationship, &entities) {
                Ok(relation) => {
                    extraction.relation_rows.push(RelationRow {
                        relation_id: relation.id.clone(),
                        label: relation.label.clone(),
                        subject_id: relation.subject.clone(),
                        object_id: relation.object.clone(),
                        document_text: record.text.clone(),
                        document_id: record.id.clone(),
                    });
                    relations.insert(relation.id.clone(), relation);
                }
                Err(err) => warn!(%err, "skipping relation"),
            }
        }

        debug!(doc_id = %record.id, tokens = tokens.len(), entities = entities.len(), relations = relations.len(), "document extracted");
        extraction.documents.push(AnnotatedDocument {
            id: record.id.clone(),
            text: record.text.clone(),
            tokens,
            entities,
            relations,
        });
    }

    fn resolve_entity(
        &self,
        record: &ExportRecord,
        tokens: &[Token],
        object: &EntityObject,
        accepted: &[EntitySpan],
    ) -> Result<EntitySpan> {
        let fail = |reason: String| PrepError::SpanResolution {
            doc_id: record.id.clone(),
            entity_id: object.feature_id.clone(),
            reason,
        };
        let location = object.data.location;
        let (first, last) = expand_to_tokens(tokens, record.text.chars().count(), location.start, location.end)
            .map_err(&fail)?;
        let span = EntitySpan {
            id: object.feature_id.clone(),
            label: self.mapper.entity_label(&object.title),
            start_token: first,
            end_token: last,
            start_char: location.start,
            end_char: location.end + 1,
        };
        if accepted.iter().any(|other| other.id == span.id) {
            return Err(fail("duplicate entity id".into()));
        }
        if let Some(other) = accepted.iter().find(|other| other.overlaps(&span)) {
            return Err(fail(format!("overlaps entity {}", other.id)));
        }
        Ok(span)
    }

    fn resolve_relation(
        &self,
        record: &ExportRecord,
        relationship: &RelationshipObject,
        entities: &[EntitySpan],
    ) -> Result<Relation> {
        let data = &relationship.data;
        for endpoint in [&data.source, &data.target] {
            if !entities.iter().any(|entity| &entity.id == endpoint) {
                return Err(PrepError::RelationEndpoint {
                    doc_id: record.id.clone(),
                    relation_id: relationship.feature_id.clone(),
                    entity_id: endpoint.clone(),
                });
            }
        }
        Ok(Relation {
            id: relationship.feature_id.clone(),
            subject: data.source.clone(),
            object: data.target.clone(),
            label: self.mapper.relation_label(data.label.as_deref()),
        })
    }
}

/// Align an inclusive character range to the tokens it touches, widening it
/// outwards to token boundaries. Returns inclusive token indices.
pub fn expand_to_tokens(
    tokens: &[Token],
    text_len: usize,
    start: usize,
    end: usize,
) -> std::result::Result<(usize, usize), String> {
    if start > end {
        return Err(format!("start {start} is after end {end}"));
    }
    if end >= text_len {
        return Err(format!("end {end} is outside text of length {text_len}"));
    }
    let first = tokens.iter().position(|token| token.end > start);
    let last = tokens.iter().rposition(|token| token.start <= end);
    match (first, last) {
        (Some(first), Some(last)) if first <= last => Ok((first, last)),
        _ => Err(format!("characters {start}..={end} cover no token")),
    }
}

/// Tag covered tokens `B-`/`I-` and everything else `O`.
pub fn assign_iob_tags(tokens: &mut [Token], entities: &[EntitySpan]) {
    for token in tokens.iter_mut() {
        token.tag = super::tokenizer::OUTSIDE.to_string();
    }
    for entity in entities {
        for (offset, token) in tokens[entity.start_token..=entity.end_token].iter_mut().enumerate() {
            let prefix = if offset == 0 { "B" } else { "I" };
            token.tag = format!("{prefix}-{}", entity.label);
        }
    }
}

fn write_rows<R: Serialize>(path: &Path, rows: &[R], mode: WriteMode) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = match mode {
        WriteMode::Overwrite => OpenOptions::new().create(true).write(true).truncate(true).open(path)?,
        WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
    };
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote side file");
    Ok(())
}
