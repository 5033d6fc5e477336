#![allow(dead_code)]

use ner_relation_prep::{
    data::{
        labelbox::ExportRecord,
        mapping::{LabelMapper, Ontology, TranslationTable},
    },
    nlp::{extract::Extractor, tokenizer::RuleTokenizer, document::AnnotatedDocument},
};
use serde_json::json;

pub const TEXT: &str = "Alice works at Acme Corp. It rains today.";

pub fn mapper() -> LabelMapper {
    LabelMapper::new(
        TranslationTable::from_pairs([("Person", "PER"), ("Organisation", "ORG")]),
        TranslationTable::from_pairs([("WorksFor", "employment")]),
        Ontology::from_pairs([("employment", "organisation_link")]),
        "unclassified",
    )
}

pub fn record(id: &str, text: &str, entities: serde_json::Value, relations: serde_json::Value) -> ExportRecord {
    serde_json::from_value(json!({
        "ID": id,
        "Labeled Data": text,
        "Label": { "objects": entities, "relationships": relations }
    }))
    .expect("valid export record")
}

pub fn entity(id: &str, title: &str, start: usize, end: usize) -> serde_json::Value {
    json!({ "featureId": id, "title": title, "data": { "location": { "start": start, "end": end } } })
}

pub fn relation(id: &str, source: &str, target: &str, label: Option<&str>) -> serde_json::Value {
    match label {
        Some(label) => json!({ "featureId": id, "data": { "source": source, "target": target, "label": label } }),
        None => json!({ "featureId": id, "data": { "source": source, "target": target } }),
    }
}

/// Alice (PER) works for Acme Corp (ORG), second sentence without relations.
pub fn sample_record(id: &str) -> ExportRecord {
    record(
        id,
        TEXT,
        json!([entity("e1", "Person", 0, 4), entity("e2", "Organisation", 15, 23)]),
        json!([relation("r1", "e1", "e2", Some("WorksFor"))]),
    )
}

pub fn extract(records: &[ExportRecord]) -> Vec<AnnotatedDocument> {
    let mapper = mapper();
    Extractor::new(&mapper, RuleTokenizer)
        .extract(records)
        .expect("extraction succeeds")
        .documents
}
