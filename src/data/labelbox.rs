//! Labelling-tool export records as they arrive on disk.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One annotated document of the JSON export.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Labeled Data")]
    pub text: String,
    #[serde(rename = "Label", default)]
    pub label: LabelPayload,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LabelPayload {
    #[serde(default)]
    pub objects: Vec<EntityObject>,
    #[serde(default)]
    pub relationships: Vec<RelationshipObject>,
}

/// Annotated entity; `end` is an inclusive character offset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityObject {
    #[serde(rename = "featureId")]
    pub feature_id: String,
    pub title: String,
    pub data: EntityData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EntityData {
    pub location: Location,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationshipObject {
    #[serde(rename = "featureId")]
    pub feature_id: String,
    pub data: RelationshipData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelationshipData {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Read a whole export file.
pub fn read_export(path: &Path) -> Result<Vec<ExportRecord>> {
    let file = File::open(path).with_context(|| format!("open export {path:?}"))?;
    let records: Vec<ExportRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse export {path:?}"))?;
    info!(path = %path.display(), records = records.len(), "loaded annotation export");
    Ok(records)
}
