//! Error kinds shared by the conversion and training layers.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while preparing corpora or driving model training.
#[derive(Debug, Error)]
pub enum PrepError {
    /// A translation table or ontology file is missing or malformed.
    #[error("cannot load mapping {path}: {reason}")]
    MappingLoad { path: PathBuf, reason: String },

    /// An annotated entity could not be aligned to the document tokens.
    #[error("entity {entity_id} in document {doc_id}: {reason}")]
    SpanResolution {
        doc_id: String,
        entity_id: String,
        reason: String,
    },

    /// A relation references an entity that was not resolved in its document.
    #[error("relation {relation_id} in document {doc_id} references unknown entity {entity_id}")]
    RelationEndpoint {
        doc_id: String,
        relation_id: String,
        entity_id: String,
    },

    /// A relation id repeats within one document; the first one is kept.
    #[error("relation {relation_id} in document {doc_id} is a duplicate")]
    DuplicateRelation { doc_id: String, relation_id: String },

    /// A whole export record was rejected.
    #[error("document #{index} ({doc_id}): {reason}")]
    Document {
        index: usize,
        doc_id: String,
        reason: String,
    },

    /// Required configuration is absent or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collaborator training run failed.
    #[error("training {model} failed: {reason}")]
    ModelTraining { model: String, reason: String },

    /// A relation-augmented file could not be parsed back.
    #[error("malformed line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl PrepError {
    pub(crate) fn mapping(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MappingLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn training(model: impl Into<String>, reason: impl ToString) -> Self {
        Self::ModelTraining {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T, E = PrepError> = std::result::Result<T, E>;
