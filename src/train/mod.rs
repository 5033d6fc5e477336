//! Model training orchestration over external trainers.
//!
//! Fitting itself is delegated to collaborators behind the traits below. This
//! layer builds their jobs, lays out output directories and keeps one failing
//! model from stopping the others.

pub mod backend;
pub mod ner;
pub mod relation;
pub mod word2vec;

use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, info};

use crate::{config::CorpusFiles, error::Result};

/// Token limit passed to the transformer encoders.
pub const MODEL_MAX_LENGTH: usize = 512;
/// Metric used to pick the best epoch.
pub const MAIN_EVALUATION_METRIC: (&str, &str) = ("macro avg", "f1-score");

/// Transformer encoder settings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbeddingSpec {
    pub model: String,
    pub layers: String,
    pub fine_tune: bool,
    pub model_max_length: usize,
}

/// Sequence tagger fitting job.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaggerJob {
    pub embeddings: EmbeddingSpec,
    pub corpus: CorpusFiles,
    pub tag_type: String,
    pub document_separator: String,
    pub hidden_size: usize,
    pub use_crf: bool,
    pub use_rnn: bool,
    pub reproject_embeddings: bool,
    pub learning_rate: f64,
    pub max_epochs: u32,
    pub mini_batch_size: u32,
    pub scheduler: String,
    pub main_evaluation_metric: (String, String),
    pub output_dir: PathBuf,
}

/// Relation classifier fitting job.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelationJob {
    pub embeddings: EmbeddingSpec,
    pub corpus: CorpusFiles,
    pub label_type: String,
    pub entity_label_type: String,
    pub entity_pair_labels: Vec<(String, String)>,
    pub allow_unk_tag: bool,
    pub cross_augmentation: bool,
    pub encoding_strategy: String,
    pub learning_rate: f64,
    pub max_epochs: u32,
    pub mini_batch_size: u32,
    pub main_evaluation_metric: (String, String),
    pub reduce_transformer_vocab: bool,
    pub output_dir: PathBuf,
}

/// Word-embedding fitting job.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbeddingJob {
    /// One space-separated sentence per line.
    pub sentences_file: PathBuf,
    pub epochs: u32,
    pub window: u32,
    pub vector_size: u32,
    pub min_count: u32,
    pub sample: f64,
    pub alpha: f64,
    pub min_alpha: f64,
    pub negative: u32,
    pub workers: usize,
    pub output_file: PathBuf,
}

pub trait SequenceTaggerTrainer {
    /// Fit and persist a tagger; returns the artefact location.
    fn train_tagger(&self, job: &TaggerJob) -> Result<PathBuf>;
}

pub trait RelationClassifierTrainer {
    fn train_relation_classifier(&self, job: &RelationJob) -> Result<PathBuf>;
}

pub trait EmbeddingTrainer {
    fn train_embeddings(&self, job: &EmbeddingJob) -> Result<PathBuf>;
}

/// Per-model outcome of a training sweep.
#[derive(Debug, Default, Clone)]
pub struct TrainingReport {
    pub trained: Vec<(String, PathBuf)>,
    pub failed: Vec<(String, String)>,
}

impl TrainingReport {
    /// Run `train` and record its outcome without propagating failure.
    pub fn record<F>(&mut self, name: &str, train: F)
    where
        F: FnOnce() -> Result<PathBuf>,
    {
        match train() {
            Ok(path) => {
                info!(model = name, path = %path.display(), "model trained and saved");
                self.trained.push((name.to_string(), path));
            }
            Err(err) => {
                error!(model = name, %err, "error during training");
                self.failed.push((name.to_string(), err.to_string()));
            }
        }
    }

    pub fn all_failed(&self) -> bool {
        self.trained.is_empty() && !self.failed.is_empty()
    }
}

/// Directory-safe form of a model identifier such as `org/model`.
pub fn model_dir_name(prefix: &str, model: &str) -> String {
    format!("{prefix}_{}", model.trim().replace('/', "_"))
}

fn embeddings_for(model: &str, layers: &str, fine_tune: bool) -> EmbeddingSpec {
    EmbeddingSpec {
        model: model.trim().to_string(),
        layers: layers.to_string(),
        fine_tune,
        model_max_length: MODEL_MAX_LENGTH,
    }
}

fn main_metric() -> (String, String) {
    (
        MAIN_EVALUATION_METRIC.0.to_string(),
        MAIN_EVALUATION_METRIC.1.to_string(),
    )
}
