//! Relation classifier training sweep.

use std::{fs, path::Path};

use tracing::info;

use super::{
    embeddings_for, main_metric, model_dir_name, ner::ensure_corpus, RelationClassifierTrainer,
    RelationJob, TrainingReport,
};
use crate::{
    config::RelationSection,
    error::{PrepError, Result},
};

/// Read the `(subject type, object type)` pairs written by `export`.
pub fn load_entity_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let raw = fs::read_to_string(path).map_err(|err| {
        PrepError::Configuration(format!("entity label map {}: {err}", path.display()))
    })?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn relation_job(
    section: &RelationSection,
    model: &str,
    entity_pairs: &[(String, String)],
) -> RelationJob {
    let params = &section.model;
    RelationJob {
        embeddings: embeddings_for(model, &params.fine_tune_layers, params.fine_tune),
        corpus: params.corpus.clone(),
        label_type: "relation".into(),
        entity_label_type: "ner".into(),
        entity_pair_labels: entity_pairs.to_vec(),
        allow_unk_tag: true,
        cross_augmentation: true,
        encoding_strategy: "typed_entity_marker".into(),
        learning_rate: params.learning_rate,
        max_epochs: params.max_epochs,
        mini_batch_size: params.mini_batch_size,
        main_evaluation_metric: main_metric(),
        reduce_transformer_vocab: false,
        output_dir: params
            .output_folder
            .join(model_dir_name("relation_model", model)),
    }
}

/// Train one relation classifier per configured model; failures are isolated.
pub fn train_relation_classifiers<T: RelationClassifierTrainer>(
    section: &RelationSection,
    trainer: &T,
) -> Result<TrainingReport> {
    ensure_corpus(&section.model.corpus)?;
    let entity_pairs = load_entity_pairs(&section.entity_label_map_path)?;
    info!(pairs = entity_pairs.len(), "loaded entity pair map");
    let mut report = TrainingReport::default();
    for model in section.model.models.iter().filter(|model| !model.trim().is_empty()) {
        let job = relation_job(section, model, &entity_pairs);
        info!(model = %model, output = %job.output_dir.display(), "training relation classifier");
        report.record(model, || {
            fs::create_dir_all(&job.output_dir).map_err(|err| PrepError::training(model, err))?;
            trainer.train_relation_classifier(&job)
        });
    }
    Ok(report)
}
