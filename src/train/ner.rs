//! Sequence tagger training sweep.

use tracing::info;

use super::{
    embeddings_for, main_metric, model_dir_name, SequenceTaggerTrainer, TaggerJob, TrainingReport,
};
use crate::{
    config::{CorpusFiles, ModelSection},
    error::{PrepError, Result},
    nlp::encode::DOCSTART,
};

pub const HIDDEN_SIZE: usize = 256;

/// Fail fast when a configured corpus file is absent.
pub(crate) fn ensure_corpus(corpus: &CorpusFiles) -> Result<()> {
    for path in [&corpus.train_file, &corpus.dev_file, &corpus.test_file] {
        if !path.is_file() {
            return Err(PrepError::Configuration(format!(
                "corpus file {} not found",
                path.display()
            )));
        }
    }
    Ok(())
}

pub fn tagger_job(section: &ModelSection, model: &str) -> TaggerJob {
    TaggerJob {
        embeddings: embeddings_for(model, &section.fine_tune_layers, section.fine_tune),
        corpus: section.corpus.clone(),
        tag_type: "ner".into(),
        document_separator: DOCSTART.into(),
        hidden_size: HIDDEN_SIZE,
        use_crf: false,
        use_rnn: false,
        reproject_embeddings: false,
        learning_rate: section.learning_rate,
        max_epochs: section.max_epochs,
        mini_batch_size: section.mini_batch_size,
        scheduler: "one_cycle".into(),
        main_evaluation_metric: main_metric(),
        output_dir: section
            .output_folder
            .join(model_dir_name("trained_model", model)),
    }
}

/// Train one tagger per configured model; failures are isolated per model.
pub fn train_taggers<T: SequenceTaggerTrainer>(
    section: &ModelSection,
    trainer: &T,
) -> Result<TrainingReport> {
    ensure_corpus(&section.corpus)?;
    let mut report = TrainingReport::default();
    for model in section.models.iter().filter(|model| !model.trim().is_empty()) {
        let job = tagger_job(section, model);
        info!(model = %model, output = %job.output_dir.display(), "training sequence tagger");
        report.record(model, || {
            std::fs::create_dir_all(&job.output_dir).map_err(|err| PrepError::training(model, err))?;
            trainer.train_tagger(&job)
        });
    }
    Ok(report)
}
