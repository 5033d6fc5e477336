//! CLI entry-points for the model training sweeps.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument, warn};

use crate::{
    config::{Settings, TrainingConfig},
    train::{self, backend::CommandTrainer, TrainingReport},
};

/// Args shared by the training commands.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Training YAML; defaults to `CONFIG_YAML_PATH`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn load_config(args: &Args, settings: &Settings) -> Result<TrainingConfig> {
    let config = match &args.config {
        Some(path) => TrainingConfig::load(path)?,
        None => settings.training_config()?,
    };
    Ok(config)
}

fn finish(kind: &str, report: TrainingReport) -> Result<()> {
    info!(kind, trained = report.trained.len(), failed = report.failed.len(), "training finished");
    for (model, reason) in &report.failed {
        warn!(kind, model = %model, %reason, "model failed");
    }
    if report.all_failed() {
        bail!("every {kind} model failed to train");
    }
    Ok(())
}

#[instrument(skip(settings))]
pub fn run_ner(args: Args, settings: Settings) -> Result<()> {
    let config = load_config(&args, &settings)?;
    let section = config.ner()?;
    let trainer = CommandTrainer::from_config(&config.backend);
    finish("ner", train::ner::train_taggers(section, &trainer)?)
}

#[instrument(skip(settings))]
pub fn run_relations(args: Args, settings: Settings) -> Result<()> {
    let config = load_config(&args, &settings)?;
    let section = config.relations()?;
    let trainer = CommandTrainer::from_config(&config.backend);
    finish("relation", train::relation::train_relation_classifiers(section, &trainer)?)
}

#[instrument(skip(settings))]
pub fn run_embeddings(args: Args, settings: Settings) -> Result<()> {
    let config = load_config(&args, &settings)?;
    let section = config.word2vec()?;
    let trainer = CommandTrainer::from_config(&config.backend);
    finish("word2vec", train::word2vec::train_word2vec(section, &trainer)?)
}
