//! CLI entry-point for converting annotation exports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use super::{CorpusFormat, SideFileMode};
use crate::{
    config::Settings,
    nlp::{self, split::SplitRatios, ExportOptions},
};

/// Args for the `export` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// JSON export; defaults to `<DATA_DIR>/export.json`.
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Output layout.
    #[arg(long, default_value = "conllu", value_enum)]
    pub format: CorpusFormat,
    /// Shuffle seed; defaults to `SPLIT_SEED`.
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long, default_value_t = 0.65)]
    pub train_ratio: f64,
    #[arg(long, default_value_t = 0.15)]
    pub dev_ratio: f64,
    #[arg(long, default_value_t = 0.20)]
    pub test_ratio: f64,
    /// Open entity/relation audit files in this mode.
    #[arg(long, default_value = "overwrite", value_enum)]
    pub side_files: SideFileMode,
    /// Suffix for partition file names; defaults to today's date.
    #[arg(long)]
    pub tag: Option<String>,
}

#[instrument(skip(settings))]
pub fn run(args: Args, settings: Settings) -> Result<()> {
    let mapper = settings.load_mapper().context("loading label mappings")?;
    let options = ExportOptions {
        input: args
            .input
            .unwrap_or_else(|| settings.join_data("export.json")),
        format: args.format.into(),
        ratios: SplitRatios {
            train: args.train_ratio,
            dev: args.dev_ratio,
            test: args.test_ratio,
        },
        seed: args.seed.unwrap_or(settings.split_seed),
        side_file_mode: args.side_files.into(),
        file_tag: args
            .tag
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
    };
    let report = nlp::export_training_data(&settings, &mapper, &options)?;
    info!(
        documents = report.documents,
        train = %report.files.train.display(),
        dev = %report.files.dev.display(),
        test = %report.files.test.display(),
        pairs = %report.entity_pairs.display(),
        "export finished"
    );
    Ok(())
}
