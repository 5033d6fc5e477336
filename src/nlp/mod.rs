//! Annotation-to-training-corpus conversion layer.

pub mod clean;
pub mod document;
pub mod encode;
pub mod extract;
pub mod phrases;
pub mod split;
pub mod tags;
pub mod tokenizer;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::Settings,
    data::{labelbox, mapping::LabelMapper},
};
use encode::OutputFormat;
use extract::{Extractor, SideFiles, WriteMode};
use split::{SplitRatios, WrittenSplit};
use tokenizer::RuleTokenizer;

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub input: PathBuf,
    pub format: OutputFormat,
    pub ratios: SplitRatios,
    pub seed: u64,
    pub side_file_mode: WriteMode,
    /// Suffix of the partition file names, usually the run date.
    pub file_tag: String,
}

/// Summary of an export run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub documents: usize,
    pub files: WrittenSplit,
    pub entity_pairs: PathBuf,
    pub relation_labels: Vec<String>,
}

/// Extract an annotation export and write train/dev/test files plus side files.
pub fn export_training_data(
    settings: &Settings,
    mapper: &LabelMapper,
    options: &ExportOptions,
) -> Result<ExportReport> {
    let records = labelbox::read_export(&options.input)?;
    let extractor = Extractor::new(mapper, RuleTokenizer).with_side_files(SideFiles {
        entity_locations: settings.join_output("entity_locations.csv"),
        relations: settings.join_output("relations.csv"),
        mode: options.side_file_mode,
    });
    let extraction = extractor.extract(&records).context("extracting annotations")?;
    let documents = extraction.documents.len();
    let relation_labels: Vec<String> = extraction.relation_labels.into_iter().collect();
    info!(labels = relation_labels.len(), "distinct raw relation labels");

    let pairs = document::entity_pair_labels(&extraction.documents);
    let entity_pairs = settings.join_output("entity_pairs.json");
    write_entity_pairs(&entity_pairs, &pairs)?;

    let files = split::split_and_write(
        extraction.documents,
        options.ratios,
        options.seed,
        &settings.outputs_dir,
        &options.file_tag,
        options.format,
    )
    .context("writing training partitions")?;

    Ok(ExportReport {
        documents,
        files,
        entity_pairs,
        relation_labels,
    })
}

fn write_entity_pairs(
    path: &Path,
    pairs: &std::collections::BTreeSet<(String, String)>,
) -> Result<()> {
    let pairs: Vec<&(String, String)> = pairs.iter().collect();
    let json = serde_json::to_string_pretty(&pairs)?;
    std::fs::write(path, json).with_context(|| format!("write {path:?}"))?;
    info!(path = %path.display(), pairs = pairs.len(), "wrote entity pair map");
    Ok(())
}
