//! CLI entry-point for summarising relation-augmented files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use indexmap::IndexMap;
use tracing::instrument;

use crate::nlp::encode;

/// Args for the `inspect` command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Files written by `export --format conllu`.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[instrument]
pub fn run(args: Args) -> Result<()> {
    for path in &args.files {
        let content = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        let blocks = encode::parse_blocks(&content).with_context(|| format!("parse {path:?}"))?;
        let tokens: usize = blocks.iter().map(|block| block.tokens.len()).sum();
        let mut by_label: IndexMap<&str, usize> = IndexMap::new();
        for relation in blocks.iter().flat_map(|block| &block.relations) {
            *by_label.entry(relation.label.as_str()).or_default() += 1;
        }
        println!(
            "{}: {} sentences, {} tokens, {} relations",
            path.display(),
            blocks.len(),
            tokens,
            by_label.values().sum::<usize>()
        );
        for (label, count) in by_label {
            println!("  {label}\t{count}");
        }
    }
    Ok(())
}
