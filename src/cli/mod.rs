//! Command-line interface wiring for ner-relation-prep.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use crate::{config::Settings, nlp::encode::OutputFormat, nlp::extract::WriteMode};

pub mod export;
pub mod inspect;
pub mod train;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Annotation export to NER/relation training corpora", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Export(args) => export::run(args, settings),
            Commands::Inspect(args) => inspect::run(args),
            Commands::TrainNer(args) => train::run_ner(args, settings),
            Commands::TrainRelations(args) => train::run_relations(args, settings),
            Commands::TrainEmbeddings(args) => train::run_embeddings(args, settings),
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert an annotation export into train/dev/test files.
    Export(export::Args),
    /// Summarise relation-augmented training files.
    Inspect(inspect::Args),
    /// Train sequence taggers for every configured model.
    TrainNer(train::Args),
    /// Train relation classifiers for every configured model.
    TrainRelations(train::Args),
    /// Prepare the raw-text corpus and sweep word2vec hyper-parameters.
    TrainEmbeddings(train::Args),
}

/// Training file layout selected on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CorpusFormat {
    /// Relation-augmented column format; relation-free sentences are dropped.
    Conllu,
    /// Tag-per-line format with document markers; all sentences kept.
    Plain,
}

impl From<CorpusFormat> for OutputFormat {
    fn from(value: CorpusFormat) -> Self {
        match value {
            CorpusFormat::Conllu => OutputFormat::Conllu,
            CorpusFormat::Plain => OutputFormat::Plain,
        }
    }
}

/// How audit side files are opened.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SideFileMode {
    Overwrite,
    Append,
}

impl From<SideFileMode> for WriteMode {
    fn from(value: SideFileMode) -> Self {
        match value {
            SideFileMode::Overwrite => WriteMode::Overwrite,
            SideFileMode::Append => WriteMode::Append,
        }
    }
}
