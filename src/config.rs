//! Runtime configuration: environment settings and the training YAML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use crate::{
    data::mapping::{check_label, Delimiter, LabelMapper, Ontology, TranslationTable},
    error::PrepError,
};

/// Fallback assigned to relation labels missing from the mapping tables.
pub const DEFAULT_FALLBACK_RELATION: &str = "unclassified";
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Application configuration resolved from `.env` and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Root folder for input exports and mapping files.
    pub data_dir: PathBuf,
    /// Root folder for generated corpora and audit files.
    pub outputs_dir: PathBuf,
    /// Tab-delimited entity canonicalization table.
    pub entity_mapping_path: Option<PathBuf>,
    /// Comma-delimited relation canonicalization table.
    pub relation_mapping_path: Option<PathBuf>,
    /// Hyphen-delimited relation ontology.
    pub ontology_mapping_path: Option<PathBuf>,
    pub fallback_relation_label: String,
    pub split_seed: u64,
    pub labelbox_api_key: Option<String>,
    /// Training YAML, from `CONFIG_YAML_PATH`.
    pub training_config_path: Option<PathBuf>,
}

impl Settings {
    /// Load configuration from environment with reasonable defaults.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));
        let outputs_dir = env::var("OUTPUTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./outputs"));
        let split_seed = match env::var("SPLIT_SEED") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| PrepError::Configuration(format!("SPLIT_SEED is not an integer: {raw}")))?,
            Err(_) => DEFAULT_SPLIT_SEED,
        };

        std::fs::create_dir_all(&outputs_dir).context("creating outputs dir")?;

        Ok(Self {
            entity_mapping_path: path_var("ENTITY_MAPPING_PATH"),
            relation_mapping_path: path_var("RELATION_MAPPING_PATH"),
            ontology_mapping_path: path_var("ONTOLOGY_MAPPING_PATH"),
            fallback_relation_label: env::var("FALLBACK_RELATION_LABEL")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_RELATION.to_string()),
            split_seed,
            labelbox_api_key: env::var("LABELBOX_API_KEY").ok().filter(|key| !key.is_empty()),
            training_config_path: path_var("CONFIG_YAML_PATH"),
            data_dir,
            outputs_dir,
        })
    }

    /// Settings rooted at explicit directories, without reading the environment.
    pub fn rooted(data_dir: impl Into<PathBuf>, outputs_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            outputs_dir: outputs_dir.into(),
            entity_mapping_path: None,
            relation_mapping_path: None,
            ontology_mapping_path: None,
            fallback_relation_label: DEFAULT_FALLBACK_RELATION.to_string(),
            split_seed: DEFAULT_SPLIT_SEED,
            labelbox_api_key: None,
            training_config_path: None,
        }
    }

    /// Convenience helper for derived path segments.
    pub fn join_data<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Convenience helper for derived output path segments.
    pub fn join_output<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.outputs_dir.join(path)
    }

    /// Load the configured label tables. Unconfigured tables are empty.
    pub fn load_mapper(&self) -> Result<LabelMapper, PrepError> {
        check_label(&self.fallback_relation_label).map_err(|reason| {
            PrepError::Configuration(format!("FALLBACK_RELATION_LABEL: {reason}"))
        })?;
        let entities = match &self.entity_mapping_path {
            Some(path) => TranslationTable::load(path, Delimiter::Tab)?,
            None => {
                warn!("ENTITY_MAPPING_PATH unset; entity labels pass through unchanged");
                TranslationTable::default()
            }
        };
        let relations = match &self.relation_mapping_path {
            Some(path) => TranslationTable::load(path, Delimiter::Comma)?,
            None => {
                warn!("RELATION_MAPPING_PATH unset; relation table is empty");
                TranslationTable::default()
            }
        };
        let ontology = match &self.ontology_mapping_path {
            Some(path) => Ontology::load(path)?,
            None => Ontology::default(),
        };
        Ok(LabelMapper::new(
            entities,
            relations,
            ontology,
            self.fallback_relation_label.clone(),
        ))
    }

    /// Read the training YAML named by `CONFIG_YAML_PATH`.
    pub fn training_config(&self) -> Result<TrainingConfig, PrepError> {
        let path = self
            .training_config_path
            .as_ref()
            .ok_or_else(|| PrepError::Configuration("CONFIG_YAML_PATH environment variable not set".into()))?;
        TrainingConfig::load(path)
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key).ok().filter(|value| !value.is_empty()).map(PathBuf::from)
}

/// Column corpus consumed by the model trainers.
#[derive(Debug, Clone, Deserialize, serde::Serialize, PartialEq)]
pub struct CorpusFiles {
    pub train_file: PathBuf,
    pub dev_file: PathBuf,
    pub test_file: PathBuf,
}

impl CorpusFiles {
    fn validate(&self, section: &str) -> Result<(), PrepError> {
        for path in [&self.train_file, &self.dev_file, &self.test_file] {
            if path.as_os_str().is_empty() {
                return Err(PrepError::Configuration(format!("{section}: empty corpus path")));
            }
        }
        Ok(())
    }
}

/// Hyper-parameters shared by the transformer-based trainers.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelSection {
    pub models: Vec<String>,
    pub learning_rate: f64,
    pub max_epochs: u32,
    pub mini_batch_size: u32,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub fine_tune: bool,
    #[serde(default = "default_layers")]
    pub fine_tune_layers: String,
    pub corpus: CorpusFiles,
}

fn default_layers() -> String {
    "-1".to_string()
}

impl ModelSection {
    fn validate(&self, section: &str) -> Result<(), PrepError> {
        if self.models.iter().all(|model| model.trim().is_empty()) {
            return Err(PrepError::Configuration(format!("{section}: no models configured")));
        }
        if self.learning_rate <= 0.0 || self.max_epochs == 0 || self.mini_batch_size == 0 {
            return Err(PrepError::Configuration(format!(
                "{section}: learning_rate, max_epochs and mini_batch_size must be positive"
            )));
        }
        self.corpus.validate(section)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RelationSection {
    #[serde(flatten)]
    pub model: ModelSection,
    /// JSON list of allowed `(subject type, object type)` pairs.
    pub entity_label_map_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Word2VecSection {
    /// Raw texts, one per row in the first CSV column.
    pub input_file: PathBuf,
    pub epochs: Vec<u32>,
    pub window_sizes: Vec<u32>,
    pub vector_sizes: Vec<u32>,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub stopwords_file: Option<PathBuf>,
    #[serde(default = "default_phrase_min_count")]
    pub phrase_min_count: u64,
    #[serde(default = "default_phrase_threshold")]
    pub phrase_threshold: f64,
}

fn default_phrase_min_count() -> u64 {
    30
}

fn default_phrase_threshold() -> f64 {
    10.0
}

impl Word2VecSection {
    fn validate(&self) -> Result<(), PrepError> {
        let sweeps = [
            ("epochs", &self.epochs),
            ("window_sizes", &self.window_sizes),
            ("vector_sizes", &self.vector_sizes),
        ];
        for (name, values) in sweeps {
            if values.is_empty() || values.contains(&0) {
                return Err(PrepError::Configuration(format!(
                    "word2vec.{name} must list positive values"
                )));
            }
        }
        Ok(())
    }
}

/// External program that performs the actual model fitting.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BackendSection {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Contents of the training YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrainingConfig {
    pub backend: BackendSection,
    #[serde(default)]
    pub ner_training: Option<ModelSection>,
    #[serde(default)]
    pub relation_extraction: Option<RelationSection>,
    #[serde(default)]
    pub word2vec: Option<Word2VecSection>,
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self, PrepError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| PrepError::Configuration(format!("reading {}: {err}", path.display())))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, PrepError> {
        let config: Self =
            serde_yaml::from_str(raw).map_err(|err| PrepError::Configuration(err.to_string()))?;
        if let Some(section) = &config.ner_training {
            section.validate("ner_training")?;
        }
        if let Some(section) = &config.relation_extraction {
            section.model.validate("relation_extraction")?;
        }
        if let Some(section) = &config.word2vec {
            section.validate()?;
        }
        Ok(config)
    }

    pub fn ner(&self) -> Result<&ModelSection, PrepError> {
        self.ner_training
            .as_ref()
            .ok_or_else(|| PrepError::Configuration("missing ner_training section".into()))
    }

    pub fn relations(&self) -> Result<&RelationSection, PrepError> {
        self.relation_extraction
            .as_ref()
            .ok_or_else(|| PrepError::Configuration("missing relation_extraction section".into()))
    }

    pub fn word2vec(&self) -> Result<&Word2VecSection, PrepError> {
        self.word2vec
            .as_ref()
            .ok_or_else(|| PrepError::Configuration("missing word2vec section".into()))
    }
}
