//! Label translation tables applied while extracting annotations.

use std::{collections::HashMap, fs, path::Path};

use tracing::{debug, info};

use crate::error::{PrepError, Result};

/// Column holding the raw label in the comma-delimited relation table.
const CSV_RAW_COLUMN: usize = 0;
/// Column holding the canonical label in the comma-delimited relation table.
const CSV_CANONICAL_COLUMN: usize = 5;

/// Supported on-disk layouts for a translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// One `canonical<TAB>raw` pair per line.
    Tab,
    /// Spreadsheet export: raw label in column 1, canonical in column 6.
    Comma,
}

/// Characters that separate fields in the training files and may not appear
/// inside a canonical label.
pub const RESERVED_LABEL_CHARS: [char; 2] = ['|', ';'];

/// Check that a canonical label survives the `# relations =` field unchanged:
/// non-empty, no surrounding whitespace, no separators or control characters.
pub fn check_label(label: &str) -> std::result::Result<(), String> {
    if label.is_empty() {
        return Err("empty label".into());
    }
    if label.trim() != label {
        return Err(format!("label {label:?} has leading or trailing whitespace"));
    }
    if let Some(ch) = label
        .chars()
        .find(|ch| RESERVED_LABEL_CHARS.contains(ch) || ch.is_control())
    {
        return Err(format!("label {label:?} contains reserved character {ch:?}"));
    }
    Ok(())
}

/// Immutable mapping from raw (case-sensitive) label to lower-cased canonical label.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    /// Load a table; any malformed line rejects the whole file.
    pub fn load(path: impl AsRef<Path>, delimiter: Delimiter) -> Result<Self> {
        let path = path.as_ref();
        let entries = match delimiter {
            Delimiter::Tab => load_tab(path)?,
            Delimiter::Comma => load_csv(path)?,
        };
        info!(path = %path.display(), entries = entries.len(), "loaded translation table");
        Ok(Self { entries })
    }

    /// Build a table from `(raw, canonical)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let entries = pairs
            .into_iter()
            .map(|(raw, canonical)| (raw.into(), canonical.as_ref().to_lowercase()))
            .collect();
        Self { entries }
    }

    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn load_tab(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path).map_err(|err| PrepError::mapping(path, err.to_string()))?;
    let mut entries = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [canonical, raw] = fields.as_slice() else {
            return Err(PrepError::mapping(
                path,
                format!("line {} has {} tab-separated fields, expected 2", idx + 1, fields.len()),
            ));
        };
        let canonical = canonical.trim().to_lowercase();
        check_label(&canonical).map_err(|reason| PrepError::mapping(path, format!("line {}: {reason}", idx + 1)))?;
        entries.insert(raw.trim().to_string(), canonical);
    }
    Ok(entries)
}

fn load_csv(path: &Path) -> Result<HashMap<String, String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| PrepError::mapping(path, err.to_string()))?;
    let mut entries = HashMap::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| PrepError::mapping(path, err.to_string()))?;
        let (Some(raw), Some(canonical)) = (record.get(CSV_RAW_COLUMN), record.get(CSV_CANONICAL_COLUMN))
        else {
            return Err(PrepError::mapping(
                path,
                format!(
                    "row {} has {} columns, expected at least {}",
                    idx + 1,
                    record.len(),
                    CSV_CANONICAL_COLUMN + 1
                ),
            ));
        };
        let canonical = canonical.trim().to_lowercase();
        check_label(&canonical).map_err(|reason| PrepError::mapping(path, format!("row {}: {reason}", idx + 1)))?;
        entries.insert(raw.trim().to_string(), canonical);
    }
    Ok(entries)
}

/// Subclass to main-class promotion for relation labels.
#[derive(Debug, Clone, Default)]
pub struct Ontology {
    classes: HashMap<String, String>,
}

impl Ontology {
    /// Load a `subclass - main class` file. Both sides are lower-cased.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| PrepError::mapping(path, err.to_string()))?;
        let mut classes = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut parts = line.split('-');
            let (Some(subclass), Some(main_class)) = (parts.next(), parts.next()) else {
                return Err(PrepError::mapping(
                    path,
                    format!("line {} lacks a '-' separator", idx + 1),
                ));
            };
            let main_class = main_class.trim().to_lowercase();
            check_label(&main_class)
                .map_err(|reason| PrepError::mapping(path, format!("line {}: {reason}", idx + 1)))?;
            classes.insert(subclass.trim().to_lowercase(), main_class);
        }
        debug!(classes = classes.len(), "ontology mapping size");
        Ok(Self { classes })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let classes = pairs
            .into_iter()
            .map(|(sub, main)| (sub.as_ref().to_lowercase(), main.as_ref().to_lowercase()))
            .collect();
        Self { classes }
    }

    pub fn main_class(&self, subclass: &str) -> Option<&str> {
        self.classes.get(subclass).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Entity and relation label policies used during extraction.
#[derive(Debug, Clone)]
pub struct LabelMapper {
    pub entities: TranslationTable,
    pub relations: TranslationTable,
    pub ontology: Ontology,
    pub fallback_relation: String,
}

impl LabelMapper {
    pub fn new(
        entities: TranslationTable,
        relations: TranslationTable,
        ontology: Ontology,
        fallback_relation: impl Into<String>,
    ) -> Self {
        Self {
            entities,
            relations,
            ontology,
            fallback_relation: fallback_relation.into(),
        }
    }

    /// Unmapped entity labels pass through unchanged.
    pub fn entity_label(&self, raw: &str) -> String {
        self.entities.get(raw).unwrap_or(raw).to_string()
    }

    /// Unmapped relation labels collapse to the fallback label.
    pub fn relation_label(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return self.fallback_relation.clone();
        };
        let lowered = raw.to_lowercase();
        match self.relations.get(raw) {
            Some(canonical) => self
                .ontology
                .main_class(canonical)
                .unwrap_or(canonical)
                .to_string(),
            None => self
                .ontology
                .main_class(&lowered)
                .map(str::to_string)
                .unwrap_or_else(|| self.fallback_relation.clone()),
        }
    }
}
