//! Pushing pre-annotated documents to the labelling platform.

use std::{thread, time::Duration};

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::Settings,
    data::mapping::TranslationTable,
    error::{PrepError, Result},
    nlp::document::AnnotatedDocument,
};

/// Prefix of the global keys given to uploaded rows.
pub const GLOBAL_KEY_PREFIX: &str = "TEST-ID-";

/// Row payload for data row creation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Asset {
    pub row_data: String,
    pub global_key: String,
}

/// A data row as reported back by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub uid: String,
    pub row_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    InProgress,
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub status: TaskStatus,
    pub errors: Vec<String>,
}

/// Platform operations used by [`LabelingService`].
pub trait AnnotationPlatform {
    fn create_dataset(&self, name: &str) -> Result<String>;
    /// Returns the id of the asynchronous creation task.
    fn create_data_rows(&self, dataset_id: &str, assets: &[Asset]) -> Result<String>;
    fn task_state(&self, task_id: &str) -> Result<TaskState>;
    fn export_data_rows(&self, dataset_id: &str) -> Result<Vec<DataRow>>;
    /// Returns the id of the asynchronous import job.
    fn import_labels(&self, project_id: &str, name: &str, ndjson: &str) -> Result<String>;
}

/// Entity annotation in the platform's NDJSON import format; `end` is inclusive.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NerAnnotation {
    pub uuid: String,
    #[serde(rename = "dataRow")]
    pub data_row: DataRowRef,
    pub name: String,
    pub location: TextLocation,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataRowRef {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TextLocation {
    pub start: usize,
    pub end: usize,
}

/// Annotations destined for one data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLabels {
    pub data_row: String,
    pub annotations: Vec<NerAnnotation>,
}

fn require_api_key(settings: &Settings) -> Result<&str> {
    settings.labelbox_api_key.as_deref().ok_or_else(|| {
        PrepError::Configuration(
            "LABELBOX_API_KEY environment variable not set or provided as argument".into(),
        )
    })
}

pub struct LabelingService<P: AnnotationPlatform> {
    platform: P,
    entity_names: TranslationTable,
    dataset_id: Option<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl<P: AnnotationPlatform> LabelingService<P> {
    pub fn new(platform: P, entity_names: TranslationTable) -> Self {
        Self {
            platform,
            entity_names,
            dataset_id: None,
            poll_interval: Duration::from_secs(2),
            max_polls: 300,
        }
    }

    /// Connect with the API key from `settings`; a missing key is a
    /// configuration error raised before `connect` runs.
    pub fn from_settings<F>(settings: &Settings, entity_names: TranslationTable, connect: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<P>,
    {
        let api_key = require_api_key(settings)?;
        Ok(Self::new(connect(api_key)?, entity_names))
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    pub fn create_dataset(&mut self, name: &str) -> Result<String> {
        let id = self.platform.create_dataset(name)?;
        info!(dataset = name, id = %id, "dataset created");
        self.dataset_id = Some(id.clone());
        Ok(id)
    }

    pub fn create_asset(doc: &AnnotatedDocument) -> Asset {
        Asset {
            row_data: doc.text.clone(),
            global_key: format!("{GLOBAL_KEY_PREFIX}{}", Uuid::new_v4()),
        }
    }

    /// Create one data row per document, wait for completion, and return the
    /// rows now present in the dataset. Task errors are logged, not raised.
    pub fn upload_documents(&self, documents: &[AnnotatedDocument]) -> Result<Vec<DataRow>> {
        let dataset = self.require_dataset()?;
        let assets: Vec<Asset> = documents.iter().map(Self::create_asset).collect();
        let task = self.platform.create_data_rows(dataset, &assets)?;
        let state = self.wait_until_done(&task)?;
        if state.errors.is_empty() {
            info!(rows = assets.len(), "data rows created and task completed");
        } else {
            error!(errors = ?state.errors, "data row creation errors");
        }
        self.platform.export_data_rows(dataset)
    }

    /// Match documents to data rows by text and build their entity annotations.
    pub fn build_labels(&self, documents: &[AnnotatedDocument], rows: &[DataRow]) -> Vec<RowLabels> {
        let mut labels = Vec::new();
        for doc in documents {
            let Some(row) = rows.iter().rev().find(|row| row.row_data == doc.text) else {
                warn!(doc_id = %doc.id, "no data row matches document text");
                continue;
            };
            let annotations = doc
                .entities
                .iter()
                .map(|entity| NerAnnotation {
                    uuid: Uuid::new_v4().to_string(),
                    data_row: DataRowRef { id: row.uid.clone() },
                    name: self
                        .entity_names
                        .get(&entity.label)
                        .unwrap_or(&entity.label)
                        .to_string(),
                    location: TextLocation {
                        start: entity.start_char,
                        end: entity.end_char.saturating_sub(1),
                    },
                })
                .collect();
            labels.push(RowLabels {
                data_row: row.uid.clone(),
                annotations,
            });
        }
        labels
    }

    /// Serialize labels and import them, waiting for the job to finish.
    pub fn upload_labels(&self, project_id: &str, labels: &[RowLabels]) -> Result<()> {
        let ndjson = to_ndjson(labels)?;
        let name = format!("import-{}", Uuid::new_v4());
        let job = self.platform.import_labels(project_id, &name, &ndjson)?;
        let state = self.wait_until_done(&job)?;
        if state.errors.is_empty() {
            info!(job = %job, "labels uploaded successfully");
        } else {
            error!(errors = ?state.errors, "label upload errors");
        }
        Ok(())
    }

    fn require_dataset(&self) -> Result<&str> {
        self.dataset_id
            .as_deref()
            .ok_or_else(|| PrepError::Configuration("no dataset created".into()))
    }

    fn wait_until_done(&self, task_id: &str) -> Result<TaskState> {
        for _ in 0..self.max_polls {
            let state = self.platform.task_state(task_id)?;
            if state.status != TaskStatus::InProgress {
                return Ok(state);
            }
            thread::sleep(self.poll_interval);
        }
        Ok(TaskState {
            status: TaskStatus::Failed,
            errors: vec![format!("task {task_id} still running after {} polls", self.max_polls)],
        })
    }
}

/// One JSON object per annotation line.
pub fn to_ndjson(labels: &[RowLabels]) -> Result<String> {
    let mut out = String::new();
    for annotation in labels.iter().flat_map(|label| &label.annotations) {
        out.push_str(&serde_json::to_string(annotation)?);
        out.push('\n');
    }
    Ok(out)
}
