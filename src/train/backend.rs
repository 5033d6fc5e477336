//! Trainer that hands jobs to an external program over stdin.

use std::{
    io::{ErrorKind, Write},
    path::PathBuf,
    process::{Command, Stdio},
};

use serde::Serialize;
use tracing::debug;

use super::{
    EmbeddingJob, EmbeddingTrainer, RelationClassifierTrainer, RelationJob, SequenceTaggerTrainer,
    TaggerJob,
};
use crate::{
    config::BackendSection,
    error::{PrepError, Result},
};

/// Runs `<program> <args..> <task>` with the job as JSON on stdin. A zero exit
/// status means the artefact was written to the job's output location.
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTrainer {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(section: &BackendSection) -> Self {
        Self::new(section.program.clone(), section.args.clone())
    }

    fn run<J: Serialize>(&self, task: &str, model: &str, job: &J) -> Result<()> {
        let payload = serde_json::to_vec(job)?;
        debug!(program = %self.program.display(), task, model, "spawning trainer");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(task)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| PrepError::training(model, format!("spawn {}: {err}", self.program.display())))?;
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&payload) {
                Ok(()) => {}
                // the exit status decides whether a trainer that ignored its job failed
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!(task, model, "trainer closed stdin early");
                }
                Err(err) => return Err(PrepError::training(model, format!("send job: {err}"))),
            }
        }
        let status = child
            .wait()
            .map_err(|err| PrepError::training(model, err))?;
        if !status.success() {
            return Err(PrepError::training(model, format!("trainer exited with {status}")));
        }
        Ok(())
    }
}

impl SequenceTaggerTrainer for CommandTrainer {
    fn train_tagger(&self, job: &TaggerJob) -> Result<PathBuf> {
        self.run("ner", &job.embeddings.model, job)?;
        Ok(job.output_dir.clone())
    }
}

impl RelationClassifierTrainer for CommandTrainer {
    fn train_relation_classifier(&self, job: &RelationJob) -> Result<PathBuf> {
        self.run("relation", &job.embeddings.model, job)?;
        Ok(job.output_dir.clone())
    }
}

impl EmbeddingTrainer for CommandTrainer {
    fn train_embeddings(&self, job: &EmbeddingJob) -> Result<PathBuf> {
        let name = job
            .output_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.run("word2vec", &name, job)?;
        Ok(job.output_file.clone())
    }
}
