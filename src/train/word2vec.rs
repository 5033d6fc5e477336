//! Word-embedding corpus preparation and hyper-parameter sweep.

use std::{
    collections::HashSet,
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use tracing::{debug, info};

use super::{EmbeddingJob, EmbeddingTrainer, TrainingReport};
use crate::{
    config::Word2VecSection,
    error::{PrepError, Result},
    nlp::{clean, phrases::PhraseModel},
};

/// Phrase detection only looks at the head of large corpora.
pub const MAX_PHRASE_SENTENCES: usize = 1_000_000;
const MIN_COUNT: u32 = 20;
const SAMPLE: f64 = 6e-5;
const ALPHA: f64 = 0.03;
const MIN_ALPHA: f64 = 0.0007;
const NEGATIVE: u32 = 20;

/// Raw texts from the first column of a header-less CSV.
pub fn load_texts(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut texts = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(text) = record.get(0) {
            texts.push(text.to_string());
        }
    }
    info!(path = %path.display(), texts = texts.len(), "loaded raw texts");
    Ok(texts)
}

/// One stop word per line.
pub fn load_stopwords(path: &Path) -> Result<HashSet<String>> {
    let raw = fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect())
}

/// Clean texts into tokenized sentences and join frequent bigrams.
pub fn prepare_sentences(
    texts: &[String],
    stopwords: &HashSet<String>,
    phrase_min_count: u64,
    phrase_threshold: f64,
) -> Vec<Vec<String>> {
    let started = Instant::now();
    let mut sentences: Vec<Vec<String>> = texts
        .iter()
        .flat_map(|text| clean::clean_text(text))
        .map(|sentence| clean::tokenize_sentence(&sentence, stopwords))
        .filter(|tokens| !tokens.is_empty())
        .collect();
    debug!(elapsed_ms = started.elapsed().as_millis() as u64, sentences = sentences.len(), "cleaned corpus");
    sentences.truncate(MAX_PHRASE_SENTENCES);
    let phrases = PhraseModel::learn(&sentences, phrase_min_count, phrase_threshold);
    sentences.iter().map(|sentence| phrases.apply(sentence)).collect()
}

pub fn write_sentences(path: &Path, sentences: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for sentence in sentences {
        writeln!(writer, "{}", sentence.join(" "))?;
    }
    writer.flush()?;
    info!(path = %path.display(), sentences = sentences.len(), "wrote embedding corpus");
    Ok(())
}

pub fn model_file_name(epochs: u32, window: u32, vector_size: u32) -> String {
    format!("w2v_model_e{epochs}_w{window}_v{vector_size}.model")
}

/// All but one core, never fewer than one worker.
pub fn worker_count() -> usize {
    thread::available_parallelism()
        .map(|cores| cores.get().saturating_sub(1).max(1))
        .unwrap_or(1)
}

/// One job per combination of epochs, window size and vector size.
pub fn sweep_jobs(section: &Word2VecSection, sentences_file: &Path) -> Vec<EmbeddingJob> {
    let workers = worker_count();
    let mut jobs = Vec::new();
    for &epochs in &section.epochs {
        for &window in &section.window_sizes {
            for &vector_size in &section.vector_sizes {
                jobs.push(EmbeddingJob {
                    sentences_file: sentences_file.to_path_buf(),
                    epochs,
                    window,
                    vector_size,
                    min_count: MIN_COUNT,
                    sample: SAMPLE,
                    alpha: ALPHA,
                    min_alpha: MIN_ALPHA,
                    negative: NEGATIVE,
                    workers,
                    output_file: section
                        .output_folder
                        .join(model_file_name(epochs, window, vector_size)),
                });
            }
        }
    }
    jobs
}

/// Prepare the corpus once, then train every sweep combination.
pub fn train_word2vec<T: EmbeddingTrainer>(section: &Word2VecSection, trainer: &T) -> Result<TrainingReport> {
    if !section.input_file.is_file() {
        return Err(PrepError::Configuration(format!(
            "word2vec input {} not found",
            section.input_file.display()
        )));
    }
    let stopwords = match &section.stopwords_file {
        Some(path) => load_stopwords(path)?,
        None => HashSet::new(),
    };
    let texts = load_texts(&section.input_file)?;
    let sentences = prepare_sentences(&texts, &stopwords, section.phrase_min_count, section.phrase_threshold);
    let sentences_file: PathBuf = section.output_folder.join("w2v_sentences.txt");
    write_sentences(&sentences_file, &sentences)?;

    let mut report = TrainingReport::default();
    for job in sweep_jobs(section, &sentences_file) {
        let name = model_file_name(job.epochs, job.window, job.vector_size);
        info!(epochs = job.epochs, window = job.window, vector_size = job.vector_size, "training word2vec model");
        let started = Instant::now();
        report.record(&name, || trainer.train_embeddings(&job));
        debug!(model = %name, elapsed_s = started.elapsed().as_secs(), "word2vec run finished");
    }
    Ok(report)
}
