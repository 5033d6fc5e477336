use std::{cell::RefCell, fs, path::PathBuf};

use ner_relation_prep::{
    config::TrainingConfig,
    nlp::{clean, phrases::PhraseModel},
    train::{
        backend::CommandTrainer,
        model_dir_name, ner, relation,
        word2vec::{self, model_file_name},
        EmbeddingJob, EmbeddingTrainer, RelationClassifierTrainer, RelationJob,
        SequenceTaggerTrainer, TaggerJob,
    },
    PrepError, Result,
};

#[derive(Default)]
struct RecordingTrainer {
    failing: &'static str,
    seen: RefCell<Vec<String>>,
}

impl RecordingTrainer {
    fn outcome(&self, name: &str, output: PathBuf) -> Result<PathBuf> {
        self.seen.borrow_mut().push(name.to_string());
        if name == self.failing {
            return Err(PrepError::ModelTraining {
                model: name.into(),
                reason: "out of memory".into(),
            });
        }
        Ok(output)
    }
}

impl SequenceTaggerTrainer for RecordingTrainer {
    fn train_tagger(&self, job: &TaggerJob) -> Result<PathBuf> {
        self.outcome(&job.embeddings.model, job.output_dir.clone())
    }
}

impl RelationClassifierTrainer for RecordingTrainer {
    fn train_relation_classifier(&self, job: &RelationJob) -> Result<PathBuf> {
        assert_eq!(job.entity_pair_labels, vec![("per".to_string(), "org".to_string())]);
        self.outcome(&job.embeddings.model, job.output_dir.clone())
    }
}

impl EmbeddingTrainer for RecordingTrainer {
    fn train_embeddings(&self, job: &EmbeddingJob) -> Result<PathBuf> {
        let name = job.output_file.file_name().unwrap().to_string_lossy().into_owned();
        self.outcome(&name, job.output_file.clone())
    }
}

fn config_yaml(root: &std::path::Path, learning_rate: &str) -> String {
    for name in ["train.conllu", "dev.conllu", "test.conllu"] {
        fs::write(root.join(name), "").unwrap();
    }
    fs::write(root.join("pairs.json"), r#"[["per","org"]]"#).unwrap();
    fs::write(
        root.join("texts.csv"),
        "\"Het weer (zonnig) is vandaag erg mooi geweest. Kort zinnetje? Dit is weer een hele lange zin...\"\n",
    )
    .unwrap();
    let root = root.display();
    format!(
        r#"
backend:
  program: sh
  args: ["-c", "cat > /dev/null"]
ner_training:
  models: ["bert-base-cased", "bad/model", "GroNLP/bert-base-dutch-cased"]
  learning_rate: {learning_rate}
  max_epochs: 10
  mini_batch_size: 4
  output_folder: {root}/models
  fine_tune: true
  corpus:
    train_file: {root}/train.conllu
    dev_file: {root}/dev.conllu
    test_file: {root}/test.conllu
relation_extraction:
  models: ["bad/model", "xlm-roberta-base"]
  learning_rate: 3.0e-5
  max_epochs: 5
  mini_batch_size: 8
  output_folder: {root}/models
  entity_label_map_path: {root}/pairs.json
  corpus:
    train_file: {root}/train.conllu
    dev_file: {root}/dev.conllu
    test_file: {root}/test.conllu
word2vec:
  input_file: {root}/texts.csv
  epochs: [5, 10]
  window_sizes: [3]
  vector_sizes: [100, 300]
  output_folder: {root}/w2v
"#
    )
}

#[test]
fn config_parses_and_defaults_layers() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    let ner = config.ner().unwrap();
    assert_eq!(ner.models.len(), 3);
    assert_eq!(ner.fine_tune_layers, "-1");
    assert!(ner.fine_tune);
    assert_eq!(config.word2vec().unwrap().phrase_min_count, 30);
}

#[test]
fn non_positive_learning_rate_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrainingConfig::parse(&config_yaml(dir.path(), "0.0")).unwrap_err();
    assert!(matches!(err, PrepError::Configuration(_)));
}

#[test]
fn missing_section_is_a_configuration_error() {
    let config = TrainingConfig::parse("backend:\n  program: trainer\n").unwrap();
    assert!(matches!(config.ner(), Err(PrepError::Configuration(_))));
}

#[test]
fn failing_tagger_does_not_stop_the_sweep() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    let trainer = RecordingTrainer {
        failing: "bad/model",
        ..Default::default()
    };
    let report = ner::train_taggers(config.ner().unwrap(), &trainer).unwrap();
    assert_eq!(trainer.seen.borrow().len(), 3);
    assert_eq!(report.trained.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.all_failed());
    assert_eq!(
        report.trained[1].1,
        dir.path().join("models").join("trained_model_GroNLP_bert-base-dutch-cased")
    );
    assert!(report.trained[1].1.is_dir());
}

#[test]
fn relation_sweep_uses_entity_pair_map() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    let trainer = RecordingTrainer {
        failing: "bad/model",
        ..Default::default()
    };
    let report = relation::train_relation_classifiers(config.relations().unwrap(), &trainer).unwrap();
    assert_eq!(report.failed[0].0, "bad/model");
    assert!(report.trained[0].1.ends_with("relation_model_xlm-roberta-base"));
}

#[test]
fn missing_corpus_aborts_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    fs::remove_file(dir.path().join("dev.conllu")).unwrap();
    let trainer = RecordingTrainer::default();
    let err = ner::train_taggers(config.ner().unwrap(), &trainer).unwrap_err();
    assert!(matches!(err, PrepError::Configuration(_)));
    assert!(trainer.seen.borrow().is_empty());
}

#[test]
fn word2vec_sweep_covers_every_combination() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    let trainer = RecordingTrainer {
        failing: "w2v_model_e5_w3_v300.model",
        ..Default::default()
    };
    let report = word2vec::train_word2vec(config.word2vec().unwrap(), &trainer).unwrap();
    assert_eq!(report.trained.len(), 3);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        *trainer.seen.borrow(),
        vec![
            model_file_name(5, 3, 100),
            model_file_name(5, 3, 300),
            model_file_name(10, 3, 100),
            model_file_name(10, 3, 300),
        ]
    );
    let corpus = fs::read_to_string(dir.path().join("w2v").join("w2v_sentences.txt")).unwrap();
    assert_eq!(corpus.lines().count(), 2);
}

#[test]
fn command_backend_reports_exit_status() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrainingConfig::parse(&config_yaml(dir.path(), "5.0e-5")).unwrap();
    let job = ner::tagger_job(config.ner().unwrap(), "bert-base-cased");

    let ok = CommandTrainer::new("sh", vec!["-c".into(), "cat > /dev/null".into()]);
    assert_eq!(ok.train_tagger(&job).unwrap(), job.output_dir);

    let failing = CommandTrainer::new("sh", vec!["-c".into(), "cat > /dev/null; exit 3".into()]);
    assert!(matches!(failing.train_tagger(&job), Err(PrepError::ModelTraining { .. })));

    let missing = CommandTrainer::new("/nonexistent/trainer", Vec::new());
    assert!(matches!(missing.train_tagger(&job), Err(PrepError::ModelTraining { .. })));
}

#[test]
fn model_names_become_directory_safe() {
    assert_eq!(model_dir_name("trained_model", "org/name"), "trained_model_org_name");
    assert_eq!(model_file_name(5, 3, 100), "w2v_model_e5_w3_v100.model");
}

#[test]
fn cleaning_drops_asides_short_sentences_and_punctuation() {
    let sentences = clean::clean_text(
        "Het weer (zonnig) is vandaag erg mooi geweest. Kort zinnetje? Dit is weer een hele lange zin...",
    );
    assert_eq!(
        sentences,
        vec!["het weer  is vandaag erg mooi geweest", "dit is weer een hele lange zin"]
    );
}

#[test]
fn frequent_pairs_become_phrases() {
    let mut sentences = Vec::new();
    for _ in 0..40 {
        sentences.push(vec!["new".to_string(), "york".to_string()]);
    }
    for _ in 0..10 {
        sentences.push(vec!["big".to_string(), "city".to_string()]);
    }
    let model = PhraseModel::learn(&sentences, 30, 0.01);
    let words: Vec<String> = ["new", "york", "big", "city"].iter().map(|w| w.to_string()).collect();
    assert_eq!(model.apply(&words), vec!["new_york", "big", "city"]);
    assert!(model.score("york", "big").is_none());
}
