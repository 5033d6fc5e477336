//! Conversion of labelling-tool exports into NER and relation-classification
//! training corpora, plus orchestration of the model trainers.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod nlp;
pub mod train;

pub use error::{PrepError, Result};
