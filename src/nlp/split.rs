//! Deterministic train/dev/test partitioning of annotated documents.

use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::info;

use super::{
    document::AnnotatedDocument,
    encode::{self, OutputFormat},
};
use crate::error::{PrepError, Result};

/// Fractions of the corpus assigned to train, dev and test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub dev: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.65,
            dev: 0.15,
            test: 0.20,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> Result<()> {
        let parts = [self.train, self.dev, self.test];
        if parts.iter().any(|part| !(0.0..=1.0).contains(part)) {
            return Err(PrepError::Configuration(format!("split ratios out of range: {self:?}")));
        }
        if ((parts.iter().sum::<f64>()) - 1.0).abs() > 1e-6 {
            return Err(PrepError::Configuration(format!("split ratios must sum to 1: {self:?}")));
        }
        Ok(())
    }

    /// Cumulative cut points for `len` items; fractional counts are truncated.
    pub fn boundaries(&self, len: usize) -> (usize, usize) {
        let cut = |fraction: f64| (((len as f64) * fraction) + 1e-9).floor() as usize;
        let train_end = cut(self.train).min(len);
        let dev_end = cut(self.train + self.dev).clamp(train_end, len);
        (train_end, dev_end)
    }
}

/// Shuffled partitions; the test partition absorbs rounding remainders.
#[derive(Debug, Clone)]
pub struct CorpusSplit<T> {
    pub train: Vec<T>,
    pub dev: Vec<T>,
    pub test: Vec<T>,
}

pub fn split<T>(mut items: Vec<T>, ratios: SplitRatios, seed: u64) -> CorpusSplit<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    let (train_end, dev_end) = ratios.boundaries(items.len());
    let test = items.split_off(dev_end);
    let dev = items.split_off(train_end);
    CorpusSplit {
        train: items,
        dev,
        test,
    }
}

/// Paths written by [`split_and_write`].
#[derive(Debug, Clone)]
pub struct WrittenSplit {
    pub train: PathBuf,
    pub dev: PathBuf,
    pub test: PathBuf,
}

/// Shuffle, partition and encode documents into `train_<tag>`, `dev_<tag>`
/// and `test_<tag>` files under `out_dir`.
pub fn split_and_write(
    documents: Vec<AnnotatedDocument>,
    ratios: SplitRatios,
    seed: u64,
    out_dir: &Path,
    file_tag: &str,
    format: OutputFormat,
) -> Result<WrittenSplit> {
    ratios.validate()?;
    let parts = split(documents, ratios, seed);
    info!(
        train = parts.train.len(),
        dev = parts.dev.len(),
        test = parts.test.len(),
        seed,
        "partitioned documents"
    );
    let path_for = |name: &str| out_dir.join(format!("{name}_{file_tag}.{}", format.extension()));
    let written = WrittenSplit {
        train: path_for("train"),
        dev: path_for("dev"),
        test: path_for("test"),
    };
    encode::write_corpus(&written.train, &parts.train, format)?;
    encode::write_corpus(&written.dev, &parts.dev, format)?;
    encode::write_corpus(&written.test, &parts.test, format)?;
    Ok(written)
}
