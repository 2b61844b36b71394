//! Contract between the trainer and an incremental classifier.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default number of training epochs.
pub const DEFAULT_EPOCHS: usize = 50;

/// One scored label returned by [`Classifier::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Probability in `[0, 1]`.
    pub confidence: f32,
}

/// Options for a single training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingOptions {
    pub epochs: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
        }
    }
}

/// Failures reported by a classifier backend.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Empty feature vector")]
    EmptyInput,
    #[error("Input length mismatch: expected {expected}, got {actual}")]
    InputLength { expected: usize, actual: usize },
    #[error("No training data has been added")]
    NoData,
    #[error("Training data must be normalized before training")]
    NotNormalized,
    #[error("Model has not been trained")]
    NotTrained,
    #[error("Failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// Incremental-training classifier driven by the trainer.
///
/// The lifecycle is `add_data*` → `normalize_data` → `train`, after which
/// `classify` and `save` become available. Implementations are moved onto a
/// worker thread for training, hence `Send`.
pub trait Classifier: Send {
    /// Accumulate one labeled row.
    fn add_data(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError>;

    /// Compute normalization statistics over every row added so far.
    fn normalize_data(&mut self) -> Result<(), ClassifierError>;

    fn train(&mut self, options: &TrainingOptions) -> Result<(), ClassifierError>;

    /// Scores for every known label, highest confidence first.
    fn classify(&self, features: &[f32]) -> Result<Vec<Classification>, ClassifierError>;

    /// Persist the trained model under `dir`, returning the written path.
    fn save(&self, dir: &Path, name: &str) -> Result<PathBuf, ClassifierError>;

    /// Feature length the classifier expects, once known.
    fn input_len(&self) -> Option<usize> {
        None
    }
}
