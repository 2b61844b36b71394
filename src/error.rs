//! Crate-wide error type for the sample, training and evaluation pipeline.

use thiserror::Error;

use crate::ml::ClassifierError;
use crate::export::ExportError;
use crate::landmarks::HAND_FEATURE_LEN;

/// Errors surfaced by pipeline operations.
///
/// Validation variants are raised before any classifier call and leave all
/// state untouched.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The detection frame carried no hands.
    #[error("No pose data available")]
    EmptyFrame,
    /// A flat feature vector does not group into whole hands.
    #[error("Feature vector of length {len} is not a multiple of {}", HAND_FEATURE_LEN)]
    MalformedVector { len: usize },
    /// A sample was created without a label.
    #[error("Please enter a label first")]
    EmptyLabel,
    /// Training needs at least two distinct labels.
    #[error("Need at least 2 different labels to train (found {found})")]
    InsufficientLabels { found: usize },
    /// The sample store or held-out set is empty.
    #[error("No data to train")]
    EmptySampleSet,
    /// The configured split leaves no samples for training.
    #[error("Not enough samples to train: {samples} samples leave no training data after the split")]
    EmptyTrainingSplit { samples: usize },
    /// The live feature vector does not match the reference sample shape.
    #[error("Feature length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    /// The classifier reported a failure.
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    /// Training failed after validation; the classifier must be rebuilt.
    #[error("Training failed: {0}")]
    TrainingFailure(String),
    /// Nothing to export.
    #[error("No samples to export")]
    NoData,
    /// No classifier instance is available.
    #[error("Model not initialized")]
    NotInitialized,
    /// A training run is still in flight.
    #[error("Training already in progress")]
    Busy,
    /// The operation needs a trained classifier.
    #[error("Model has not been trained yet")]
    NotTrained,
    /// Reading or writing an export document failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}
