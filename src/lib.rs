//! Hand-sign training pipeline: landmark samples, an incremental classifier
//! trainer, live prediction and held-out evaluation.
/// Application directory helpers.
pub mod app_dirs;
/// Persisted trainer settings.
pub mod config;
/// Hand landmark detector seam.
pub mod detector;
/// Pipeline error type.
pub mod error;
/// Held-out confusion matrix generation.
pub mod evaluation;
/// Sample export documents.
pub mod export;
/// Frame to feature-vector encoding.
pub mod features;
/// Landmark, hand and frame types.
pub mod landmarks;
/// Logging setup.
pub mod logging;
/// Classifier contract and the bundled MLP backend.
pub mod ml;
/// Live prediction formatting.
pub mod prediction;
/// Labeled samples and the sample store.
pub mod samples;
/// Operator session state and status reporting.
pub mod session;
/// Split-and-train orchestration.
pub mod trainer;

pub use error::PipelineError;
