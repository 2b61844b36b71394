//! Split-and-train orchestration around a long-lived classifier.
//!
//! The trainer owns the sample store, the classifier and the authoritative
//! [`TrainingStatus`]. Training runs on a worker thread: the classifier is
//! moved onto it and handed back through a channel, so at most one training
//! call can be in flight and no other call can reach the classifier until the
//! run resolves.

mod split;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

pub use split::{shuffle_split, training_count};

use crate::error::PipelineError;
use crate::evaluation::{EvaluationReport, generate_confusion_matrix};
use crate::features::encode;
use crate::landmarks::DetectionFrame;
use crate::ml::classifier::DEFAULT_EPOCHS;
use crate::ml::{Classifier, ClassifierError, TrainingOptions};
use crate::prediction::{Prediction, predict_features};
use crate::samples::{Sample, SampleStore};

/// Default share of samples used for training; the rest is held out.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;
/// Bounds applied to `TrainingConfig::train_fraction`.
pub const MIN_TRAIN_FRACTION: f64 = 0.05;
pub const MAX_TRAIN_FRACTION: f64 = 0.95;

/// Builds a fresh classifier instance.
pub type ClassifierFactory =
    Box<dyn Fn() -> Result<Box<dyn Classifier>, ClassifierError> + Send>;

/// Knobs for the split and the training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub train_fraction: f64,
    /// Fixed shuffle seed; `None` draws from OS entropy.
    pub shuffle_seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            shuffle_seed: None,
        }
    }
}

impl TrainingConfig {
    /// Clamp the fraction into range and require at least one epoch.
    pub fn normalized(mut self) -> Self {
        self.epochs = self.epochs.max(1);
        self.train_fraction = if self.train_fraction.is_finite() {
            self.train_fraction
                .clamp(MIN_TRAIN_FRACTION, MAX_TRAIN_FRACTION)
        } else {
            DEFAULT_TRAIN_FRACTION
        };
        self
    }
}

/// Operator-visible training state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingStatus {
    Uninitialized,
    Ready,
    Training,
    Trained,
    Error(String),
}

impl TrainingStatus {
    pub fn is_training(&self) -> bool {
        matches!(self, Self::Training)
    }
}

/// Summary of a submitted training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingStarted {
    pub training: usize,
    pub held_out: usize,
    pub training_labels: BTreeSet<String>,
    pub held_out_labels: BTreeSet<String>,
}

/// Resolution of an in-flight training run, reported by [`Trainer::poll`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingEvent {
    Completed { held_out: usize, elapsed: Duration },
    Failed { reason: String },
}

struct TrainingFinished {
    classifier: Box<dyn Classifier>,
    result: Result<(), ClassifierError>,
}

struct PendingTraining {
    held_out: Vec<Sample>,
    rx: Receiver<TrainingFinished>,
    started: Instant,
}

pub struct Trainer {
    config: TrainingConfig,
    factory: ClassifierFactory,
    classifier: Option<Box<dyn Classifier>>,
    store: SampleStore,
    status: TrainingStatus,
    pending: Option<PendingTraining>,
}

impl Trainer {
    /// Create a trainer and immediately construct its classifier.
    pub fn new(config: TrainingConfig, factory: ClassifierFactory) -> Self {
        let mut trainer = Self {
            config: config.normalized(),
            factory,
            classifier: None,
            store: SampleStore::new(),
            status: TrainingStatus::Uninitialized,
            pending: None,
        };
        trainer.construct_classifier();
        trainer
    }

    /// Drop the current classifier and build a new one; samples are kept.
    pub fn reconstruct(&mut self) -> Result<(), PipelineError> {
        if self.status.is_training() {
            return Err(PipelineError::Busy);
        }
        self.classifier = None;
        self.construct_classifier();
        match &self.status {
            TrainingStatus::Ready => Ok(()),
            _ => Err(PipelineError::NotInitialized),
        }
    }

    fn construct_classifier(&mut self) {
        match (self.factory)() {
            Ok(classifier) => {
                self.classifier = Some(classifier);
                self.status = TrainingStatus::Ready;
                info!("Classifier initialized");
            }
            Err(err) => {
                error!("Classifier construction failed: {err}");
                self.status = TrainingStatus::Error(err.to_string());
            }
        }
    }

    pub fn status(&self) -> &TrainingStatus {
        &self.status
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Append a captured sample. Rejected while a training run is in flight,
    /// since completion replaces the store contents.
    pub fn add_sample(&mut self, sample: Sample) -> Result<usize, PipelineError> {
        if self.status.is_training() {
            return Err(PipelineError::Busy);
        }
        self.store.append(sample);
        Ok(self.store.len())
    }

    pub fn clear_samples(&mut self) -> Result<(), PipelineError> {
        if self.status.is_training() {
            return Err(PipelineError::Busy);
        }
        self.store.clear();
        Ok(())
    }

    /// Split the store, feed the training share to the classifier, normalize
    /// once and launch the training run.
    ///
    /// Validation failures leave the store, classifier and status untouched.
    /// Failures after validation are fatal for the classifier instance: it is
    /// dropped and [`Trainer::reconstruct`] must run before the next attempt.
    pub fn train(&mut self) -> Result<TrainingStarted, PipelineError> {
        if self.status.is_training() {
            return Err(PipelineError::Busy);
        }
        if self.classifier.is_none() {
            return Err(PipelineError::NotInitialized);
        }
        if self.store.is_empty() {
            return Err(PipelineError::EmptySampleSet);
        }
        let label_count = self.store.label_count();
        if label_count < 2 {
            return Err(PipelineError::InsufficientLabels { found: label_count });
        }
        if training_count(self.store.len(), self.config.train_fraction) == 0 {
            return Err(PipelineError::EmptyTrainingSplit {
                samples: self.store.len(),
            });
        }

        let mut rng = match self.config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (training, held_out) =
            shuffle_split(self.store.samples(), self.config.train_fraction, &mut rng);
        let started = TrainingStarted {
            training: training.len(),
            held_out: held_out.len(),
            training_labels: labels_of(&training),
            held_out_labels: labels_of(&held_out),
        };
        info!(
            "Training on {} samples, holding out {} ({} labels)",
            started.training, started.held_out, label_count
        );

        let Some(mut classifier) = self.classifier.take() else {
            return Err(PipelineError::NotInitialized);
        };
        if let Err(err) = feed_classifier(classifier.as_mut(), &training) {
            return Err(self.fail_training(err.to_string()));
        }

        let options = TrainingOptions {
            epochs: self.config.epochs,
        };
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("handsign-training".into())
            .spawn(move || {
                let mut classifier = classifier;
                let result = classifier.train(&options);
                let _ = tx.send(TrainingFinished { classifier, result });
            });
        if let Err(err) = spawned {
            return Err(self.fail_training(format!("Failed to start training worker: {err}")));
        }

        self.status = TrainingStatus::Training;
        self.pending = Some(PendingTraining {
            held_out,
            rx,
            started: Instant::now(),
        });
        Ok(started)
    }

    /// Check for training completion without blocking.
    pub fn poll(&mut self) -> Option<TrainingEvent> {
        let received = self.pending.as_ref()?.rx.try_recv();
        match received {
            Ok(finished) => Some(self.finish(Some(finished))),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.finish(None)),
        }
    }

    /// Block until the in-flight run resolves or `timeout` elapses.
    pub fn wait_for_training(&mut self, timeout: Duration) -> Option<TrainingEvent> {
        let received = self.pending.as_ref()?.rx.recv_timeout(timeout);
        match received {
            Ok(finished) => Some(self.finish(Some(finished))),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.finish(None)),
        }
    }

    fn finish(&mut self, finished: Option<TrainingFinished>) -> TrainingEvent {
        let Some(pending) = self.pending.take() else {
            return TrainingEvent::Failed {
                reason: "No training run in flight".into(),
            };
        };
        let Some(TrainingFinished { classifier, result }) = finished else {
            let reason = "Training worker stopped unexpectedly".to_string();
            self.fail_training(reason.clone());
            return TrainingEvent::Failed { reason };
        };
        match result {
            Ok(()) => {
                let held_out = pending.held_out.len();
                let elapsed = pending.started.elapsed();
                self.classifier = Some(classifier);
                self.store.replace_all(pending.held_out);
                self.status = TrainingStatus::Trained;
                info!("Training complete in {elapsed:?}; {held_out} samples held out");
                TrainingEvent::Completed { held_out, elapsed }
            }
            Err(err) => {
                drop(classifier);
                let reason = err.to_string();
                self.fail_training(reason.clone());
                TrainingEvent::Failed { reason }
            }
        }
    }

    fn fail_training(&mut self, reason: String) -> PipelineError {
        error!("Training failed: {reason}");
        self.classifier = None;
        self.status = TrainingStatus::Error(reason.clone());
        PipelineError::TrainingFailure(reason)
    }

    /// Classify the live frame with the trained classifier.
    pub fn predict(&self, frame: &DetectionFrame) -> Result<Prediction, PipelineError> {
        let classifier = self.trained_classifier()?;
        let features = encode(frame)?;
        let reference = self
            .store
            .reference_feature_len()
            .or_else(|| classifier.input_len());
        predict_features(classifier, &features, reference)
    }

    /// Run the current held-out samples through the classifier.
    pub fn generate_confusion_matrix(&self) -> Result<EvaluationReport, PipelineError> {
        let classifier = self.trained_classifier()?;
        generate_confusion_matrix(classifier, self.store.samples(), self.store.revision())
    }

    /// Whether `report` still reflects the store contents.
    pub fn is_report_current(&self, report: &EvaluationReport) -> bool {
        report.store_revision == self.store.revision()
    }

    /// Persist the classifier through its own save routine.
    pub fn export_model(&self, dir: &Path, name: &str) -> Result<PathBuf, PipelineError> {
        if self.status.is_training() {
            return Err(PipelineError::Busy);
        }
        let classifier = self
            .classifier
            .as_deref()
            .ok_or(PipelineError::NotInitialized)?;
        let path = classifier.save(dir, name)?;
        info!("Model exported to {}", path.display());
        Ok(path)
    }

    fn trained_classifier(&self) -> Result<&dyn Classifier, PipelineError> {
        match &self.status {
            TrainingStatus::Trained => self
                .classifier
                .as_deref()
                .ok_or(PipelineError::NotInitialized),
            TrainingStatus::Training => Err(PipelineError::Busy),
            _ => Err(PipelineError::NotTrained),
        }
    }
}

fn feed_classifier(
    classifier: &mut dyn Classifier,
    training: &[Sample],
) -> Result<(), ClassifierError> {
    for sample in training {
        classifier.add_data(sample.features(), sample.label())?;
        debug!("Added {:?} sample ({} features)", sample.label(), sample.features().len());
    }
    classifier.normalize_data()
}

fn labels_of(samples: &[Sample]) -> BTreeSet<String> {
    samples.iter().map(|s| s.label().to_string()).collect()
}
