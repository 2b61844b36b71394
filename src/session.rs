//! Operator session: live frame, label, status line and the actions wired to
//! the training controls.
//!
//! Every action reports its outcome twice: as a `Result` for callers and as
//! the human-readable status line shown to the operator.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::TrainerSettings;
use crate::error::PipelineError;
use crate::evaluation::EvaluationReport;
use crate::export::write_samples_export;
use crate::landmarks::DetectionFrame;
use crate::prediction::Prediction;
use crate::samples::Sample;
use crate::trainer::{
    ClassifierFactory, Trainer, TrainingEvent, TrainingStarted, TrainingStatus,
};

/// Visual tone of the status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusTone {
    Idle,
    Busy,
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

pub struct OperatorSession {
    trainer: Trainer,
    live_frame: DetectionFrame,
    label: String,
    status: StatusLine,
    model_name: String,
    export_file_name: String,
    export_dir: PathBuf,
    last_report: Option<EvaluationReport>,
}

impl OperatorSession {
    pub fn new(settings: &TrainerSettings, export_dir: PathBuf, factory: ClassifierFactory) -> Self {
        let trainer = Trainer::new(settings.training(), factory);
        let status = match trainer.status() {
            TrainingStatus::Ready => StatusLine {
                text: "Model initialized".into(),
                tone: StatusTone::Idle,
            },
            TrainingStatus::Error(reason) => StatusLine {
                text: format!("Error: {reason}"),
                tone: StatusTone::Error,
            },
            _ => StatusLine {
                text: "Model not initialized".into(),
                tone: StatusTone::Warning,
            },
        };
        Self {
            trainer,
            live_frame: DetectionFrame::empty(),
            label: String::new(),
            status,
            model_name: settings.model_name.clone(),
            export_file_name: settings.export_file_name.clone(),
            export_dir,
            last_report: None,
        }
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn status_text(&self) -> &str {
        &self.status.text
    }

    pub fn samples_collected(&self) -> usize {
        self.trainer.store().len()
    }

    /// Distinct labels joined for display; empty when no samples exist.
    pub fn unique_labels(&self) -> String {
        self.trainer.store().label_summary()
    }

    /// Whether the train/predict/export controls should accept input.
    pub fn controls_enabled(&self) -> bool {
        self.trainer.has_classifier() && !self.trainer.status().is_training()
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Store the latest detector output.
    pub fn on_frame(&mut self, frame: DetectionFrame) {
        self.live_frame = frame;
    }

    pub fn live_frame(&self) -> &DetectionFrame {
        &self.live_frame
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn set_status(&mut self, text: impl Into<String>, tone: StatusTone) {
        self.status = StatusLine {
            text: text.into(),
            tone,
        };
    }

    pub fn add_sample(&mut self) -> Result<usize, PipelineError> {
        let result = Sample::from_frame(&self.live_frame, self.label.trim())
            .and_then(|sample| self.trainer.add_sample(sample));
        match &result {
            Ok(total) => {
                let text = format!(
                    "Sample added for \"{}\". Total samples: {total}",
                    self.label.trim()
                );
                self.set_status(text, StatusTone::Info);
            }
            Err(PipelineError::EmptyLabel) => {
                self.set_status("Please enter a label first", StatusTone::Warning)
            }
            Err(PipelineError::EmptyFrame) => {
                self.set_status("No pose data available to sample", StatusTone::Warning)
            }
            Err(err) => self.set_status(format!("Error: {err}"), StatusTone::Error),
        }
        result
    }

    pub fn train(&mut self) -> Result<TrainingStarted, PipelineError> {
        let result = self.trainer.train();
        match &result {
            Ok(started) => {
                info!(
                    "Training submitted ({} train / {} held out)",
                    started.training, started.held_out
                );
                self.last_report = None;
                self.set_status("Training model...", StatusTone::Busy);
            }
            Err(PipelineError::NotInitialized) => {
                self.set_status("Model not initialized", StatusTone::Warning)
            }
            Err(PipelineError::EmptySampleSet) => {
                self.set_status("No data to train", StatusTone::Warning)
            }
            Err(PipelineError::TrainingFailure(reason)) => {
                self.set_status(format!("Error: {reason}"), StatusTone::Error)
            }
            Err(
                err @ (PipelineError::InsufficientLabels { .. }
                | PipelineError::EmptyTrainingSplit { .. }),
            ) => {
                self.set_status(format!("Error: {err}"), StatusTone::Warning)
            }
            Err(err) => self.set_status(format!("Error: {err}"), StatusTone::Error),
        }
        result
    }

    /// Drain training completion; call once per frame.
    pub fn poll(&mut self) -> Option<TrainingEvent> {
        let event = self.trainer.poll()?;
        self.apply_training_event(&event);
        Some(event)
    }

    /// Block until the current training run resolves or `timeout` elapses.
    pub fn wait_for_training(&mut self, timeout: std::time::Duration) -> Option<TrainingEvent> {
        let event = self.trainer.wait_for_training(timeout)?;
        self.apply_training_event(&event);
        Some(event)
    }

    fn apply_training_event(&mut self, event: &TrainingEvent) {
        match event {
            TrainingEvent::Completed { .. } => {
                self.set_status("Training complete - ready to export", StatusTone::Info)
            }
            TrainingEvent::Failed { reason } => {
                self.set_status(format!("Error: {reason}"), StatusTone::Error)
            }
        }
    }

    /// Rebuild the classifier after a fatal training failure.
    pub fn reconstruct_model(&mut self) -> Result<(), PipelineError> {
        let result = self.trainer.reconstruct();
        match &result {
            Ok(()) => self.set_status("Model initialized", StatusTone::Idle),
            Err(err) => self.set_status(format!("Error: {err}"), StatusTone::Error),
        }
        result
    }

    pub fn predict(&mut self) -> Result<Prediction, PipelineError> {
        let result = self.trainer.predict(&self.live_frame);
        match &result {
            Ok(prediction) => {
                self.set_status(format!("Prediction: {prediction}"), StatusTone::Info)
            }
            Err(PipelineError::EmptyFrame) => {
                self.set_status("No pose data available to predict", StatusTone::Warning)
            }
            Err(PipelineError::Classifier(err)) => {
                error!("Prediction failed: {err}");
                self.set_status("Prediction error", StatusTone::Error);
            }
            Err(err) => self.set_status(format!("Error: {err}"), StatusTone::Warning),
        }
        result
    }

    /// Evaluate the held-out samples and remember the report.
    pub fn evaluate(&mut self) -> Result<&EvaluationReport, PipelineError> {
        match self.trainer.generate_confusion_matrix() {
            Ok(report) => {
                let mut text = format!(
                    "Evaluated {} of {} held-out samples (accuracy {:.2}%)",
                    report.evaluated(),
                    report.held_out,
                    report.accuracy() * 100.0
                );
                if report.skipped > 0 {
                    text.push_str(&format!(", {} failed", report.skipped));
                }
                if report.unmatched > 0 {
                    text.push_str(&format!(", {} predicted unseen labels", report.unmatched));
                }
                self.set_status(text, StatusTone::Info);
                Ok(self.last_report.insert(report))
            }
            Err(err) => {
                warn!("Evaluation unavailable: {err}");
                self.set_status(format!("Error: {err}"), StatusTone::Warning);
                Err(err)
            }
        }
    }

    /// Last evaluation report, if the sample store has not changed since.
    pub fn current_report(&self) -> Option<&EvaluationReport> {
        self.last_report
            .as_ref()
            .filter(|report| self.trainer.is_report_current(report))
    }

    /// Write the samples currently held to the export directory.
    pub fn export_samples(&mut self) -> Result<PathBuf, PipelineError> {
        let result = write_samples_export(
            &self.export_dir,
            &self.export_file_name,
            self.trainer.store().samples(),
        );
        match &result {
            Ok(path) => {
                let text = format!(
                    "Exported {} samples to {}",
                    self.trainer.store().len(),
                    path.display()
                );
                self.set_status(text, StatusTone::Info);
            }
            Err(PipelineError::NoData) => {
                self.set_status("No samples to export", StatusTone::Warning)
            }
            Err(err) => {
                error!("Sample export failed: {err}");
                self.set_status(format!("Error: {err}"), StatusTone::Error);
            }
        }
        result
    }

    pub fn export_model(&mut self) -> Result<PathBuf, PipelineError> {
        self.set_status("Exporting model...", StatusTone::Busy);
        let result = self.trainer.export_model(&self.export_dir, &self.model_name);
        match &result {
            Ok(_) => {
                let text = format!("Model exported successfully as \"{}\"", self.model_name);
                self.set_status(text, StatusTone::Info);
            }
            Err(PipelineError::NotInitialized) => {
                self.set_status("Model not initialized", StatusTone::Warning)
            }
            Err(err) => {
                error!("Model export failed: {err}");
                self.set_status("Error exporting model", StatusTone::Error);
            }
        }
        result
    }
}
