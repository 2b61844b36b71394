//! Labeled samples collected by the operator.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::PipelineError;
use crate::features::{FeatureVector, encode};
use crate::landmarks::DetectionFrame;

/// One labeled feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    features: FeatureVector,
    label: String,
}

impl Sample {
    /// Create a sample, rejecting empty features or a blank label.
    pub fn new(features: FeatureVector, label: impl Into<String>) -> Result<Self, PipelineError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(PipelineError::EmptyLabel);
        }
        if features.is_empty() {
            return Err(PipelineError::EmptyFrame);
        }
        Ok(Self { features, label })
    }

    /// Encode the live frame and attach `label`.
    pub fn from_frame(frame: &DetectionFrame, label: impl Into<String>) -> Result<Self, PipelineError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(PipelineError::EmptyLabel);
        }
        let features = encode(frame)?;
        for (idx, hand) in frame.hands.iter().enumerate() {
            let wrist = hand.wrist();
            debug!(
                "Sample {label:?} hand {idx} wrist at ({:.3}, {:.3}, {:.3})",
                wrist.x, wrist.y, wrist.z
            );
        }
        Self::new(features, label)
    }

    pub fn features(&self) -> &[f32] {
        &self.features
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered sample collection owned by the trainer.
///
/// Every mutation bumps [`SampleStore::revision`], which is how stale
/// confusion matrices are recognised.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
    revision: u64,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
        self.bump();
    }

    pub fn replace_all(&mut self, samples: Vec<Sample>) {
        self.samples = samples;
        self.bump();
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.bump();
    }

    /// Distinct labels in sorted order.
    pub fn labels(&self) -> BTreeSet<String> {
        self.samples
            .iter()
            .map(|sample| sample.label.clone())
            .collect()
    }

    pub fn label_count(&self) -> usize {
        self.labels().len()
    }

    /// Labels joined for display, e.g. `"fist, open"`.
    pub fn label_summary(&self) -> String {
        self.labels().into_iter().collect::<Vec<_>>().join(", ")
    }

    /// Feature length of the first stored sample, used as the reference shape.
    pub fn reference_feature_len(&self) -> Option<usize> {
        self.samples.first().map(|sample| sample.features.len())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
