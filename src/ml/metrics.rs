//! Evaluation metrics for classification models.

use std::collections::BTreeSet;

/// Confusion matrix over a sorted label axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Sorted, distinct class labels; rows are truth, columns predictions.
    pub labels: Vec<String>,
    /// Row-major `KxK` counts (`truth * K + predicted`).
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    /// Create an empty matrix; `labels` are sorted and deduplicated.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let k = labels.len();
        Self {
            labels,
            counts: vec![0; k * k],
        }
    }

    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|probe| probe.as_str().cmp(label))
            .ok()
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        let k = self.n_classes();
        if truth >= k || predicted >= k {
            return;
        }
        let idx = truth * k + predicted;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    /// Count one `(truth, predicted)` pair by label. Returns `false` when
    /// either label is off the axis.
    pub fn record(&mut self, truth: &str, predicted: &str) -> bool {
        match (self.index_of(truth), self.index_of(predicted)) {
            (Some(t), Some(p)) => {
                self.add(t, p);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes() + predicted]
    }

    /// Count for a label pair, zero when either label is unknown.
    pub fn count(&self, truth: &str, predicted: &str) -> u32 {
        match (self.index_of(truth), self.index_of(predicted)) {
            (Some(t), Some(p)) => self.get(t, p),
            _ => 0,
        }
    }

    pub fn row(&self, truth: usize) -> &[u32] {
        let k = self.n_classes();
        &self.counts[truth * k..(truth + 1) * k]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&v| v as u64).sum()
    }
}

/// Precision/recall statistics for a single class.
#[derive(Debug, Clone, PartialEq)]
pub struct PerClassStats {
    pub label: String,
    /// `TP / (TP + FP)`.
    pub precision: f32,
    /// `TP / (TP + FN)`.
    pub recall: f32,
    /// Total number of true examples for the class.
    pub support: u32,
}

/// Compute per-class precision and recall from a confusion matrix.
pub fn precision_recall_by_class(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes();
    let mut stats = Vec::with_capacity(k);
    for class_idx in 0..k {
        let tp = cm.get(class_idx, class_idx) as f32;
        let mut fp = 0f32;
        let mut fn_ = 0f32;
        let mut support = 0u32;
        for j in 0..k {
            let v = cm.get(class_idx, j);
            support = support.saturating_add(v);
            if j != class_idx {
                fn_ += v as f32;
            }
        }
        for i in 0..k {
            if i != class_idx {
                fp += cm.get(i, class_idx) as f32;
            }
        }
        let precision = if tp + fp == 0.0 { 0.0 } else { tp / (tp + fp) };
        let recall = if tp + fn_ == 0.0 { 0.0 } else { tp / (tp + fn_) };
        stats.push(PerClassStats {
            label: cm.labels[class_idx].clone(),
            precision,
            recall,
            support,
        });
    }
    stats
}

/// Compute overall accuracy from a confusion matrix.
pub fn accuracy(cm: &ConfusionMatrix) -> f32 {
    let total = cm.total();
    if total == 0 {
        return 0.0;
    }
    let correct: u64 = (0..cm.n_classes()).map(|i| cm.get(i, i) as u64).sum();
    (correct as f32) / (total as f32)
}
