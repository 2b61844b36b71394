//! Held-out evaluation producing a label x label confusion matrix.

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::ml::metrics::{ConfusionMatrix, PerClassStats, accuracy, precision_recall_by_class};
use crate::ml::Classifier;
use crate::samples::Sample;

/// Result of one evaluation sweep.
///
/// Cell totals equal `held_out - skipped - unmatched`; failed samples are
/// reported here rather than hidden.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub matrix: ConfusionMatrix,
    pub held_out: usize,
    /// Samples whose classification call failed.
    pub skipped: usize,
    /// Samples predicted as a label absent from the held-out axis.
    pub unmatched: usize,
    /// Sample store revision the sweep was computed against.
    pub store_revision: u64,
}

impl EvaluationReport {
    pub fn evaluated(&self) -> u64 {
        self.matrix.total()
    }

    pub fn accuracy(&self) -> f32 {
        accuracy(&self.matrix)
    }

    pub fn per_class(&self) -> Vec<PerClassStats> {
        precision_recall_by_class(&self.matrix)
    }

    /// Plain-text table, rows are true labels and columns predictions.
    pub fn render_table(&self) -> String {
        let labels = &self.matrix.labels;
        let width = labels.iter().map(String::len).max().unwrap_or(0).max(6);
        let mut out = format!("{:>width$}", "");
        for label in labels {
            out.push_str(&format!(" {label:>width$}"));
        }
        out.push('\n');
        for (truth, label) in labels.iter().enumerate() {
            out.push_str(&format!("{label:>width$}"));
            for count in self.matrix.row(truth) {
                out.push_str(&format!(" {count:>width$}"));
            }
            out.push('\n');
        }
        out
    }
}

/// Classify every held-out sample in order and tally the outcomes.
///
/// Calls are issued one at a time; a failed call is logged and its sample is
/// skipped.
pub fn generate_confusion_matrix(
    classifier: &dyn Classifier,
    held_out: &[Sample],
    store_revision: u64,
) -> Result<EvaluationReport, PipelineError> {
    if held_out.is_empty() {
        return Err(PipelineError::EmptySampleSet);
    }
    let mut matrix = ConfusionMatrix::new(held_out.iter().map(Sample::label));
    let mut skipped = 0usize;
    let mut unmatched = 0usize;
    for (idx, sample) in held_out.iter().enumerate() {
        let predicted = match classifier.classify(sample.features()) {
            Ok(results) => match results.into_iter().next() {
                Some(top) => top.label,
                None => {
                    warn!("Evaluation sample {idx} returned no scores; skipping");
                    skipped += 1;
                    continue;
                }
            },
            Err(err) => {
                warn!("Evaluation sample {idx} failed to classify: {err}");
                skipped += 1;
                continue;
            }
        };
        if !matrix.record(sample.label(), &predicted) {
            warn!(
                "Evaluation sample {idx} predicted {predicted:?}, which is not among the held-out labels"
            );
            unmatched += 1;
        }
    }
    info!(
        "Evaluated {} of {} held-out samples ({} skipped, {} off-axis)",
        matrix.total(),
        held_out.len(),
        skipped,
        unmatched
    );
    Ok(EvaluationReport {
        matrix,
        held_out: held_out.len(),
        skipped,
        unmatched,
        store_revision,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::ml::{Classification, ClassifierError, TrainingOptions};

    /// Predicts the label encoded in the first feature: `< 0.5` is "a".
    struct ThresholdClassifier {
        fail_on_call: Option<usize>,
        calls: Cell<usize>,
    }

    impl ThresholdClassifier {
        fn new(fail_on_call: Option<usize>) -> Self {
            Self {
                fail_on_call,
                calls: Cell::new(0),
            }
        }
    }

    impl Classifier for ThresholdClassifier {
        fn add_data(&mut self, _: &[f32], _: &str) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn normalize_data(&mut self) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn train(&mut self, _: &TrainingOptions) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn classify(&self, features: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if self.fail_on_call == Some(call) {
                return Err(ClassifierError::Backend("boom".into()));
            }
            let label = if features[0] < 0.5 { "a" } else { "b" };
            Ok(vec![Classification {
                label: label.into(),
                confidence: 0.9,
            }])
        }
        fn save(&self, dir: &Path, _: &str) -> Result<PathBuf, ClassifierError> {
            Ok(dir.to_path_buf())
        }
    }

    fn sample(value: f32, label: &str) -> Sample {
        Sample::new(vec![value; 63], label).unwrap()
    }

    #[test]
    fn totals_match_held_out_size_without_failures() {
        let held_out = vec![sample(0.1, "a"), sample(0.9, "a"), sample(0.8, "b")];
        let report =
            generate_confusion_matrix(&ThresholdClassifier::new(None), &held_out, 7).unwrap();
        assert_eq!(report.evaluated(), 3);
        assert_eq!(report.matrix.count("a", "a"), 1);
        assert_eq!(report.matrix.count("a", "b"), 1);
        assert_eq!(report.matrix.count("b", "b"), 1);
        assert_eq!(report.store_revision, 7);
    }

    #[test]
    fn failed_classification_is_skipped_not_fatal() {
        let held_out = vec![sample(0.1, "a"), sample(0.9, "b"), sample(0.2, "a")];
        let report =
            generate_confusion_matrix(&ThresholdClassifier::new(Some(1)), &held_out, 0).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.evaluated(), 2);
        assert!(report.evaluated() < report.held_out as u64);
    }

    #[test]
    fn off_axis_prediction_is_counted_separately() {
        let held_out = vec![sample(0.1, "a"), sample(0.2, "a"), sample(0.9, "a")];
        let report =
            generate_confusion_matrix(&ThresholdClassifier::new(None), &held_out, 0).unwrap();
        assert_eq!(report.matrix.labels, vec!["a"]);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.evaluated(), 2);
    }

    #[test]
    fn empty_held_out_set_is_rejected() {
        let err = generate_confusion_matrix(&ThresholdClassifier::new(None), &[], 0).unwrap_err();
        assert!(matches!(err, PipelineError::EmptySampleSet));
    }

    #[test]
    fn table_lists_rows_in_label_order() {
        let held_out = vec![sample(0.9, "b"), sample(0.1, "a")];
        let report =
            generate_confusion_matrix(&ThresholdClassifier::new(None), &held_out, 0).unwrap();
        let table = report.render_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with('a'));
        assert!(lines[2].trim_start().starts_with('b'));
    }
}
