//! Live prediction against the trained classifier.

use std::fmt;

use crate::error::PipelineError;
use crate::ml::{Classification, Classifier, ClassifierError};

/// Top-1 prediction for a live frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Top-1 probability as a percentage, rounded to two decimals.
    pub confidence_pct: f64,
    /// Every score returned by the classifier, best first.
    pub scores: Vec<Classification>,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence_pct)
    }
}

/// Convert a `[0, 1]` probability to a two-decimal percentage.
pub fn confidence_percent(confidence: f32) -> f64 {
    let pct = (confidence as f64 * 100.0).clamp(0.0, 100.0);
    (pct * 100.0).round() / 100.0
}

/// Classify `features` after checking them against the reference shape.
///
/// A mismatch fails with [`PipelineError::ShapeMismatch`] without calling the
/// classifier.
pub fn predict_features(
    classifier: &dyn Classifier,
    features: &[f32],
    reference_len: Option<usize>,
) -> Result<Prediction, PipelineError> {
    if features.is_empty() {
        return Err(PipelineError::EmptyFrame);
    }
    if let Some(expected) = reference_len {
        if expected != features.len() {
            return Err(PipelineError::ShapeMismatch {
                expected,
                actual: features.len(),
            });
        }
    }
    let scores = classifier.classify(features)?;
    let top = scores.first().ok_or_else(|| {
        PipelineError::Classifier(ClassifierError::Backend(
            "Classifier returned no results".into(),
        ))
    })?;
    let label = top.label.clone();
    let confidence_pct = confidence_percent(top.confidence);
    Ok(Prediction {
        label,
        confidence_pct,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::ml::TrainingOptions;

    #[derive(Default)]
    struct Fixed {
        calls: Cell<usize>,
    }

    impl Classifier for Fixed {
        fn add_data(&mut self, _: &[f32], _: &str) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn normalize_data(&mut self) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn train(&mut self, _: &TrainingOptions) -> Result<(), ClassifierError> {
            Ok(())
        }
        fn classify(&self, _: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![
                Classification {
                    label: "open".into(),
                    confidence: 0.87654,
                },
                Classification {
                    label: "fist".into(),
                    confidence: 0.12346,
                },
            ])
        }
        fn save(&self, dir: &Path, _: &str) -> Result<PathBuf, ClassifierError> {
            Ok(dir.to_path_buf())
        }
    }

    #[test]
    fn confidence_is_rounded_percentage() {
        assert_eq!(confidence_percent(0.5), 50.0);
        assert_eq!(confidence_percent(1.5), 100.0);
        assert!((confidence_percent(0.123456) - 12.35).abs() < 1e-9);
    }

    #[test]
    fn shape_mismatch_never_reaches_classifier() {
        let clf = Fixed::default();
        let err = predict_features(&clf, &vec![0.0; 63], Some(126)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ShapeMismatch {
                expected: 126,
                actual: 63
            }
        ));
        assert_eq!(clf.calls.get(), 0);
    }

    #[test]
    fn top_score_becomes_the_prediction() {
        let clf = Fixed::default();
        let prediction = predict_features(&clf, &vec![0.0; 63], Some(63)).unwrap();
        assert_eq!(prediction.label, "open");
        assert_eq!(prediction.to_string(), "open (87.65%)");
        assert_eq!(prediction.scores.len(), 2);
    }
}
