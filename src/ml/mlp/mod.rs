//! Lightweight MLP classifier for hand landmark feature vectors.

mod model;
mod train;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use model::{MLP_MODEL_VERSION, MlpModel};
pub use train::{MlpOptions, MlpTrainSet, feature_mean_std, train_mlp};

use crate::ml::classifier::{Classification, Classifier, ClassifierError, TrainingOptions};

#[derive(Debug, Clone)]
struct Normalization {
    mean: Vec<f32>,
    std: Vec<f32>,
    rows_seen: usize,
}

/// Incremental classifier: rows accumulate across training runs.
#[derive(Debug, Clone, Default)]
pub struct MlpClassifier {
    options: MlpOptions,
    rows: Vec<Vec<f32>>,
    labels: Vec<String>,
    normalization: Option<Normalization>,
    model: Option<MlpModel>,
}

impl MlpClassifier {
    pub fn new(options: MlpOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn model(&self) -> Option<&MlpModel> {
        self.model.as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn expected_len(&self) -> Option<usize> {
        self.model
            .as_ref()
            .map(|model| model.feature_len)
            .or_else(|| self.rows.first().map(Vec::len))
    }
}

impl Classifier for MlpClassifier {
    fn add_data(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError> {
        if features.is_empty() {
            return Err(ClassifierError::EmptyInput);
        }
        if let Some(expected) = self.expected_len() {
            if expected != features.len() {
                return Err(ClassifierError::InputLength {
                    expected,
                    actual: features.len(),
                });
            }
        }
        self.rows.push(features.to_vec());
        self.labels.push(label.to_string());
        Ok(())
    }

    fn normalize_data(&mut self) -> Result<(), ClassifierError> {
        let Some(first) = self.rows.first() else {
            return Err(ClassifierError::NoData);
        };
        let (mean, std) = feature_mean_std(&self.rows, first.len());
        debug!("Normalized {} rows of {} features", self.rows.len(), mean.len());
        self.normalization = Some(Normalization {
            mean,
            std,
            rows_seen: self.rows.len(),
        });
        Ok(())
    }

    fn train(&mut self, options: &TrainingOptions) -> Result<(), ClassifierError> {
        if self.rows.is_empty() {
            return Err(ClassifierError::NoData);
        }
        let Some(norm) = self
            .normalization
            .as_ref()
            .filter(|norm| norm.rows_seen == self.rows.len())
        else {
            return Err(ClassifierError::NotNormalized);
        };
        let classes: Vec<String> = self
            .labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() == 1 {
            debug!("Training rows hold a single class ({:?})", classes[0]);
        }
        let y: Vec<usize> = self
            .labels
            .iter()
            .filter_map(|label| classes.binary_search(label).ok())
            .collect();
        let data = MlpTrainSet {
            classes: &classes,
            x: &self.rows,
            y: &y,
            feature_mean: &norm.mean,
            feature_std: &norm.std,
        };
        let model =
            train_mlp(&data, &self.options, options.epochs).map_err(ClassifierError::Backend)?;
        info!(
            "Trained MLP on {} rows, {} classes, {} epochs",
            self.rows.len(),
            classes.len(),
            options.epochs
        );
        self.model = Some(model);
        Ok(())
    }

    fn classify(&self, features: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        if features.len() != model.feature_len {
            return Err(ClassifierError::InputLength {
                expected: model.feature_len,
                actual: features.len(),
            });
        }
        let proba = model.predict_proba(features);
        let mut results: Vec<Classification> = model
            .classes
            .iter()
            .zip(proba)
            .map(|(label, confidence)| Classification {
                label: label.clone(),
                confidence,
            })
            .collect();
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(results)
    }

    fn save(&self, dir: &Path, name: &str) -> Result<PathBuf, ClassifierError> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        std::fs::create_dir_all(dir).map_err(|source| ClassifierError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{name}.json"));
        let json = serde_json::to_string_pretty(model)?;
        std::fs::write(&path, json).map_err(|source| ClassifierError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    fn input_len(&self) -> Option<usize> {
        self.expected_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> MlpClassifier {
        let mut clf = MlpClassifier::new(MlpOptions::default());
        for i in 0..10 {
            let j = i as f32 * 0.01;
            clf.add_data(&[0.0 + j, 1.0, 0.5], "fist").unwrap();
            clf.add_data(&[1.0 - j, 0.0, 0.5], "open").unwrap();
        }
        clf.normalize_data().unwrap();
        clf.train(&TrainingOptions { epochs: 80 }).unwrap();
        clf
    }

    #[test]
    fn classify_sorts_by_descending_confidence() {
        let clf = trained();
        let results = clf.classify(&[0.0, 1.0, 0.5]).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].confidence >= results[1].confidence);
        assert_eq!(results[0].label, "fist");
    }

    #[test]
    fn train_requires_fresh_normalization() {
        let mut clf = MlpClassifier::new(MlpOptions::default());
        clf.add_data(&[0.0], "a").unwrap();
        clf.add_data(&[1.0], "b").unwrap();
        clf.normalize_data().unwrap();
        clf.add_data(&[2.0], "b").unwrap();
        let err = clf.train(&TrainingOptions::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::NotNormalized));
    }

    #[test]
    fn add_data_enforces_consistent_length() {
        let mut clf = MlpClassifier::new(MlpOptions::default());
        clf.add_data(&[0.0, 1.0], "a").unwrap();
        let err = clf.add_data(&[0.0], "a").unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::InputLength {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(clf.input_len(), Some(2));
    }

    #[test]
    fn classify_before_training_fails() {
        let clf = MlpClassifier::new(MlpOptions::default());
        assert!(matches!(
            clf.classify(&[0.0]),
            Err(ClassifierError::NotTrained)
        ));
    }

    #[test]
    fn save_writes_named_json() {
        let clf = trained();
        let dir = tempfile::tempdir().unwrap();
        let path = clf.save(dir.path(), "hand-sign-model").unwrap();
        assert_eq!(path, dir.path().join("hand-sign-model.json"));
        let model: MlpModel =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        model.validate().unwrap();
        assert_eq!(model.classes, vec!["fist", "open"]);
    }
}
