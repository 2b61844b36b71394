use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use handsign::ml::{Classification, Classifier, ClassifierError, TrainingOptions};
use handsign::trainer::ClassifierFactory;

/// Calls observed by every classifier built from one factory.
#[derive(Debug, Default)]
pub struct CallLog {
    pub added: Vec<(usize, String)>,
    pub normalized: usize,
    pub trained: Vec<usize>,
    pub classified: usize,
}

/// Nearest-mean classifier over the first feature; deterministic and quick.
pub struct FakeClassifier {
    log: Arc<Mutex<CallLog>>,
    fail_train: bool,
    rows: Vec<(f32, String)>,
    means: Vec<(String, f32)>,
}

impl Classifier for FakeClassifier {
    fn add_data(&mut self, features: &[f32], label: &str) -> Result<(), ClassifierError> {
        self.log
            .lock()
            .unwrap()
            .added
            .push((features.len(), label.to_string()));
        self.rows.push((features[0], label.to_string()));
        Ok(())
    }

    fn normalize_data(&mut self) -> Result<(), ClassifierError> {
        self.log.lock().unwrap().normalized += 1;
        Ok(())
    }

    fn train(&mut self, options: &TrainingOptions) -> Result<(), ClassifierError> {
        self.log.lock().unwrap().trained.push(options.epochs);
        if self.fail_train {
            return Err(ClassifierError::Backend("simulated failure".into()));
        }
        let mut sums: Vec<(String, f32, usize)> = Vec::new();
        for (value, label) in &self.rows {
            match sums.iter_mut().find(|(name, _, _)| name == label) {
                Some(entry) => {
                    entry.1 += value;
                    entry.2 += 1;
                }
                None => sums.push((label.clone(), *value, 1)),
            }
        }
        self.means = sums
            .into_iter()
            .map(|(label, sum, count)| (label, sum / count as f32))
            .collect();
        Ok(())
    }

    fn classify(&self, features: &[f32]) -> Result<Vec<Classification>, ClassifierError> {
        self.log.lock().unwrap().classified += 1;
        if self.means.is_empty() {
            return Err(ClassifierError::NotTrained);
        }
        let mut scored: Vec<Classification> = self
            .means
            .iter()
            .map(|(label, mean)| Classification {
                label: label.clone(),
                confidence: 1.0 / (1.0 + (features[0] - mean).abs()),
            })
            .collect();
        scored.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        Ok(scored)
    }

    fn save(&self, dir: &Path, name: &str) -> Result<PathBuf, ClassifierError> {
        std::fs::create_dir_all(dir).map_err(|source| ClassifierError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{name}.txt"));
        let body = self
            .means
            .iter()
            .map(|(label, mean)| format!("{label}={mean}"))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&path, body).map_err(|source| ClassifierError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

pub fn fake_factory(fail_train: bool) -> (ClassifierFactory, Arc<Mutex<CallLog>>) {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let shared = Arc::clone(&log);
    let factory: ClassifierFactory = Box::new(move || {
        Ok(Box::new(FakeClassifier {
            log: Arc::clone(&shared),
            fail_train,
            rows: Vec::new(),
            means: Vec::new(),
        }) as Box<dyn Classifier>)
    });
    (factory, log)
}
