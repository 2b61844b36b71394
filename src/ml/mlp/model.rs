use serde::{Deserialize, Serialize};

use crate::ml::softmax;

/// Current on-disk model version.
pub const MLP_MODEL_VERSION: i64 = 1;

/// Trained single-hidden-layer network with its normalization statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModel {
    pub model_version: i64,
    pub feature_len: usize,
    pub classes: Vec<String>,
    pub hidden_size: usize,
    pub weights1: Vec<f32>,
    pub bias1: Vec<f32>,
    pub weights2: Vec<f32>,
    pub bias2: Vec<f32>,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
    #[serde(default)]
    pub epochs_trained: usize,
}

impl MlpModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MLP_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {})",
                self.model_version, MLP_MODEL_VERSION
            ));
        }
        let input = self.feature_len;
        let hidden = self.hidden_size;
        let classes = self.classes.len();
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != classes {
            return Err("bias2 length mismatch".to_string());
        }
        if self.feature_mean.len() != input {
            return Err("feature_mean length mismatch".to_string());
        }
        if self.feature_std.len() != input {
            return Err("feature_std length mismatch".to_string());
        }
        Ok(())
    }

    /// Class probabilities aligned with `classes`; empty on a length mismatch.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.feature_len {
            return Vec::new();
        }
        let input = self.feature_len;
        let hidden = self.hidden_size;
        let classes = self.classes.len();
        if classes == 0 || hidden == 0 {
            return Vec::new();
        }

        let normalized: Vec<f32> = features
            .iter()
            .zip(self.feature_mean.iter().zip(&self.feature_std))
            .map(|(&x, (&mean, &std))| (x - mean) / std.max(1e-6))
            .collect();

        let mut hidden_act = vec![0.0f32; hidden];
        for h in 0..hidden {
            let base = h * input;
            let sum = self.bias1[h]
                + self.weights1[base..base + input]
                    .iter()
                    .zip(&normalized)
                    .map(|(w, x)| w * x)
                    .sum::<f32>();
            hidden_act[h] = sum.max(0.0);
        }

        let mut logits = vec![0.0f32; classes];
        for c in 0..classes {
            let base = c * hidden;
            logits[c] = self.bias2[c]
                + self.weights2[base..base + hidden]
                    .iter()
                    .zip(&hidden_act)
                    .map(|(w, a)| w * a)
                    .sum::<f32>();
        }

        softmax(&logits)
    }
}
