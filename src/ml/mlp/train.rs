use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{MLP_MODEL_VERSION, MlpModel};

/// Hyperparameters for the bundled MLP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpOptions {
    pub hidden_size: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub l2_penalty: f32,
    pub balance_classes: bool,
    pub seed: u64,
}

impl Default for MlpOptions {
    fn default() -> Self {
        Self {
            hidden_size: 32,
            batch_size: 16,
            learning_rate: 0.05,
            l2_penalty: 1e-4,
            balance_classes: true,
            seed: 42,
        }
    }
}

/// Normalized training rows ready for SGD.
#[derive(Debug, Clone)]
pub struct MlpTrainSet<'a> {
    pub classes: &'a [String],
    pub x: &'a [Vec<f32>],
    pub y: &'a [usize],
    pub feature_mean: &'a [f32],
    pub feature_std: &'a [f32],
}

pub fn train_mlp(
    data: &MlpTrainSet<'_>,
    options: &MlpOptions,
    epochs: usize,
) -> Result<MlpModel, String> {
    if data.x.len() != data.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if data.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    let n_classes = data.classes.len();
    if n_classes == 0 {
        return Err("No classes to train".to_string());
    }
    let d = data.feature_mean.len();
    if data.feature_std.len() != d || data.x.iter().any(|row| row.len() != d) {
        return Err("Feature length mismatch".to_string());
    }
    let n = data.x.len();
    let hidden = options.hidden_size.max(1);
    let batch_size = options.batch_size.max(1);
    let mut rng = StdRng::seed_from_u64(options.seed);

    let mut weights1 = vec![0.0f32; hidden * d];
    let mut bias1 = vec![0.0f32; hidden];
    let mut weights2 = vec![0.0f32; n_classes * hidden];
    let mut bias2 = vec![0.0f32; n_classes];
    for w in &mut weights1 {
        *w = (rng.random::<f32>() - 0.5) * 0.1;
    }
    for w in &mut weights2 {
        *w = (rng.random::<f32>() - 0.5) * 0.1;
    }

    let normalized: Vec<Vec<f32>> = data
        .x
        .iter()
        .map(|row| normalize_row(row, data.feature_mean, data.feature_std))
        .collect();
    let class_weights = class_weights(data.y, n_classes, options.balance_classes);

    let mut indices: Vec<usize> = (0..n).collect();
    let mut hidden_pre = vec![0.0f32; hidden];
    let mut hidden_act = vec![0.0f32; hidden];
    let mut logits = vec![0.0f32; n_classes];

    for _epoch in 0..epochs {
        indices.shuffle(&mut rng);
        for batch in indices.chunks(batch_size) {
            let mut d_w1 = vec![0.0f32; weights1.len()];
            let mut d_b1 = vec![0.0f32; bias1.len()];
            let mut d_w2 = vec![0.0f32; weights2.len()];
            let mut d_b2 = vec![0.0f32; bias2.len()];
            let mut batch_weight = 0.0f32;

            for &idx in batch {
                let y = data.y[idx];
                if y >= n_classes || class_weights[y] == 0.0 {
                    continue;
                }
                let weight = class_weights[y];
                let x = &normalized[idx];

                for h in 0..hidden {
                    let base = h * d;
                    let mut sum = bias1[h];
                    for i in 0..d {
                        sum += weights1[base + i] * x[i];
                    }
                    hidden_pre[h] = sum;
                    hidden_act[h] = sum.max(0.0);
                }
                for c in 0..n_classes {
                    let base = c * hidden;
                    let mut sum = bias2[c];
                    for h in 0..hidden {
                        sum += weights2[base + h] * hidden_act[h];
                    }
                    logits[c] = sum;
                }
                let probs = crate::ml::softmax(&logits);

                let mut d_hidden = vec![0.0f32; hidden];
                for c in 0..n_classes {
                    let target = if c == y { 1.0 } else { 0.0 };
                    let dz2 = (probs[c] - target) * weight;
                    d_b2[c] += dz2;
                    let base = c * hidden;
                    for h in 0..hidden {
                        d_w2[base + h] += dz2 * hidden_act[h];
                        d_hidden[h] += dz2 * weights2[base + h];
                    }
                }
                for h in 0..hidden {
                    if hidden_pre[h] <= 0.0 {
                        continue;
                    }
                    d_b1[h] += d_hidden[h];
                    let base = h * d;
                    for i in 0..d {
                        d_w1[base + i] += d_hidden[h] * x[i];
                    }
                }
                batch_weight += weight;
            }

            if batch_weight == 0.0 {
                continue;
            }
            let scale = options.learning_rate / batch_weight;
            let l2 = options.l2_penalty;
            for (w, g) in weights1.iter_mut().zip(&d_w1) {
                *w -= scale * (g + l2 * *w);
            }
            for (b, g) in bias1.iter_mut().zip(&d_b1) {
                *b -= scale * g;
            }
            for (w, g) in weights2.iter_mut().zip(&d_w2) {
                *w -= scale * (g + l2 * *w);
            }
            for (b, g) in bias2.iter_mut().zip(&d_b2) {
                *b -= scale * g;
            }
        }
    }

    Ok(MlpModel {
        model_version: MLP_MODEL_VERSION,
        feature_len: d,
        classes: data.classes.to_vec(),
        hidden_size: hidden,
        weights1,
        bias1,
        weights2,
        bias2,
        feature_mean: data.feature_mean.to_vec(),
        feature_std: data.feature_std.to_vec(),
        epochs_trained: epochs,
    })
}

/// Per-column mean and population standard deviation.
pub fn feature_mean_std(rows: &[Vec<f32>], d: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mean = vec![0.0f32; d];
    for row in rows {
        for (m, &v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let n = rows.len().max(1) as f32;
    for v in &mut mean {
        *v /= n;
    }

    let mut std = vec![0.0f32; d];
    for row in rows {
        for i in 0..d.min(row.len()) {
            let diff = row[i] - mean[i];
            std[i] += diff * diff;
        }
    }
    for v in &mut std {
        *v = (*v / n).sqrt();
    }
    (mean, std)
}

fn normalize_row(row: &[f32], mean: &[f32], std: &[f32]) -> Vec<f32> {
    row.iter()
        .zip(mean.iter().zip(std))
        .map(|(&x, (&m, &s))| (x - m) / s.max(1e-6))
        .collect()
}

fn class_weights(y: &[usize], n_classes: usize, balance: bool) -> Vec<f32> {
    if !balance {
        return vec![1.0; n_classes];
    }
    let mut counts = vec![0f32; n_classes];
    for &label in y {
        if label < n_classes {
            counts[label] += 1.0;
        }
    }
    let total: f32 = counts.iter().sum();
    counts
        .into_iter()
        .map(|count| {
            if count == 0.0 {
                0.0
            } else {
                total / (n_classes as f32 * count)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_std_per_column() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let (mean, std) = feature_mean_std(&rows, 2);
        assert_eq!(mean, vec![2.0, 10.0]);
        assert_eq!(std, vec![1.0, 0.0]);
    }

    #[test]
    fn balanced_weights_favour_rare_classes() {
        let weights = class_weights(&[0, 0, 0, 1], 2, true);
        assert!(weights[1] > weights[0]);
        assert_eq!(class_weights(&[0, 1], 2, false), vec![1.0, 1.0]);
    }

    #[test]
    fn separable_clusters_are_learned() {
        let classes = vec!["left".to_string(), "right".to_string()];
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = i as f32 * 0.001;
            x.push(vec![-1.0 + jitter, 0.2]);
            y.push(0);
            x.push(vec![1.0 - jitter, 0.2]);
            y.push(1);
        }
        let (mean, std) = feature_mean_std(&x, 2);
        let data = MlpTrainSet {
            classes: &classes,
            x: &x,
            y: &y,
            feature_mean: &mean,
            feature_std: &std,
        };
        let model = train_mlp(&data, &MlpOptions::default(), 60).unwrap();
        model.validate().unwrap();
        assert_eq!(model.epochs_trained, 60);
        let left = model.predict_proba(&[-1.0, 0.2]);
        let right = model.predict_proba(&[1.0, 0.2]);
        assert!(left[0] > left[1]);
        assert!(right[1] > right[0]);
    }

    #[test]
    fn single_class_trains_to_certain_model() {
        let classes = vec!["only".to_string()];
        let x = vec![vec![0.0], vec![1.0]];
        let data = MlpTrainSet {
            classes: &classes,
            x: &x,
            y: &[0, 0],
            feature_mean: &[0.5],
            feature_std: &[0.5],
        };
        let model = train_mlp(&data, &MlpOptions::default(), 3).unwrap();
        model.validate().unwrap();
        assert_eq!(model.predict_proba(&[0.25]), vec![1.0]);
    }

    #[test]
    fn rejects_empty_class_axis() {
        let x = vec![vec![0.0]];
        let data = MlpTrainSet {
            classes: &[],
            x: &x,
            y: &[0],
            feature_mean: &[0.0],
            feature_std: &[1.0],
        };
        assert!(train_mlp(&data, &MlpOptions::default(), 1).is_err());
    }
}
