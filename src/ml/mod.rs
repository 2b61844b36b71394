//! Machine learning building blocks for hand-sign classification.
//!
//! [`classifier::Classifier`] is the seam the trainer drives; [`mlp`] provides
//! the bundled implementation and [`metrics`] the evaluation math.

pub mod classifier;
pub mod metrics;
pub mod mlp;

pub use classifier::{Classification, Classifier, ClassifierError, TrainingOptions};

/// Numerically stable softmax. Falls back to a uniform distribution when all
/// exponentials underflow.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let out = softmax(&[1.0, 3.0, 2.0]);
        let sum: f32 = out.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(out[1] > out[2] && out[2] > out[0]);
    }

    #[test]
    fn softmax_of_empty_is_empty() {
        assert!(softmax(&[]).is_empty());
    }
}
