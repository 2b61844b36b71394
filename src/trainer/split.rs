use rand::Rng;
use rand::seq::SliceRandom;

use crate::samples::Sample;

/// Number of samples that go to training: `floor(fraction * n)`, capped at `n`.
pub fn training_count(n: usize, fraction: f64) -> usize {
    // The epsilon keeps products such as 5 * 0.8 from landing just under an integer.
    let raw = (n as f64 * fraction + 1e-9).floor();
    (raw.max(0.0) as usize).min(n)
}

/// Shuffle `samples` and split them into `(training, held_out)`.
pub fn shuffle_split<R: Rng + ?Sized>(
    samples: &[Sample],
    fraction: f64,
    rng: &mut R,
) -> (Vec<Sample>, Vec<Sample>) {
    let mut shuffled = samples.to_vec();
    shuffled.shuffle(rng);
    let held_out = shuffled.split_off(training_count(shuffled.len(), fraction));
    (shuffled, held_out)
}
