//! Flat feature encoding for detection frames.
//!
//! Hands are flattened in detection order, landmarks in index order and
//! coordinates as `x, y, z`. Raw detector coordinates are used as-is; scaling
//! is left to the classifier's own normalization step.

use crate::error::PipelineError;
use crate::landmarks::{
    COORDS_PER_LANDMARK, DetectionFrame, HAND_FEATURE_LEN, Hand, LANDMARKS_PER_HAND,
    LandmarkPoint,
};

/// Flat classifier input; length is always a multiple of [`HAND_FEATURE_LEN`].
pub type FeatureVector = Vec<f32>;

/// Flatten a detection frame into a feature vector of `63 * hands` scalars.
pub fn encode(frame: &DetectionFrame) -> Result<FeatureVector, PipelineError> {
    if frame.is_empty() {
        return Err(PipelineError::EmptyFrame);
    }
    let mut features = Vec::with_capacity(frame.hand_count() * HAND_FEATURE_LEN);
    for hand in &frame.hands {
        for point in hand.iter() {
            features.extend_from_slice(&point.to_array());
        }
    }
    Ok(features)
}

/// Regroup a flat vector into hands of 21 points.
pub fn decode(features: &[f32]) -> Result<Vec<Hand>, PipelineError> {
    let hand_count = feature_hand_count(features.len())?;
    let mut hands = Vec::with_capacity(hand_count);
    for chunk in features.chunks_exact(HAND_FEATURE_LEN) {
        let mut landmarks = [LandmarkPoint::default(); LANDMARKS_PER_HAND];
        for (point, coords) in landmarks
            .iter_mut()
            .zip(chunk.chunks_exact(COORDS_PER_LANDMARK))
        {
            *point = LandmarkPoint::new(coords[0], coords[1], coords[2]);
        }
        hands.push(Hand::new(landmarks));
    }
    Ok(hands)
}

/// Number of hands encoded in a vector of `len` scalars.
pub fn feature_hand_count(len: usize) -> Result<usize, PipelineError> {
    if len % HAND_FEATURE_LEN != 0 {
        return Err(PipelineError::MalformedVector { len });
    }
    Ok(len / HAND_FEATURE_LEN)
}
