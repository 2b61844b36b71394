//! Hand landmark data produced by the detector.
//!
//! A detection frame holds zero or more hands; every hand carries exactly
//! [`LANDMARKS_PER_HAND`] points in landmark-index order.

use serde::{Deserialize, Serialize};

/// Number of landmarks in the supported hand topology.
pub const LANDMARKS_PER_HAND: usize = 21;
/// Scalars stored per landmark (`x`, `y`, `z`).
pub const COORDS_PER_LANDMARK: usize = 3;
/// Feature scalars contributed by one hand.
pub const HAND_FEATURE_LEN: usize = LANDMARKS_PER_HAND * COORDS_PER_LANDMARK;
/// Upper bound on hands requested from the detector.
pub const MAX_HANDS: usize = 2;

/// Index of the wrist landmark, the first point of every hand.
pub const WRIST: usize = 0;

/// One 3-D landmark as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn from_array(coords: [f32; 3]) -> Self {
        Self::new(coords[0], coords[1], coords[2])
    }
}

/// A single detected hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    pub landmarks: [LandmarkPoint; LANDMARKS_PER_HAND],
}

impl Hand {
    pub fn new(landmarks: [LandmarkPoint; LANDMARKS_PER_HAND]) -> Self {
        Self { landmarks }
    }

    /// Build a hand from a slice, returning `None` unless it holds exactly 21 points.
    pub fn from_points(points: &[LandmarkPoint]) -> Option<Self> {
        let landmarks: [LandmarkPoint; LANDMARKS_PER_HAND] = points.try_into().ok()?;
        Some(Self { landmarks })
    }

    pub fn wrist(&self) -> LandmarkPoint {
        self.landmarks[WRIST]
    }

    pub fn iter(&self) -> impl Iterator<Item = &LandmarkPoint> {
        self.landmarks.iter()
    }
}

/// Detector output for one video frame, hands in detection order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionFrame {
    pub hands: Vec<Hand>,
}

impl DetectionFrame {
    pub fn new(hands: Vec<Hand>) -> Self {
        Self { hands }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    pub fn hand_count(&self) -> usize {
        self.hands.len()
    }
}

#[cfg(test)]
pub(crate) fn synthetic_hand(offset: f32) -> Hand {
    let mut landmarks = [LandmarkPoint::default(); LANDMARKS_PER_HAND];
    for (idx, point) in landmarks.iter_mut().enumerate() {
        let base = offset + idx as f32 * 0.01;
        *point = LandmarkPoint::new(base, base + 0.5, -base);
    }
    Hand::new(landmarks)
}
