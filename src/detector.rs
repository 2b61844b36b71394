//! Hand landmark detector seam and a recorded-frames implementation.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::landmarks::{DetectionFrame, Hand, LANDMARKS_PER_HAND, LandmarkPoint, MAX_HANDS};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Failed to read frames from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid frame on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("Hand on line {line} has {points} landmarks (expected {})", LANDMARKS_PER_HAND)]
    InvalidHand { line: usize, points: usize },
    #[error("Timestamp {timestamp_ms} on line {line} is earlier than the previous frame")]
    OutOfOrder { line: usize, timestamp_ms: f64 },
}

/// Construction options shared by detector implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    /// Location of the landmark model asset.
    pub model_asset_path: PathBuf,
    /// Upper bound on hands reported per frame.
    pub num_hands: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            model_asset_path: PathBuf::from("hand_landmarker.task"),
            num_hands: MAX_HANDS,
        }
    }
}

/// Produces one detection frame per video frame.
pub trait HandDetector {
    /// Detect hands for the frame shown at `timestamp_ms`; an empty frame
    /// means no hand is visible.
    fn detect_for_frame(&mut self, timestamp_ms: f64) -> Result<DetectionFrame, DetectorError>;
}

#[derive(Deserialize)]
struct RecordedFrame {
    timestamp_ms: f64,
    #[serde(default)]
    hands: Vec<Vec<LandmarkPoint>>,
}

/// Replays detector output recorded as JSON Lines, one
/// `{"timestamp_ms": .., "hands": [[{x,y,z} x 21], ..]}` object per line.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    frames: Vec<(f64, DetectionFrame)>,
    cursor: usize,
}

impl ReplayDetector {
    pub fn open(path: &Path, options: &DetectorOptions) -> Result<Self, DetectorError> {
        let file = std::fs::File::open(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file), options).map_err(|err| match err {
            DetectorError::Io { source, .. } => DetectorError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_reader<R: BufRead>(reader: R, options: &DetectorOptions) -> Result<Self, DetectorError> {
        let mut frames = Vec::new();
        let mut last_ts = f64::NEG_INFINITY;
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|source| DetectorError::Io {
                path: PathBuf::new(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let recorded: RecordedFrame =
                serde_json::from_str(&line).map_err(|source| DetectorError::Parse {
                    line: line_no,
                    source,
                })?;
            if recorded.timestamp_ms < last_ts {
                return Err(DetectorError::OutOfOrder {
                    line: line_no,
                    timestamp_ms: recorded.timestamp_ms,
                });
            }
            last_ts = recorded.timestamp_ms;
            let mut hands = Vec::with_capacity(recorded.hands.len());
            for points in recorded.hands.iter().take(options.num_hands) {
                let hand = Hand::from_points(points).ok_or(DetectorError::InvalidHand {
                    line: line_no,
                    points: points.len(),
                })?;
                hands.push(hand);
            }
            frames.push((recorded.timestamp_ms, DetectionFrame::new(hands)));
        }
        debug!("Loaded {} recorded frames", frames.len());
        Ok(Self { frames, cursor: 0 })
    }

    /// Recorded timestamps in playback order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.iter().map(|(ts, _)| *ts).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl HandDetector for ReplayDetector {
    /// Returns the latest recorded frame at or before `timestamp_ms`.
    fn detect_for_frame(&mut self, timestamp_ms: f64) -> Result<DetectionFrame, DetectorError> {
        while self
            .frames
            .get(self.cursor + 1)
            .is_some_and(|(ts, _)| *ts <= timestamp_ms)
        {
            self.cursor += 1;
        }
        match self.frames.get(self.cursor) {
            Some((ts, frame)) if *ts <= timestamp_ms => Ok(frame.clone()),
            _ => Ok(DetectionFrame::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ts: f64, hands: usize) -> String {
        let point = r#"{"x":0.1,"y":0.2,"z":0.3}"#;
        let hand = format!("[{}]", vec![point; LANDMARKS_PER_HAND].join(","));
        let hands = vec![hand; hands].join(",");
        format!(r#"{{"timestamp_ms":{ts},"hands":[{hands}]}}"#)
    }

    fn detector(lines: &[String], options: &DetectorOptions) -> ReplayDetector {
        ReplayDetector::from_reader(lines.join("\n").as_bytes(), options).unwrap()
    }

    #[test]
    fn replays_latest_frame_at_or_before_timestamp() {
        let mut det = detector(
            &[line(0.0, 1), line(33.0, 0), line(66.0, 2)],
            &DetectorOptions::default(),
        );
        assert_eq!(det.timestamps(), vec![0.0, 33.0, 66.0]);
        assert_eq!(det.detect_for_frame(10.0).unwrap().hand_count(), 1);
        assert!(det.detect_for_frame(40.0).unwrap().is_empty());
        assert_eq!(det.detect_for_frame(100.0).unwrap().hand_count(), 2);
    }

    #[test]
    fn hands_are_capped_at_num_hands() {
        let options = DetectorOptions {
            num_hands: 1,
            ..DetectorOptions::default()
        };
        let mut det = detector(&[line(0.0, 2)], &options);
        assert_eq!(det.detect_for_frame(0.0).unwrap().hand_count(), 1);
    }

    #[test]
    fn before_first_frame_no_hands_are_visible() {
        let mut det = detector(&[line(50.0, 1)], &DetectorOptions::default());
        assert!(det.detect_for_frame(10.0).unwrap().is_empty());
    }

    #[test]
    fn incomplete_hand_is_rejected() {
        let bad = r#"{"timestamp_ms":0,"hands":[[{"x":0,"y":0,"z":0}]]}"#;
        let err = ReplayDetector::from_reader(bad.as_bytes(), &DetectorOptions::default())
            .unwrap_err();
        assert!(matches!(err, DetectorError::InvalidHand { line: 1, points: 1 }));
    }

    #[test]
    fn out_of_order_timestamps_are_rejected() {
        let lines = [line(10.0, 1), line(5.0, 1)];
        let err = ReplayDetector::from_reader(
            lines.join("\n").as_bytes(),
            &DetectorOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DetectorError::OutOfOrder { line: 2, .. }));
    }
}
