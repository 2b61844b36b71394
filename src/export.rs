//! Sample export document (`hand_pose_data.json`).
//!
//! Each entry carries the label and the sample's hands regrouped from the flat
//! feature vector, 21 `[x, y, z]` triples per hand.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::error::PipelineError;
use crate::features::decode;
use crate::landmarks::{COORDS_PER_LANDMARK, LANDMARKS_PER_HAND};
use crate::samples::Sample;

/// Fixed filename offered for the sample export.
pub const EXPORT_FILE_NAME: &str = "hand_pose_data.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize samples: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Invalid sample export: {0}")]
    Parse(#[source] serde_json::Error),
    #[error(
        "Entry {entry} hand {hand} has {points} landmarks (expected {})",
        LANDMARKS_PER_HAND
    )]
    InvalidHand {
        entry: usize,
        hand: usize,
        points: usize,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One entry of the export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSample {
    pub label: String,
    pub hands: Vec<Vec<[f32; COORDS_PER_LANDMARK]>>,
}

impl ExportedSample {
    pub fn from_sample(sample: &Sample) -> Result<Self, PipelineError> {
        let hands = decode(sample.features())?
            .iter()
            .map(|hand| hand.iter().map(|point| point.to_array()).collect())
            .collect();
        Ok(Self {
            label: sample.label().to_string(),
            hands,
        })
    }

    fn into_sample(self, entry: usize) -> Result<Sample, PipelineError> {
        let mut features =
            Vec::with_capacity(self.hands.len() * LANDMARKS_PER_HAND * COORDS_PER_LANDMARK);
        for (hand, points) in self.hands.iter().enumerate() {
            if points.len() != LANDMARKS_PER_HAND {
                return Err(ExportError::InvalidHand {
                    entry,
                    hand,
                    points: points.len(),
                }
                .into());
            }
            for coords in points {
                features.extend_from_slice(coords);
            }
        }
        Sample::new(features, self.label)
    }
}

/// Serialize samples to the pretty-printed export document.
pub fn export_samples(samples: &[Sample]) -> Result<Vec<u8>, PipelineError> {
    if samples.is_empty() {
        return Err(PipelineError::NoData);
    }
    let entries = samples
        .iter()
        .map(ExportedSample::from_sample)
        .collect::<Result<Vec<_>, _>>()?;
    serde_json::to_vec_pretty(&entries).map_err(|err| ExportError::Serialize(err).into())
}

/// Write the export document as `dir/file_name`, creating `dir` if needed.
pub fn write_samples_export(
    dir: &Path,
    file_name: &str,
    samples: &[Sample],
) -> Result<PathBuf, PipelineError> {
    let bytes = export_samples(samples)?;
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!("Exported {} samples to {}", samples.len(), path.display());
    Ok(path)
}

/// Parse an export document back into samples.
pub fn import_samples(bytes: &[u8]) -> Result<Vec<Sample>, PipelineError> {
    let entries: Vec<ExportedSample> = serde_json::from_slice(bytes).map_err(ExportError::Parse)?;
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| entry.into_sample(idx))
        .collect()
}

pub fn read_samples_export(path: &Path) -> Result<Vec<Sample>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    import_samples(&bytes)
}
