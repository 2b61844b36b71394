//! Trainer settings stored as `config.toml` in the app directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs::{self, AppDirError};
use crate::export::EXPORT_FILE_NAME;
use crate::ml::classifier::DEFAULT_EPOCHS;
use crate::ml::mlp::MlpOptions;
use crate::trainer::{DEFAULT_TRAIN_FRACTION, MAX_TRAIN_FRACTION, MIN_TRAIN_FRACTION, TrainingConfig};

/// Default filename used to store settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name given to exported models.
pub const DEFAULT_MODEL_NAME: &str = "hand-sign-model";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No suitable config directory available")]
    NoConfigDir,
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

/// User-editable settings; missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerSettings {
    pub epochs: usize,
    pub train_fraction: f64,
    pub shuffle_seed: Option<u64>,
    pub model_name: String,
    pub export_file_name: String,
    pub export_dir: Option<PathBuf>,
    pub mlp: MlpOptions,
}

impl Default for TrainerSettings {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            train_fraction: DEFAULT_TRAIN_FRACTION,
            shuffle_seed: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            export_file_name: EXPORT_FILE_NAME.to_string(),
            export_dir: None,
            mlp: MlpOptions::default(),
        }
    }
}

impl TrainerSettings {
    /// Clamp out-of-range values and restore blank names.
    pub fn normalized(mut self) -> Self {
        self.epochs = self.epochs.max(1);
        self.train_fraction = if self.train_fraction.is_finite() {
            self.train_fraction
                .clamp(MIN_TRAIN_FRACTION, MAX_TRAIN_FRACTION)
        } else {
            DEFAULT_TRAIN_FRACTION
        };
        if self.model_name.trim().is_empty() {
            self.model_name = DEFAULT_MODEL_NAME.to_string();
        }
        if self.export_file_name.trim().is_empty() {
            self.export_file_name = EXPORT_FILE_NAME.to_string();
        }
        self.mlp.hidden_size = self.mlp.hidden_size.max(1);
        self.mlp.batch_size = self.mlp.batch_size.max(1);
        self
    }

    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.epochs,
            train_fraction: self.train_fraction,
            shuffle_seed: self.shuffle_seed,
        }
    }

    /// Configured export directory, or `.handsign/exports`.
    pub fn resolve_export_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.export_dir {
            Some(dir) => Ok(dir.clone()),
            None => app_dirs::exports_dir().map_err(map_app_dir_error),
        }
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<TrainerSettings, ConfigError> {
    load_from(&config_path()?)
}

pub fn load_from(path: &Path) -> Result<TrainerSettings, ConfigError> {
    if !path.exists() {
        return Ok(TrainerSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<TrainerSettings>(&text)
        .map(TrainerSettings::normalized)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
}

pub fn save(settings: &TrainerSettings) -> Result<(), ConfigError> {
    save_to_path(settings, &config_path()?)
}

pub fn save_to_path(settings: &TrainerSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file = std::fs::File::create(path).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    file.write_all(text.as_bytes())
        .map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn map_app_dir_error(error: AppDirError) -> ConfigError {
    match error {
        AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}
