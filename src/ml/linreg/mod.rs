//! Single-unit linear regression over the three listing features.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ml::normalization::NormalizationPolicy;
use crate::training::Regressor;

mod train;
pub use train::{LinearTrainer, TrainOptions};

/// Saved model format version.
pub const MODEL_FORMAT_VERSION: i64 = 1;

/// Dense layer with three inputs and one output, working in normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: [f64; 3],
    pub bias: f64,
}

impl LinearModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err("weights must be finite".to_string());
        }
        if !self.bias.is_finite() {
            return Err("bias must be finite".to_string());
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, x: &[f64; 3]) -> f64 {
        self.weights
            .iter()
            .zip(x.iter())
            .fold(self.bias, |sum, (w, v)| sum + w * v)
    }
}

/// A trained model bundled with the scaling it was trained under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub format_version: i64,
    pub model: LinearModel,
    pub normalization: NormalizationPolicy,
    #[serde(default)]
    pub epochs: usize,
    #[serde(default)]
    pub final_loss: Option<f64>,
}

impl SavedModel {
    pub fn new(model: LinearModel, normalization: NormalizationPolicy) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            model,
            normalization,
            epochs: 0,
            final_loss: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(format!(
                "Unsupported format_version {} (expected {})",
                self.format_version, MODEL_FORMAT_VERSION
            ));
        }
        self.model.validate()?;
        self.normalization.validate()
    }
}

#[derive(Debug, Error)]
pub enum ModelIoError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read model {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write model {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid model JSON at {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid model at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

pub fn save_model(path: &Path, saved: &SavedModel) -> Result<(), ModelIoError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ModelIoError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let bytes = serde_json::to_vec_pretty(saved).map_err(|source| ModelIoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, bytes).map_err(|source| ModelIoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_model(path: &Path) -> Result<SavedModel, ModelIoError> {
    let bytes = std::fs::read(path).map_err(|source| ModelIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let saved: SavedModel =
        serde_json::from_slice(&bytes).map_err(|source| ModelIoError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    saved.validate().map_err(|message| ModelIoError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(saved)
}
