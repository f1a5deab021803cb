use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::ChartDimensions;
use crate::currency::CurrencyFormat;
use crate::ingest::{CanonicalField, FieldPatterns};
use crate::ml::{NormalizationPolicy, TrainOptions};

/// Every setting the binaries read.
///
/// Config keys (TOML): `[fields]`, `[normalization]`, `[training]`, `[charts]`,
/// `[currency]`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub fields: FieldPatterns,
    #[serde(default)]
    pub normalization: NormalizationPolicy,
    #[serde(default)]
    pub training: TrainOptions,
    #[serde(default)]
    pub charts: ChartDimensions,
    #[serde(default)]
    pub currency: CurrencyFormat,
}

impl AppSettings {
    /// Clamp values that have a safe fallback.
    pub fn normalized(self) -> Self {
        let mut training = self.training;
        training.batch_size = training.batch_size.max(1);
        Self {
            fields: self.fields.normalized(),
            normalization: self.normalization,
            training,
            charts: self.charts.normalized(),
            currency: self.currency,
        }
    }

    /// Reject values with no safe fallback.
    pub fn validate(&self) -> Result<(), String> {
        self.normalization
            .validate()
            .map_err(|err| format!("[normalization] {err}"))?;
        self.training
            .validate()
            .map_err(|err| format!("[training] {err}"))?;
        for field in CanonicalField::ALL {
            if self.fields.for_field(field).is_empty() {
                return Err(format!("[fields] {field} needs at least one pattern"));
            }
        }
        Ok(())
    }
}

/// Errors that may occur while loading or saving app configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write a config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// Parsed but out of range.
    #[error("Invalid config at {path}: {message}")]
    Invalid { path: PathBuf, message: String },
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
}
