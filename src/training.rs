//! Trainer capability and the data contract it consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::ValidatedRecord;
use crate::ml::normalization::NormalizationPolicy;

pub mod job;

pub use job::{JobPoll, TrainingJob, TrainingMessage, spawn_training};

/// One point of the loss curve. `epoch` starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub epoch: usize,
    pub loss: f64,
}

/// Returned by the epoch callback to keep going or abandon the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochControl {
    Continue,
    Stop,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Empty training set")]
    EmptyTrainingSet,
    #[error("Mismatched training inputs/targets ({inputs} vs {targets})")]
    Mismatched { inputs: usize, targets: usize },
    #[error("Invalid training options: {0}")]
    InvalidOptions(String),
    #[error("Training stopped after epoch {epoch}")]
    Stopped { epoch: usize },
    #[error("Loss diverged at epoch {epoch}")]
    Diverged { epoch: usize },
}

/// Normalized inputs and targets ready for a trainer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub x: Vec<[f64; 3]>,
    pub y: Vec<f64>,
}

impl TrainingSet {
    /// Apply the policy to every record, in order.
    pub fn from_records(records: &[ValidatedRecord], policy: &NormalizationPolicy) -> Self {
        let mut x = Vec::with_capacity(records.len());
        let mut y = Vec::with_capacity(records.len());
        for record in records {
            x.push(policy.normalize_features(&record.features()));
            y.push(policy.normalize_price(record.price()));
        }
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub(crate) fn check(&self) -> Result<(), TrainError> {
        if self.x.len() != self.y.len() {
            return Err(TrainError::Mismatched {
                inputs: self.x.len(),
                targets: self.y.len(),
            });
        }
        if self.x.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }
        Ok(())
    }
}

/// A trained model mapping a normalized feature vector to a normalized price.
pub trait Regressor {
    fn predict(&self, x: &[f64; 3]) -> f64;
}

/// Fits a regressor, reporting one loss sample per epoch in increasing order.
pub trait Trainer {
    type Model: Regressor + Send + 'static;

    /// Number of epochs a run will report.
    fn epochs(&self) -> usize;

    fn fit(
        &self,
        set: &TrainingSet,
        on_epoch: &mut dyn FnMut(TrainingSample) -> EpochControl,
    ) -> Result<Self::Model, TrainError>;
}
