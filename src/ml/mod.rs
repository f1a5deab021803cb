//! Price model, its input scaling and post-training metrics.
//!
//! The model is deliberately tiny: one dense unit over (size, bathrooms,
//! bedrooms) trained in normalized space.

pub mod linreg;
pub mod metrics;
pub mod normalization;

pub use linreg::{LinearModel, LinearTrainer, SavedModel, TrainOptions};
pub use metrics::{DerivedMetrics, RegressionSummary, derive_metrics};
pub use normalization::NormalizationPolicy;
