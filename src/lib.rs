//! Library exports for the binaries, benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Chart specs, the chart board and the PNG renderer.
pub mod chart;
/// TOML configuration.
pub mod config;
/// Money formatting.
pub mod currency;
/// CSV reading, field resolution and validation.
pub mod ingest;
/// Logging setup.
pub mod logging;
/// Linear price model, normalization and metrics.
pub mod ml;
/// Single-listing prediction.
pub mod prediction;
/// Load/train/predict session state.
pub mod session;
/// Synthetic listings generator.
pub mod synthetic;
/// Trainer capability and background training jobs.
pub mod training;
