//! Fixed scaling shared by training, prediction and reporting.

use serde::{Deserialize, Serialize};

use crate::ingest::Features;

const DEFAULT_SIZE_MAX: f64 = 250.0;
const DEFAULT_PRICE_MAX: f64 = 2_000_000.0;

/// Scale constants for size (area units) and price (currency units).
///
/// Bathroom and bedroom counts are never scaled. Every path that feeds the
/// model or reads its output goes through one instance of this value.
///
/// Config keys (TOML `[normalization]`): `size_max`, `price_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationPolicy {
    #[serde(default = "default_size_max")]
    pub size_max: f64,
    #[serde(default = "default_price_max")]
    pub price_max: f64,
}

impl Default for NormalizationPolicy {
    fn default() -> Self {
        Self {
            size_max: DEFAULT_SIZE_MAX,
            price_max: DEFAULT_PRICE_MAX,
        }
    }
}

fn default_size_max() -> f64 {
    DEFAULT_SIZE_MAX
}

fn default_price_max() -> f64 {
    DEFAULT_PRICE_MAX
}

impl NormalizationPolicy {
    /// Both constants must be finite and positive.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("size_max", self.size_max), ("price_max", self.price_max)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be a finite value > 0 (got {value})"));
            }
        }
        Ok(())
    }

    /// Model input vector for a listing.
    pub fn normalize_features(&self, features: &Features) -> [f64; 3] {
        [
            features.size / self.size_max,
            features.bathrooms,
            features.bedrooms,
        ]
    }

    pub fn normalize_price(&self, price: f64) -> f64 {
        price / self.price_max
    }

    pub fn denormalize_price(&self, normalized: f64) -> f64 {
        normalized * self.price_max
    }

    pub fn denormalize_size(&self, normalized: f64) -> f64 {
        normalized * self.size_max
    }
}
