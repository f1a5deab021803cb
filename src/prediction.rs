//! Single-listing price prediction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyFormat;
use crate::ingest::{CanonicalField, Features};
use crate::ml::normalization::NormalizationPolicy;
use crate::training::Regressor;

/// User-entered listing to price. Edited one field at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub size: f64,
    pub bathrooms: f64,
    pub bedrooms: f64,
}

impl Default for PredictionInput {
    fn default() -> Self {
        Self {
            size: 100.0,
            bathrooms: 2.0,
            bedrooms: 2.0,
        }
    }
}

impl PredictionInput {
    /// Update one feature; `price` is not an input and is ignored.
    pub fn set(&mut self, field: CanonicalField, value: f64) {
        match field {
            CanonicalField::Size => self.size = value,
            CanonicalField::Bathrooms => self.bathrooms = value,
            CanonicalField::Bedrooms => self.bedrooms = value,
            CanonicalField::Price => {}
        }
    }

    pub fn features(&self) -> Features {
        Features::new(self.size, self.bathrooms, self.bedrooms)
    }
}

impl FromStr for PredictionInput {
    type Err = String;

    /// Parse `size,bathrooms,bedrooms`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        let [size, bathrooms, bedrooms] = parts.as_slice() else {
            return Err(format!(
                "Expected size,bathrooms,bedrooms but got {text:?}"
            ));
        };
        Ok(Self {
            size: parse_component("size", size)?,
            bathrooms: parse_component("bathrooms", bathrooms)?,
            bedrooms: parse_component("bedrooms", bedrooms)?,
        })
    }
}

fn parse_component(name: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid {name} value: {value}"))
}

/// A de-normalized price with its display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub input: PredictionInput,
    pub price: f64,
    pub formatted: String,
}

/// Applies the shared scaling around a model call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionService {
    policy: NormalizationPolicy,
    currency: CurrencyFormat,
}

impl PredictionService {
    pub fn new(policy: NormalizationPolicy, currency: CurrencyFormat) -> Self {
        Self { policy, currency }
    }

    pub fn predict<M: Regressor + ?Sized>(&self, model: &M, input: &PredictionInput) -> Prediction {
        let x = self.policy.normalize_features(&input.features());
        let price = self.policy.denormalize_price(model.predict(&x));
        Prediction {
            input: *input,
            price,
            formatted: self.currency.format(price),
        }
    }
}
