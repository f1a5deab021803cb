//! Post-training metrics in original (currency and area) units.

use serde::Serialize;

use crate::ingest::ValidatedRecord;
use crate::ml::normalization::NormalizationPolicy;
use crate::training::Regressor;

/// Error summary over the training set, in currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    /// Coefficient of determination; `None` when actual prices have no variance.
    pub r2: Option<f64>,
}

/// Per-record outputs derived from the trained model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    /// `actual - predicted`.
    pub residuals: Vec<f64>,
    /// Predicted price per area unit, rounded to cents; `None` where size is zero.
    pub price_per_area: Vec<Option<f64>>,
    pub undefined_price_per_area: usize,
    pub summary: RegressionSummary,
}

impl DerivedMetrics {
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }
}

/// Predicted price divided by size, both recovered from model space.
///
/// Returns `None` when the size is zero or the quotient is not finite.
pub fn price_per_area(
    policy: &NormalizationPolicy,
    normalized_size: f64,
    predicted_price: f64,
) -> Option<f64> {
    let size = policy.denormalize_size(normalized_size);
    if size == 0.0 {
        return None;
    }
    let value = predicted_price / size;
    value.is_finite().then(|| round_cents(value))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Residuals, price per area and error summary over all records.
pub fn derive_metrics<M: Regressor + ?Sized>(
    model: &M,
    policy: &NormalizationPolicy,
    records: &[ValidatedRecord],
) -> DerivedMetrics {
    let mut actual = Vec::with_capacity(records.len());
    let mut predicted = Vec::with_capacity(records.len());
    let mut residuals = Vec::with_capacity(records.len());
    let mut per_area = Vec::with_capacity(records.len());
    let mut undefined = 0usize;

    for record in records {
        let x = policy.normalize_features(&record.features());
        let price = policy.denormalize_price(model.predict(&x));
        actual.push(record.price());
        predicted.push(price);
        residuals.push(record.price() - price);
        let value = price_per_area(policy, x[0], price);
        if value.is_none() {
            undefined += 1;
        }
        per_area.push(value);
    }

    if undefined > 0 {
        tracing::warn!("Price per area undefined for {undefined} record(s) with zero size");
    }

    let summary = regression_summary(&actual, &predicted);
    DerivedMetrics {
        actual,
        predicted,
        residuals,
        price_per_area: per_area,
        undefined_price_per_area: undefined,
        summary,
    }
}

/// MSE, RMSE, MAE and R² between two aligned series.
pub fn regression_summary(actual: &[f64], predicted: &[f64]) -> RegressionSummary {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return RegressionSummary {
            mse: 0.0,
            rmse: 0.0,
            mae: 0.0,
            r2: None,
        };
    }
    let mut sse = 0.0f64;
    let mut sae = 0.0f64;
    for (a, p) in actual.iter().zip(predicted.iter()) {
        let err = a - p;
        sse += err * err;
        sae += err.abs();
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let sst: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    let mse = sse / n as f64;
    RegressionSummary {
        mse,
        rmse: mse.sqrt(),
        mae: sae / n as f64,
        r2: (sst > 0.0).then(|| 1.0 - sse / sst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::validate::record;
    use crate::ml::linreg::LinearModel;

    fn model() -> LinearModel {
        LinearModel {
            weights: [0.5, 0.01, 0.02],
            bias: 0.0,
        }
    }

    #[test]
    fn residuals_are_taken_in_currency_units() {
        let policy = NormalizationPolicy::default();
        let records = [record(125.0, 1.0, 1.0, 700_000.0)];
        let metrics = derive_metrics(&model(), &policy, &records);
        // normalized prediction 0.25 + 0.01 + 0.02 = 0.28 -> 560_000
        assert!((metrics.predicted[0] - 560_000.0).abs() < 1e-6);
        assert!((metrics.residuals[0] - 140_000.0).abs() < 1e-6);
        assert_eq!(metrics.residuals[0], metrics.actual[0] - metrics.predicted[0]);
    }

    #[test]
    fn price_per_area_uses_recovered_size() {
        let policy = NormalizationPolicy::default();
        let records = [record(125.0, 1.0, 1.0, 700_000.0)];
        let metrics = derive_metrics(&model(), &policy, &records);
        assert_eq!(metrics.price_per_area, vec![Some(4_480.0)]);
        assert_eq!(price_per_area(&policy, 0.3, 100_000.0), Some(1_333.33));
    }

    #[test]
    fn zero_size_has_undefined_price_per_area() {
        let policy = NormalizationPolicy::default();
        let records = [record(0.0, 2.0, 2.0, 100_000.0), record(50.0, 1.0, 1.0, 100_000.0)];
        let metrics = derive_metrics(&model(), &policy, &records);
        assert_eq!(metrics.price_per_area[0], None);
        assert!(metrics.price_per_area[1].is_some());
        assert_eq!(metrics.undefined_price_per_area, 1);
        assert_eq!(metrics.len(), 2);
    }

    #[test]
    fn summary_matches_hand_computation() {
        let summary = regression_summary(&[1.0, 2.0, 3.0], &[1.0, 3.0, 5.0]);
        assert!((summary.mse - 5.0 / 3.0).abs() < 1e-12);
        assert!((summary.mae - 1.0).abs() < 1e-12);
        assert!((summary.rmse - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((summary.r2.unwrap() - (1.0 - 5.0 / 2.0)).abs() < 1e-12);
        assert_eq!(regression_summary(&[4.0, 4.0], &[4.0, 4.0]).r2, None);
    }
}
