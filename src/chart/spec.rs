use serde::Serialize;

use crate::ml::metrics::DerivedMetrics;
use crate::training::TrainingSample;

/// The four charts a session can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSlot {
    Loss,
    ActualVsPredicted,
    Residuals,
    PricePerArea,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 4] = [
        ChartSlot::Loss,
        ChartSlot::ActualVsPredicted,
        ChartSlot::Residuals,
        ChartSlot::PricePerArea,
    ];

    /// File stem used when a chart is written to disk.
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartSlot::Loss => "loss",
            ChartSlot::ActualVsPredicted => "actual_vs_predicted",
            ChartSlot::Residuals => "residuals",
            ChartSlot::PricePerArea => "price_per_area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
}

/// One label-aligned data series. `None` values are drawn as gaps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    /// RGBA.
    pub color: [u8; 4],
    pub values: Vec<Option<f64>>,
}

impl Series {
    pub fn new(name: impl Into<String>, color: [u8; 4], values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            color,
            values,
        }
    }

    fn dense(name: impl Into<String>, color: [u8; 4], values: &[f64]) -> Self {
        Self::new(name, color, values.iter().copied().map(Some).collect())
    }
}

/// Everything a renderer needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSpec {
    /// Every series has one value per label.
    pub fn is_aligned(&self) -> bool {
        self.series
            .iter()
            .all(|series| series.values.len() == self.labels.len())
    }

    /// Smallest and largest defined value across all series.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|series| series.values.iter().flatten().copied())
            .filter(|value| value.is_finite())
            .fold(None, |range, value| match range {
                None => Some((value, value)),
                Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            })
    }
}

const LOSS_COLOR: [u8; 4] = [255, 0, 0, 255];
const ACTUAL_COLOR: [u8; 4] = [114, 189, 250, 255];
const PREDICTED_COLOR: [u8; 4] = [255, 0, 0, 255];
const RESIDUAL_COLOR: [u8; 4] = [168, 127, 2, 255];
const PRICE_PER_AREA_COLOR: [u8; 4] = [75, 192, 192, 153];

fn index_labels(count: usize) -> Vec<String> {
    (1..=count).map(|idx| idx.to_string()).collect()
}

/// Loss per epoch, labelled from epoch 1.
pub fn loss_chart(samples: &[TrainingSample]) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Line,
        title: "Training loss".to_string(),
        x_label: "Epoch".to_string(),
        y_label: "Loss".to_string(),
        labels: samples.iter().map(|s| s.epoch.to_string()).collect(),
        series: vec![Series::new(
            "Loss",
            LOSS_COLOR,
            samples.iter().map(|s| Some(s.loss)).collect(),
        )],
    }
}

pub fn actual_vs_predicted_chart(metrics: &DerivedMetrics) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Line,
        title: "Actual vs predicted".to_string(),
        x_label: "Index".to_string(),
        y_label: "Price".to_string(),
        labels: index_labels(metrics.len()),
        series: vec![
            Series::dense("Actual", ACTUAL_COLOR, &metrics.actual),
            Series::dense("Predicted", PREDICTED_COLOR, &metrics.predicted),
        ],
    }
}

pub fn residuals_chart(metrics: &DerivedMetrics) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: "Residuals".to_string(),
        x_label: "Index".to_string(),
        y_label: "Difference (currency)".to_string(),
        labels: index_labels(metrics.len()),
        series: vec![Series::dense(
            "Residual (actual - predicted)",
            RESIDUAL_COLOR,
            &metrics.residuals,
        )],
    }
}

pub fn price_per_area_chart(metrics: &DerivedMetrics) -> ChartSpec {
    ChartSpec {
        kind: ChartKind::Bar,
        title: "Price per square metre".to_string(),
        x_label: "Listing".to_string(),
        y_label: "Currency / m²".to_string(),
        labels: (1..=metrics.len()).map(|idx| format!("#{idx}")).collect(),
        series: vec![Series::new(
            "Price per m²",
            PRICE_PER_AREA_COLOR,
            metrics.price_per_area.clone(),
        )],
    }
}
