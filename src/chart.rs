//! Chart specs for training and evaluation, and the board that owns rendered charts.

pub mod board;
pub mod png;
pub mod spec;

pub use board::{ChartBoard, RenderError, Renderer};
pub use png::{ChartDimensions, PngChart, PngRenderer, save_board};
pub use spec::{
    ChartKind, ChartSlot, ChartSpec, Series, actual_vs_predicted_chart, loss_chart,
    price_per_area_chart, residuals_chart,
};
