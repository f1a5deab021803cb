use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::{ChartBoard, RenderError, Renderer};
use super::spec::{ChartKind, ChartSlot, ChartSpec};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([96, 96, 96, 255]);
const GRID: Rgba<u8> = Rgba([228, 228, 228, 255]);
const MARGIN_LEFT: u32 = 48;
const MARGIN_RIGHT: u32 = 16;
const MARGIN_TOP: u32 = 16;
const MARGIN_BOTTOM: u32 = 32;
const GRID_LINES: u32 = 4;

/// Config keys (TOML `[charts]`): `width`, `height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDimensions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    400
}

impl Default for ChartDimensions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl ChartDimensions {
    /// Clamp to a size that still leaves a plot area inside the margins.
    pub fn normalized(self) -> Self {
        Self {
            width: self.width.clamp(MARGIN_LEFT + MARGIN_RIGHT + 16, 4096),
            height: self.height.clamp(MARGIN_TOP + MARGIN_BOTTOM + 16, 4096),
        }
    }
}

/// Rasterizes chart specs into in-memory RGBA images.
#[derive(Debug, Clone, Default)]
pub struct PngRenderer {
    dimensions: ChartDimensions,
}

/// A rendered chart; its spec is kept for the metadata sidecar.
#[derive(Debug, Clone)]
pub struct PngChart {
    pub spec: ChartSpec,
    pub image: RgbaImage,
}

impl PngRenderer {
    pub fn new(dimensions: ChartDimensions) -> Self {
        Self {
            dimensions: dimensions.normalized(),
        }
    }
}

impl Renderer for PngRenderer {
    type Chart = PngChart;

    fn render(&mut self, spec: &ChartSpec) -> Result<PngChart, RenderError> {
        if !spec.is_aligned() {
            return Err(RenderError::Misaligned {
                title: spec.title.clone(),
                labels: spec.labels.len(),
            });
        }
        let mut canvas = Canvas::new(self.dimensions);
        canvas.paint_frame();
        if let Some(scale) = Scale::for_spec(spec) {
            match spec.kind {
                ChartKind::Line => canvas.paint_lines(spec, &scale),
                ChartKind::Bar => canvas.paint_bars(spec, &scale),
            }
        }
        Ok(PngChart {
            spec: spec.clone(),
            image: canvas.image,
        })
    }
}

impl PngChart {
    /// Write `<stem>.png` and a `<stem>.json` sidecar carrying titles, labels and values.
    pub fn save(&self, dir: &Path, stem: &str) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(dir).map_err(|source| RenderError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let image_path = dir.join(format!("{stem}.png"));
        self.image
            .save(&image_path)
            .map_err(|source| RenderError::Image {
                path: image_path.clone(),
                source,
            })?;
        let meta_path = dir.join(format!("{stem}.json"));
        let meta = serde_json::to_string_pretty(&self.spec)?;
        std::fs::write(&meta_path, meta).map_err(|source| RenderError::Metadata {
            path: meta_path,
            source,
        })?;
        debug!("Wrote chart {}", image_path.display());
        Ok(image_path)
    }
}

/// Write every live chart on the board into `dir`.
pub fn save_board(board: &ChartBoard<PngRenderer>, dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    board
        .iter()
        .map(|(slot, chart): (ChartSlot, &PngChart)| chart.save(dir, slot.file_stem()))
        .collect()
}

struct Canvas {
    image: RgbaImage,
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
}

struct Scale {
    min: f32,
    max: f32,
    count: usize,
}

impl Scale {
    fn for_spec(spec: &ChartSpec) -> Option<Self> {
        let (mut min, mut max) = spec.value_range()?;
        if spec.kind == ChartKind::Bar {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        if (max - min).abs() < f64::EPSILON {
            let pad = (max.abs() * 0.1).max(1.0);
            min -= pad;
            max += pad;
        }
        Some(Self {
            min: min as f32,
            max: max as f32,
            count: spec.labels.len(),
        })
    }
}

impl Canvas {
    fn new(dimensions: ChartDimensions) -> Self {
        let image = RgbaImage::from_pixel(dimensions.width, dimensions.height, BACKGROUND);
        Self {
            left: MARGIN_LEFT as f32,
            right: (dimensions.width - MARGIN_RIGHT) as f32,
            top: MARGIN_TOP as f32,
            bottom: (dimensions.height - MARGIN_BOTTOM) as f32,
            image,
        }
    }

    fn plot_width(&self) -> f32 {
        self.right - self.left
    }

    fn to_y(&self, scale: &Scale, value: f64) -> f32 {
        let t = (value as f32 - scale.min) / (scale.max - scale.min);
        (self.bottom - t * (self.bottom - self.top)).clamp(self.top, self.bottom)
    }

    /// Centre of the slot for label `idx`.
    fn to_x(&self, scale: &Scale, idx: usize) -> f32 {
        let slot = self.plot_width() / scale.count.max(1) as f32;
        self.left + slot * (idx as f32 + 0.5)
    }

    fn paint_frame(&mut self) {
        for step in 1..=GRID_LINES {
            let y = self.top + (self.bottom - self.top) * step as f32 / (GRID_LINES + 1) as f32;
            self.hline(self.left, self.right, y, GRID);
        }
        self.hline(self.left, self.right, self.bottom, AXIS);
        self.vline(self.left, self.top, self.bottom, AXIS);
    }

    fn paint_lines(&mut self, spec: &ChartSpec, scale: &Scale) {
        for series in &spec.series {
            let color = Rgba(series.color);
            let mut prev: Option<(f32, f32)> = None;
            for (idx, value) in series.values.iter().enumerate() {
                let Some(value) = value.filter(|v| v.is_finite()) else {
                    prev = None;
                    continue;
                };
                let point = (self.to_x(scale, idx), self.to_y(scale, value));
                match prev {
                    Some(from) => self.line(from, point, color),
                    None => self.dot(point, color),
                }
                prev = Some(point);
            }
        }
    }

    fn paint_bars(&mut self, spec: &ChartSpec, scale: &Scale) {
        let groups = scale.count.max(1) as f32;
        let group_width = self.plot_width() / groups;
        let bar_width = (group_width * 0.8 / spec.series.len().max(1) as f32).max(1.0);
        let zero = self.to_y(scale, 0.0);
        for (series_idx, series) in spec.series.iter().enumerate() {
            let color = Rgba(series.color);
            for (idx, value) in series.values.iter().enumerate() {
                let Some(value) = value.filter(|v| v.is_finite()) else {
                    continue;
                };
                let x0 = self.left + group_width * (idx as f32 + 0.1) + bar_width * series_idx as f32;
                let y = self.to_y(scale, value);
                self.fill_rect(x0, x0 + bar_width, y.min(zero), y.max(zero), color);
            }
        }
        self.hline(self.left, self.right, zero, AXIS);
    }

    fn hline(&mut self, x0: f32, x1: f32, y: f32, color: Rgba<u8>) {
        self.fill_rect(x0, x1, y, y + 1.0, color);
    }

    fn vline(&mut self, x: f32, y0: f32, y1: f32, color: Rgba<u8>) {
        self.fill_rect(x, x + 1.0, y0, y1, color);
    }

    fn fill_rect(&mut self, x0: f32, x1: f32, y0: f32, y1: f32, color: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        let xs = (x0.round().max(0.0) as u32)..(x1.round().max(0.0) as u32).min(width);
        let ys = (y0.round().max(0.0) as u32)..(y1.round().max(y0.round() + 1.0) as u32).min(height);
        for y in ys {
            for x in xs.clone() {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn dot(&mut self, (x, y): (f32, f32), color: Rgba<u8>) {
        self.fill_rect(x - 1.0, x + 2.0, y - 1.0, y + 2.0, color);
    }

    /// Two-pixel stroke sampled along the longer axis.
    fn line(&mut self, (x0, y0): (f32, f32), (x1, y1): (f32, f32), color: Rgba<u8>) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.fill_rect(x, x + 2.0, y, y + 2.0, color);
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba<u8>, coverage: f32) {
        let Some(pixel) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };
        let alpha = color.0[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        for channel in 0..3 {
            let under = pixel.0[channel] as f32;
            let over = color.0[channel] as f32;
            pixel.0[channel] = (over * alpha + under * (1.0 - alpha)).round() as u8;
        }
        pixel.0[3] = 255;
    }
}
