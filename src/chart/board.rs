use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use super::spec::{ChartSlot, ChartSpec};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Chart '{title}' has series not aligned with its {labels} labels")]
    Misaligned { title: String, labels: usize },
    #[error("Failed to create chart directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write chart image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to write chart metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode chart metadata: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Charting capability. Rendering consumes a spec and returns an owned chart.
///
/// A chart is released when it is dropped.
pub trait Renderer {
    type Chart;

    fn render(&mut self, spec: &ChartSpec) -> Result<Self::Chart, RenderError>;
}

/// Render session owning at most one live chart per slot.
pub struct ChartBoard<R: Renderer> {
    renderer: R,
    charts: BTreeMap<ChartSlot, R::Chart>,
}

impl<R: Renderer> ChartBoard<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            charts: BTreeMap::new(),
        }
    }

    /// Replace the chart in `slot`.
    ///
    /// The previous chart is released before the new one is rendered, so a
    /// failed render leaves the slot empty.
    pub fn show(&mut self, slot: ChartSlot, spec: &ChartSpec) -> Result<&R::Chart, RenderError> {
        drop(self.charts.remove(&slot));
        let chart = self.renderer.render(spec)?;
        Ok(self.charts.entry(slot).or_insert(chart))
    }

    pub fn get(&self, slot: ChartSlot) -> Option<&R::Chart> {
        self.charts.get(&slot)
    }

    /// Release every chart.
    pub fn clear(&mut self) {
        self.charts.clear();
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChartSlot, &R::Chart)> {
        self.charts.iter().map(|(slot, chart)| (*slot, chart))
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}


#[cfg(test)]
mod tests {
    use super::testing::TrackingRenderer;
    use super::*;
    use crate::chart::spec::{ChartKind, Series};

    fn spec(title: &str) -> ChartSpec {
        ChartSpec {
            kind: ChartKind::Line,
            title: title.to_string(),
            x_label: "x".to_string(),
            y_label: "y".to_string(),
            labels: vec!["1".to_string()],
            series: vec![Series::new("s", [0, 0, 0, 255], vec![Some(1.0)])],
        }
    }

    #[test]
    fn replacing_a_slot_releases_before_rendering() {
        let renderer = TrackingRenderer::default();
        let events = renderer.events.clone();
        let mut board = ChartBoard::new(renderer);
        board.show(ChartSlot::Loss, &spec("a")).unwrap();
        board.show(ChartSlot::Loss, &spec("b")).unwrap();
        assert_eq!(
            *events.borrow(),
            ["render a", "release a", "render b"]
        );
        assert_eq!(board.len(), 1);
        assert_eq!(board.get(ChartSlot::Loss).unwrap().spec.title, "b");
    }

    #[test]
    fn failed_render_leaves_slot_empty() {
        let renderer = TrackingRenderer::default();
        let fail = renderer.fail_next.clone();
        let mut board = ChartBoard::new(renderer);
        board.show(ChartSlot::Residuals, &spec("old")).unwrap();
        *fail.borrow_mut() = true;
        assert!(board.show(ChartSlot::Residuals, &spec("new")).is_err());
        assert!(board.get(ChartSlot::Residuals).is_none());
        assert_eq!(board.renderer().live(), 0);
    }

    #[test]
    fn clear_and_drop_release_everything() {
        let renderer = TrackingRenderer::default();
        let probe = renderer.clone();
        let mut board = ChartBoard::new(renderer);
        for slot in ChartSlot::ALL {
            board.show(slot, &spec(slot.file_stem())).unwrap();
        }
        assert_eq!(probe.live(), 4);
        board.clear();
        assert_eq!(probe.live(), 0);
        board.show(ChartSlot::Loss, &spec("again")).unwrap();
        drop(board);
        assert_eq!(probe.live(), 0);
    }
}
