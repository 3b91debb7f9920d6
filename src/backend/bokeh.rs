use super::{Backend, BackendKind, Mark, Orientation, StyleKey};
use crate::config::PlotConfig;
use crate::layout::GridSpec;

/// Bokeh adapter. Sizes are in pixels; text sizes have no glyph keyword and are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bokeh;

impl Backend for Bokeh {
    fn kind(&self) -> BackendKind {
        BackendKind::Bokeh
    }

    fn style_key(&self, key: StyleKey) -> Option<&'static str> {
        match key {
            StyleKey::LineWidth => Some("line_width"),
            StyleKey::LineColor => Some("line_color"),
            StyleKey::LineDash => Some("line_dash"),
            StyleKey::FillColor => Some("fill_color"),
            StyleKey::Alpha => Some("alpha"),
            StyleKey::MarkerSize => Some("size"),
            StyleKey::Marker => Some("marker"),
            StyleKey::LegendLabel => Some("legend_label"),
            StyleKey::LabelSize | StyleKey::TitleSize | StyleKey::TickLabelSize => None,
        }
    }

    fn method(&self, mark: &Mark) -> &'static str {
        match mark {
            Mark::Line { .. } => "line",
            Mark::Stems { .. } => "segment",
            Mark::HLine { .. } | Mark::VLine { .. } => "span",
            Mark::Bars { .. } => "quad",
            Mark::Band {
                orientation: Orientation::Vertical,
                ..
            } => "varea",
            Mark::Band {
                orientation: Orientation::Horizontal,
                ..
            } => "harea",
            Mark::Scatter { .. } => "circle",
            Mark::ErrorBars { .. } => "whisker",
            Mark::Rug { .. } => "dash",
            Mark::Hexbin { .. } => "hex_tile",
            Mark::Contour { filled: true, .. } => "multi_polygons",
            Mark::Contour { filled: false, .. } => "multi_line",
            Mark::Surface { .. } => "image",
            Mark::Legend { .. } => "legend",
        }
    }

    fn figure_size(&self, grid: &GridSpec, config: &PlotConfig) -> (f64, f64) {
        (
            grid.figure_width * config.bokeh_dpi,
            grid.figure_height * config.bokeh_dpi,
        )
    }
}
