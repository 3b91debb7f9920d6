use super::{Backend, BackendKind, Mark, Orientation, StyleKey};
use crate::config::PlotConfig;
use crate::layout::GridSpec;

/// Matplotlib adapter. Sizes are in inches; axes text sizes map to rc parameter names.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matplotlib;

impl Backend for Matplotlib {
    fn kind(&self) -> BackendKind {
        BackendKind::Matplotlib
    }

    fn style_key(&self, key: StyleKey) -> Option<&'static str> {
        Some(match key {
            StyleKey::LineWidth => "linewidth",
            StyleKey::LineColor => "color",
            StyleKey::LineDash => "linestyle",
            StyleKey::FillColor => "facecolor",
            StyleKey::Alpha => "alpha",
            StyleKey::MarkerSize => "markersize",
            StyleKey::Marker => "marker",
            StyleKey::LegendLabel => "label",
            StyleKey::LabelSize => "axes.labelsize",
            StyleKey::TitleSize => "axes.titlesize",
            StyleKey::TickLabelSize => "xtick.labelsize",
        })
    }

    fn method(&self, mark: &Mark) -> &'static str {
        match mark {
            Mark::Line { .. } => "plot",
            Mark::Stems {
                orientation: Orientation::Vertical,
                ..
            } => "vlines",
            Mark::Stems {
                orientation: Orientation::Horizontal,
                ..
            } => "hlines",
            Mark::HLine { .. } => "axhline",
            Mark::VLine { .. } => "axvline",
            Mark::Bars {
                orientation: Orientation::Vertical,
                ..
            } => "bar",
            Mark::Bars {
                orientation: Orientation::Horizontal,
                ..
            } => "barh",
            Mark::Band {
                orientation: Orientation::Vertical,
                ..
            } => "fill_between",
            Mark::Band {
                orientation: Orientation::Horizontal,
                ..
            } => "fill_betweenx",
            Mark::Scatter { .. } => "scatter",
            Mark::ErrorBars { .. } => "errorbar",
            Mark::Rug { .. } => "plot",
            Mark::Hexbin { .. } => "hexbin",
            Mark::Contour { filled: true, .. } => "contourf",
            Mark::Contour { filled: false, .. } => "contour",
            Mark::Surface { .. } => "pcolormesh",
            Mark::Legend { .. } => "legend",
        }
    }

    fn figure_size(&self, grid: &GridSpec, _config: &PlotConfig) -> (f64, f64) {
        (grid.figure_width, grid.figure_height)
    }
}
