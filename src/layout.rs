//! Subplot grid layout and figure/text sizing.
//!
//! [`GridSizer::layout`] picks a near-square grid for a number of plot units and
//! [`GridSizer::scale`] derives the figure size and the text and line sizes for that grid.

use crate::config::PlotConfig;

/// Figure geometry and scaled styling sizes for a grid of subplots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    /// Figure width in inches.
    pub figure_width: f64,
    /// Figure height in inches.
    pub figure_height: f64,
    pub label_size: f64,
    pub title_size: f64,
    pub tick_size: f64,
    pub line_width: f64,
    pub marker_size: f64,
}

/// Computes grid shapes and sizes from a [`PlotConfig`].
#[derive(Debug, Clone, Copy)]
pub struct GridSizer<'a> {
    config: &'a PlotConfig,
}

impl<'a> GridSizer<'a> {
    pub fn new(config: &'a PlotConfig) -> Self {
        Self { config }
    }

    /// Returns `(rows, cols)` for `n` subplots.
    ///
    /// Column counts `ceil(sqrt(n))` and `ceil(sqrt(n)) + 1` are tried; the one wasting the
    /// fewest cells wins, ties going to fewer rows. `n == 0` gives `(1, 1)`.
    pub fn layout(&self, n: usize) -> (usize, usize) {
        if n == 0 {
            return (1, 1);
        }
        let c0 = (n as f64).sqrt().ceil() as usize;
        let mut best = (n.div_ceil(c0), c0);
        for cols in (c0 + 1)..=(c0 + 1).min(n) {
            let rows = n.div_ceil(cols);
            let waste = rows * cols - n;
            let best_waste = best.0 * best.1 - n;
            if waste < best_waste || (waste == best_waste && rows < best.0) {
                best = (rows, cols);
            }
        }
        best
    }

    /// Scales the figure and its text for a `rows × cols` grid.
    ///
    /// `figsize` overrides the automatic size. `textsize` fixes the tick-label size and
    /// scales everything else proportionally; when unset the scale follows the geometric
    /// mean of the subplot size relative to the configured unit.
    pub fn scale(
        &self,
        figsize: Option<(f64, f64)>,
        textsize: Option<f64>,
        rows: usize,
        cols: usize,
    ) -> GridSpec {
        let cfg = self.config;
        let (rows, cols) = (rows.max(1), cols.max(1));
        let (width, height) = match figsize {
            Some(size) => size,
            None => {
                let sff = if rows == 1 && cols == 1 {
                    1.0
                } else {
                    cfg.grid_scale
                };
                (
                    cfg.figure_width * cols as f64 * sff,
                    cfg.figure_height * rows as f64 * sff,
                )
            }
        };

        let scale = match textsize {
            Some(size) => size / cfg.tick_size,
            None => {
                let cell = (width / cols as f64) * (height / rows as f64);
                (cell / (cfg.figure_width * cfg.figure_height)).sqrt()
            }
        };
        let scale = if scale.is_finite() {
            scale.max(cfg.min_text_scale)
        } else {
            cfg.min_text_scale
        };

        GridSpec {
            rows,
            cols,
            figure_width: width,
            figure_height: height,
            label_size: cfg.label_size * scale,
            title_size: cfg.title_size * scale,
            tick_size: cfg.tick_size * scale,
            line_width: cfg.line_width * scale,
            marker_size: cfg.marker_size * scale,
        }
    }
}
