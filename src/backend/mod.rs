/*!
# Rendering backends

Plot entry points describe what to draw as a backend-neutral [`PlotBundle`]: a grid of
[`Panel`]s, each holding [`Artist`]s (a [`Mark`] plus a [`Style`]). [`dispatch`] hands the
bundle to exactly one [`Backend`] adapter, which translates every style key and mark into its
own vocabulary and records the result on a [`Figure`].

Two adapters exist, [`Matplotlib`] and [`Bokeh`]. They differ only in naming tables, figure
units and which keys they understand; no numeric work happens here.

```rust
use posterior_plots::backend::{BackendKind, Backend, Bokeh, Matplotlib, StyleKey};

assert_eq!("bokeh".parse::<BackendKind>().unwrap(), BackendKind::Bokeh);
assert_eq!(Matplotlib.style_key(StyleKey::LineWidth), Some("linewidth"));
assert_eq!(Bokeh.style_key(StyleKey::LineWidth), Some("line_width"));
assert_eq!(Bokeh.style_key(StyleKey::TitleSize), None);
```
*/

mod bokeh;
mod matplotlib;

pub use bokeh::Bokeh;
pub use matplotlib::Matplotlib;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};

use crate::config::{self, PlotConfig};
use crate::error::{Error, Result};
use crate::layout::GridSpec;

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Matplotlib,
    Bokeh,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "matplotlib" | "mpl" => Ok(BackendKind::Matplotlib),
            "bokeh" => Ok(BackendKind::Bokeh),
            _ => Err(Error::invalid("backend", s, "matplotlib, bokeh")),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Matplotlib => f.write_str("matplotlib"),
            BackendKind::Bokeh => f.write_str("bokeh"),
        }
    }
}

/// Backend-neutral style keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StyleKey {
    LineWidth,
    LineColor,
    LineDash,
    FillColor,
    Alpha,
    MarkerSize,
    Marker,
    LegendLabel,
    LabelSize,
    TitleSize,
    TickLabelSize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleValue {
    Float(f64),
    Text(String),
    Bool(bool),
}

impl From<f64> for StyleValue {
    fn from(v: f64) -> Self {
        StyleValue::Float(v)
    }
}

impl From<&str> for StyleValue {
    fn from(v: &str) -> Self {
        StyleValue::Text(v.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(v: String) -> Self {
        StyleValue::Text(v)
    }
}

impl From<bool> for StyleValue {
    fn from(v: bool) -> Self {
        StyleValue::Bool(v)
    }
}

/// Backend-neutral styling of an artist or an axes.
pub type Style = BTreeMap<StyleKey, StyleValue>;

/// Styling translated into one backend's keyword names.
pub type Kwargs = BTreeMap<&'static str, StyleValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

/// Geometric primitive of an artist.
#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    /// Polyline through `(x[i], y[i])`.
    Line { x: Array1<f64>, y: Array1<f64> },
    /// One segment per position, from `baseline` to `value`.
    Stems {
        positions: Array1<f64>,
        values: Array1<f64>,
        baseline: f64,
        orientation: Orientation,
    },
    /// Horizontal reference line across the whole axes.
    HLine { y: f64 },
    /// Vertical reference line across the whole axes.
    VLine { x: f64 },
    /// Histogram bars: `edges` has one more element than `heights`.
    Bars {
        edges: Array1<f64>,
        heights: Array1<f64>,
        orientation: Orientation,
    },
    /// Filled area between two curves sharing `x` (`y` when horizontal).
    Band {
        x: Array1<f64>,
        lower: Array1<f64>,
        upper: Array1<f64>,
        orientation: Orientation,
    },
    Scatter { x: Array1<f64>, y: Array1<f64> },
    /// Points with horizontal error bars of half-width `xerr[i]`.
    ErrorBars {
        x: Array1<f64>,
        y: Array1<f64>,
        xerr: Array1<f64>,
    },
    /// One tick per sample at `offset` on the density axis.
    Rug {
        positions: Array1<f64>,
        offset: f64,
        orientation: Orientation,
    },
    /// Hexagonal binning with `gridsize` hexagons along x.
    Hexbin {
        x: Array1<f64>,
        y: Array1<f64>,
        gridsize: usize,
    },
    /// Iso-lines (or filled bands) of `z[[i, j]]` over `(x[i], y[j])`.
    Contour {
        x: Array1<f64>,
        y: Array1<f64>,
        z: Array2<f64>,
        levels: Vec<f64>,
        filled: bool,
        fill_last: bool,
    },
    /// Smooth colour map of `z[[i, j]]` over `(x[i], y[j])`.
    Surface {
        x: Array1<f64>,
        y: Array1<f64>,
        z: Array2<f64>,
    },
    Legend { entries: Vec<String> },
}

/// A mark together with its styling.
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub mark: Mark,
    pub style: Style,
}

impl Artist {
    pub fn new(mark: Mark) -> Self {
        Self {
            mark,
            style: Style::new(),
        }
    }

    /// Adds one style entry.
    pub fn with(mut self, key: StyleKey, value: impl Into<StyleValue>) -> Self {
        self.style.insert(key, value.into());
        self
    }
}

/// Cell (or block of cells) of the subplot grid occupied by a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl Placement {
    pub fn cell(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            row_span: 1,
            col_span: 1,
        }
    }

    /// Cell `index` of a row-major grid with `cols` columns.
    pub fn nth(index: usize, cols: usize) -> Self {
        Self::cell(index / cols.max(1), index % cols.max(1))
    }
}

/// Everything drawn on one axes.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub placement: Placement,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    /// Labelled y ticks; automatic ticks when empty.
    pub yticks: Vec<(f64, String)>,
    pub artists: Vec<Artist>,
    /// Axes-level styling, typically the text sizes.
    pub axes_style: Style,
}

impl Panel {
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            title: None,
            xlabel: None,
            ylabel: None,
            xlim: None,
            ylim: None,
            yticks: Vec::new(),
            artists: Vec::new(),
            axes_style: Style::new(),
        }
    }

    /// Axes text sizes taken from a grid spec.
    pub fn text_sizes(mut self, grid: &GridSpec) -> Self {
        self.axes_style
            .insert(StyleKey::LabelSize, grid.label_size.into());
        self.axes_style
            .insert(StyleKey::TitleSize, grid.title_size.into());
        self.axes_style
            .insert(StyleKey::TickLabelSize, grid.tick_size.into());
        self
    }
}

/// Name of the plot that produced a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    Autocorr,
    Dist,
    Kde,
    Joint,
    Pair,
    Energy,
    Compare,
}

/// Backend-neutral description of a complete figure.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotBundle {
    pub kind: PlotKind,
    pub grid: GridSpec,
    pub panels: Vec<Panel>,
    pub show: bool,
    pub sharex: bool,
    pub sharey: bool,
    /// Per-call configuration override.
    pub config: Option<PlotConfig>,
}

impl PlotBundle {
    pub fn new(kind: PlotKind, grid: GridSpec) -> Self {
        Self {
            kind,
            grid,
            panels: Vec::new(),
            show: true,
            sharex: false,
            sharey: false,
            config: None,
        }
    }
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Backend method, e.g. `fill_between` or `varea`.
    pub method: &'static str,
    pub mark: Mark,
    pub kwargs: Kwargs,
}

/// Backend axes with the commands drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Axes {
    pub placement: Placement,
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xlim: Option<(f64, f64)>,
    pub ylim: Option<(f64, f64)>,
    pub yticks: Vec<(f64, String)>,
    pub settings: Kwargs,
    pub commands: Vec<DrawCommand>,
}

/// Backend-native figure handle.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub backend: BackendKind,
    /// Inches for Matplotlib, pixels for Bokeh.
    pub width: f64,
    /// Inches for Matplotlib, pixels for Bokeh.
    pub height: f64,
    pub rows: usize,
    pub cols: usize,
    pub sharex: bool,
    pub sharey: bool,
    pub axes: Vec<Axes>,
    pub shown: bool,
}

impl Figure {
    /// Methods of every recorded command, axes by axes.
    pub fn methods(&self) -> Vec<&'static str> {
        self.axes
            .iter()
            .flat_map(|ax| ax.commands.iter().map(|c| c.method))
            .collect()
    }
}

/// A rendering backend.
///
/// Implementors provide the naming tables; drawing, figure creation and showing are shared.
pub trait Backend {
    fn kind(&self) -> BackendKind;

    /// Keyword name of a style key, `None` when the backend has no equivalent.
    fn style_key(&self, key: StyleKey) -> Option<&'static str>;

    /// Backend method drawing `mark`.
    fn method(&self, mark: &Mark) -> &'static str;

    /// Figure size in the backend's unit.
    fn figure_size(&self, grid: &GridSpec, config: &PlotConfig) -> (f64, f64);

    /// Translates a style, dropping keys the backend does not know.
    fn translate(&self, style: &Style) -> Kwargs {
        style
            .iter()
            .filter_map(|(key, value)| self.style_key(*key).map(|name| (name, value.clone())))
            .collect()
    }

    fn create_figure(&self, bundle: &PlotBundle, config: &PlotConfig) -> Figure {
        let (width, height) = self.figure_size(&bundle.grid, config);
        Figure {
            backend: self.kind(),
            width,
            height,
            rows: bundle.grid.rows,
            cols: bundle.grid.cols,
            sharex: bundle.sharex,
            sharey: bundle.sharey,
            axes: bundle
                .panels
                .iter()
                .map(|panel| Axes {
                    placement: panel.placement,
                    title: None,
                    xlabel: None,
                    ylabel: None,
                    xlim: None,
                    ylim: None,
                    yticks: Vec::new(),
                    settings: Kwargs::new(),
                    commands: Vec::new(),
                })
                .collect(),
            shown: false,
        }
    }

    /// Draws a panel onto `axes`. Labels and limits already set on the axes are kept unless
    /// the panel sets them.
    fn draw_panel(&self, axes: &mut Axes, panel: &Panel) {
        if panel.title.is_some() {
            axes.title.clone_from(&panel.title);
        }
        if panel.xlabel.is_some() {
            axes.xlabel.clone_from(&panel.xlabel);
        }
        if panel.ylabel.is_some() {
            axes.ylabel.clone_from(&panel.ylabel);
        }
        axes.xlim = panel.xlim.or(axes.xlim);
        axes.ylim = panel.ylim.or(axes.ylim);
        if !panel.yticks.is_empty() {
            axes.yticks.clone_from(&panel.yticks);
        }
        axes.settings.extend(self.translate(&panel.axes_style));
        for artist in &panel.artists {
            self.draw(axes, artist);
        }
    }

    /// Records one artist. Filled contours with `fill_last == false` lose their outermost
    /// band.
    fn draw(&self, axes: &mut Axes, artist: &Artist) {
        let mark = match &artist.mark {
            Mark::Contour {
                x,
                y,
                z,
                levels,
                filled: true,
                fill_last: false,
            } if levels.len() > 1 => Mark::Contour {
                x: x.clone(),
                y: y.clone(),
                z: z.clone(),
                levels: levels[1..].to_vec(),
                filled: true,
                fill_last: false,
            },
            mark => mark.clone(),
        };
        axes.commands.push(DrawCommand {
            method: self.method(&mark),
            kwargs: self.translate(&artist.style),
            mark,
        });
    }

    fn show(&self, figure: &mut Figure) {
        log::info!(
            "Showing {} figure with {} axes ({:.0} x {:.0})",
            self.kind(),
            figure.axes.len(),
            figure.width,
            figure.height
        );
        figure.shown = true;
    }
}

/// Renders `bundle` with `backend`, onto `target` when given.
fn render_with<B: Backend>(
    backend: &B,
    bundle: &PlotBundle,
    target: Option<Figure>,
    config: &PlotConfig,
) -> Result<Figure> {
    let mut figure = match target {
        Some(figure) => {
            if figure.backend != backend.kind() {
                return Err(Error::UnsupportedCombination(format!(
                    "cannot draw with {} onto a {} figure",
                    backend.kind(),
                    figure.backend
                )));
            }
            if figure.axes.len() != bundle.panels.len() {
                return Err(Error::Cardinality {
                    expected: "equal to the number of panels of the plot",
                    actual: figure.axes.len(),
                });
            }
            figure
        }
        None => backend.create_figure(bundle, config),
    };
    for (axes, panel) in figure.axes.iter_mut().zip(&bundle.panels) {
        backend.draw_panel(axes, panel);
    }
    if bundle.show {
        backend.show(&mut figure);
    }
    Ok(figure)
}

/// Renders a bundle through the selected backend (the configured default when `None`).
///
/// With `target` the bundle is drawn onto an existing figure, which must come from the same
/// backend and have one axes per panel.
pub fn dispatch(
    bundle: PlotBundle,
    backend: Option<BackendKind>,
    target: Option<Figure>,
) -> Result<Figure> {
    let config = config::resolve(bundle.config.as_ref());
    let kind = backend.unwrap_or(config.default_backend);
    log::debug!(
        "Dispatching {:?} plot with {} panel(s) on a {}x{} grid to {kind}",
        bundle.kind,
        bundle.panels.len(),
        bundle.grid.rows,
        bundle.grid.cols
    );
    match kind {
        BackendKind::Matplotlib => render_with(&Matplotlib, &bundle, target, config),
        BackendKind::Bokeh => render_with(&Bokeh, &bundle, target, config),
    }
}
