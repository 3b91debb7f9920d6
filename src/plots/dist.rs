use ndarray::Array1;

use super::DistKind;
use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Orientation, Panel, Placement, PlotBundle, PlotKind,
    StyleKey,
};
use crate::config::{self, PlotConfig};
use crate::error::{Error, Result};
use crate::hist::{histogram, Bins};
use crate::kde::{kde_1d_or_degenerate, kde_2d_or_degenerate, Bandwidth, Extent, Kde2dOptions, KdeOptions};
use crate::layout::GridSizer;

/// Options of [`plot_dist`] and [`plot_kde`].
#[derive(Debug, Clone, PartialEq)]
pub struct DistOptions {
    pub kind: DistKind,
    /// Plot the cumulative distribution instead of the density.
    pub cumulative: bool,
    /// Swap the axes of a 1D plot.
    pub rotated: bool,
    pub bandwidth: Bandwidth,
    /// Probabilities marked on a 1D density.
    pub quantiles: Vec<f64>,
    /// Histogram edges; automatic when `None`.
    pub bins: Option<Array1<f64>>,
    /// Mark every sample with a tick below a 1D density.
    pub rug: bool,
    /// Draw contours for a 2D density, a smooth surface otherwise.
    pub contour: bool,
    /// Fill the outermost contour band.
    pub fill_last: bool,
    pub color: Option<String>,
    /// Legend entry of a 1D plot.
    pub label: Option<String>,
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    /// Existing single-axes figure to draw onto.
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

impl Default for DistOptions {
    fn default() -> Self {
        Self {
            kind: DistKind::Auto,
            cumulative: false,
            rotated: false,
            bandwidth: Bandwidth::default(),
            quantiles: Vec::new(),
            bins: None,
            rug: false,
            contour: true,
            fill_last: true,
            color: None,
            label: None,
            figsize: None,
            textsize: None,
            backend: None,
            show: None,
            target: None,
            config: None,
        }
    }
}

/// Settings shared by every one-dimensional distribution drawn by the plots.
pub(crate) struct Univariate<'a> {
    pub bandwidth: Bandwidth,
    pub cumulative: bool,
    pub rotated: bool,
    pub quantiles: &'a [f64],
    pub extent: Extent,
    pub bins: Option<Array1<f64>>,
    pub rug: bool,
    pub line_width: f64,
    pub marker_size: f64,
    pub color: Option<&'a str>,
    pub label: Option<&'a str>,
    /// Fill under the density (or the bars) with this opacity.
    pub fill_alpha: Option<f64>,
    pub config: &'a PlotConfig,
}

impl<'a> Univariate<'a> {
    pub fn new(line_width: f64, config: &'a PlotConfig) -> Self {
        Self {
            bandwidth: Bandwidth::default(),
            cumulative: false,
            rotated: false,
            quantiles: &[],
            extent: Extent::Standard,
            bins: None,
            rug: false,
            line_width,
            marker_size: config.marker_size,
            color: None,
            label: None,
            fill_alpha: None,
            config,
        }
    }

    fn orientation(&self) -> Orientation {
        if self.rotated {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }
}

/// Artists of a 1D density or histogram of `values`.
pub(crate) fn univariate_artists(
    values: &[f64],
    kind: DistKind,
    settings: &Univariate,
) -> Result<Vec<Artist>> {
    let orientation = settings.orientation();
    let mut artists = Vec::new();

    match kind.resolve(values) {
        DistKind::Hist => {
            let bins = match &settings.bins {
                Some(edges) => Bins::Edges(edges.clone()),
                None => Bins::Auto {
                    max_bins: settings.config.max_bins,
                },
            };
            let hist = histogram(values, bins, true, settings.cumulative)?;
            let mut bars = Artist::new(Mark::Bars {
                edges: hist.edges,
                heights: hist.heights,
                orientation,
            })
            .with(StyleKey::LineWidth, settings.line_width);
            if let Some(color) = settings.color {
                bars = bars.with(StyleKey::FillColor, color);
            }
            if let Some(alpha) = settings.fill_alpha {
                bars = bars.with(StyleKey::Alpha, alpha);
            }
            artists.push(bars);
        }
        DistKind::Kde | DistKind::Auto => {
            let options = KdeOptions {
                bandwidth: settings.bandwidth,
                cumulative: settings.cumulative,
                quantiles: settings.quantiles.to_vec(),
                extent: settings.extent,
                config: Some(settings.config.clone()),
                ..KdeOptions::default()
            };
            let kde = kde_1d_or_degenerate(values, &options)?;
            if let Some(alpha) = settings.fill_alpha {
                let mut band = Artist::new(Mark::Band {
                    x: kde.grid.clone(),
                    lower: Array1::zeros(kde.grid.len()),
                    upper: kde.density.clone(),
                    orientation,
                })
                .with(StyleKey::Alpha, alpha);
                if let Some(color) = settings.color {
                    band = band.with(StyleKey::FillColor, color);
                }
                artists.push(band);
            }
            let (x, y) = if settings.rotated {
                (kde.density.clone(), kde.grid.clone())
            } else {
                (kde.grid.clone(), kde.density.clone())
            };
            let mut line = Artist::new(Mark::Line { x, y }).with(StyleKey::LineWidth, settings.line_width);
            if let Some(color) = settings.color {
                line = line.with(StyleKey::LineColor, color);
            }
            artists.push(line);

            if !kde.quantiles.is_empty() {
                artists.push(
                    Artist::new(Mark::Stems {
                        positions: kde.quantiles.iter().map(|m| m.x).collect(),
                        values: kde.quantiles.iter().map(|m| m.density).collect(),
                        baseline: 0.0,
                        orientation,
                    })
                    .with(StyleKey::LineWidth, settings.line_width),
                );
            }

            if settings.rug {
                let peak = kde.density.iter().copied().fold(0.0, f64::max);
                let mut rug = Artist::new(Mark::Rug {
                    positions: values.iter().copied().filter(|v| v.is_finite()).collect(),
                    offset: -0.2 * peak,
                    orientation,
                })
                .with(StyleKey::MarkerSize, 2.0 * settings.marker_size)
                .with(StyleKey::Marker, if settings.rotated { "_" } else { "|" });
                if let Some(color) = settings.color {
                    rug = rug.with(StyleKey::LineColor, color);
                }
                artists.push(rug);
            }
        }
    }

    if let (Some(label), Some(first)) = (settings.label, artists.first_mut()) {
        first.style.insert(StyleKey::LegendLabel, label.into());
    }
    Ok(artists)
}

/// Settings of a 2D density.
pub(crate) struct Bivariate<'a> {
    pub bandwidth: Bandwidth,
    pub contour: bool,
    pub fill_last: bool,
    pub line_width: f64,
    pub config: &'a PlotConfig,
}

/// Artists of a 2D density: filled and line contours, or a smooth surface.
pub(crate) fn bivariate_artists(x: &[f64], y: &[f64], settings: &Bivariate) -> Result<Vec<Artist>> {
    let options = Kde2dOptions {
        bandwidth: settings.bandwidth,
        contour: settings.contour,
        config: Some(settings.config.clone()),
        ..Kde2dOptions::default()
    };
    let kde = kde_2d_or_degenerate(x, y, &options)?;
    if kde.grid_x.len() < 2 || kde.grid_y.len() < 2 {
        return Ok(vec![Artist::new(Mark::Scatter {
            x: kde.grid_x,
            y: kde.grid_y,
        })]);
    }

    if !settings.contour {
        return Ok(vec![Artist::new(Mark::Surface {
            x: kde.grid_x,
            y: kde.grid_y,
            z: kde.density,
        })]);
    }
    let contour = |filled| {
        Artist::new(Mark::Contour {
            x: kde.grid_x.clone(),
            y: kde.grid_y.clone(),
            z: kde.density.clone(),
            levels: kde.contour_levels.clone(),
            filled,
            fill_last: settings.fill_last,
        })
    };
    Ok(vec![
        contour(true),
        contour(false).with(StyleKey::LineWidth, settings.line_width),
    ])
}

/// Plots a 1D distribution of `values`, or the joint density of `values` and `values2`.
///
/// Histograms of paired samples are not supported, including `DistKind::Auto` on
/// integer-valued `values`. The rug is drawn under densities only.
///
/// ```rust
/// use posterior_plots::plots::{plot_dist, DistOptions};
///
/// let values: Vec<f64> = (0..200).map(|i| (i as f64 * 0.1).sin()).collect();
/// let fig = plot_dist(&values, None, &DistOptions { show: Some(false), ..DistOptions::default() })
///     .unwrap();
/// assert_eq!(fig.methods(), vec!["plot"]);
/// ```
pub fn plot_dist(values: &[f64], values2: Option<&[f64]>, options: &DistOptions) -> Result<Figure> {
    if values2.is_some() && options.kind.resolve(values) == DistKind::Hist {
        return Err(Error::UnsupportedCombination(
            "histograms of two variables are not implemented, use kind kde".to_string(),
        ));
    }
    let config = config::resolve(options.config.as_ref());
    let grid = GridSizer::new(config).scale(options.figsize, options.textsize, 1, 1);

    let mut panel = Panel::new(Placement::cell(0, 0)).text_sizes(&grid);
    match values2 {
        Some(values2) => {
            let settings = Bivariate {
                bandwidth: options.bandwidth,
                contour: options.contour,
                fill_last: options.fill_last,
                line_width: grid.line_width,
                config,
            };
            panel.artists = bivariate_artists(values, values2, &settings)?;
        }
        None => {
            let settings = Univariate {
                bandwidth: options.bandwidth,
                cumulative: options.cumulative,
                rotated: options.rotated,
                quantiles: &options.quantiles,
                bins: options.bins.clone(),
                rug: options.rug,
                marker_size: grid.marker_size,
                color: options.color.as_deref(),
                label: options.label.as_deref(),
                ..Univariate::new(grid.line_width, config)
            };
            panel.artists = univariate_artists(values, options.kind, &settings)?;
            if let Some(label) = &options.label {
                panel.artists.push(Artist::new(Mark::Legend {
                    entries: vec![label.clone()],
                }));
            }
        }
    }

    let mut bundle = PlotBundle::new(PlotKind::Dist, grid);
    bundle.panels.push(panel);
    bundle.show = options.show.unwrap_or(true);
    bundle.config = options.config.clone();
    backend::dispatch(bundle, options.backend, options.target.clone())
}

/// [`plot_dist`] with a density estimate for any sample.
pub fn plot_kde(values: &[f64], values2: Option<&[f64]>, options: &DistOptions) -> Result<Figure> {
    let options = DistOptions {
        kind: DistKind::Kde,
        ..options.clone()
    };
    plot_dist(values, values2, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StyleValue;

    fn quiet() -> DistOptions {
        DistOptions {
            show: Some(false),
            ..DistOptions::default()
        }
    }

    #[test]
    fn test_auto_picks_histogram_for_integers() {
        let fig = plot_dist(&[1.0, 2.0, 2.0, 3.0, 5.0], None, &quiet()).unwrap();
        assert_eq!(fig.methods(), vec!["bar"]);
        let fig = plot_kde(&[1.0, 2.0, 2.0, 3.0, 5.0], None, &quiet()).unwrap();
        assert_eq!(fig.methods(), vec!["plot"]);
    }

    #[test]
    fn test_rotated_quantiles_with_label() {
        let values: Vec<f64> = (0..300).map(|i| (i as f64 * 0.37).cos()).collect();
        let options = DistOptions {
            rotated: true,
            quantiles: vec![0.25, 0.75],
            label: Some("theta".to_string()),
            backend: Some(BackendKind::Bokeh),
            ..quiet()
        };
        let fig = plot_dist(&values, None, &options).unwrap();
        assert_eq!(fig.methods(), vec!["line", "segment", "legend"]);
        let line = &fig.axes[0].commands[0];
        assert_eq!(
            line.kwargs.get("legend_label"),
            Some(&StyleValue::Text("theta".to_string()))
        );
        match &fig.axes[0].commands[1].mark {
            Mark::Stems {
                orientation,
                positions,
                ..
            } => {
                assert_eq!(*orientation, Orientation::Horizontal);
                assert_eq!(positions.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_two_dimensional() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [3.0, 2.0, 1.0, 0.0];
        let fig = plot_kde(&x, Some(&y), &quiet()).unwrap();
        assert_eq!(fig.methods(), vec!["contourf", "contour"]);
        let surface = DistOptions {
            contour: false,
            ..quiet()
        };
        let fig = plot_kde(&x, Some(&y), &surface).unwrap();
        assert_eq!(fig.methods(), vec!["pcolormesh"]);
    }

    #[test]
    fn test_paired_histogram_is_unsupported() {
        let options = DistOptions {
            kind: DistKind::Hist,
            ..quiet()
        };
        assert!(matches!(
            plot_dist(&[1.0, 2.0], Some([1.0, 2.0].as_slice()), &options),
            Err(Error::UnsupportedCombination(_))
        ));
    }

    #[test]
    fn test_overlay_on_existing_figure() {
        let a: Vec<f64> = (0..100).map(|i| i as f64 * 0.013).collect();
        let b: Vec<f64> = a.iter().map(|v| v + 0.5).collect();
        let first = plot_kde(&a, None, &quiet()).unwrap();
        let options = DistOptions {
            target: Some(first),
            ..quiet()
        };
        let fig = plot_kde(&b, None, &options).unwrap();
        assert_eq!(fig.methods(), vec!["plot", "plot"]);
    }

    #[test]
    fn test_cumulative_histogram_ends_at_one() {
        let options = DistOptions {
            kind: DistKind::Hist,
            cumulative: true,
            ..quiet()
        };
        let fig = plot_dist(&[0.1, 0.4, 0.4, 0.9, 1.3], None, &options).unwrap();
        match &fig.axes[0].commands[0].mark {
            Mark::Bars { heights, .. } => assert_eq!(heights.last(), Some(&1.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_auto_kind_on_integer_pairs_is_unsupported() {
        let x = [1.0, 2.0, 2.0, 3.0];
        let y = [0.5, 1.5, 2.5, 1.0];
        assert!(matches!(
            plot_dist(&x, Some(y.as_slice()), &quiet()),
            Err(Error::UnsupportedCombination(_))
        ));
        let fig = plot_dist(&y, Some(x.as_slice()), &quiet()).unwrap();
        assert_eq!(fig.methods(), vec!["contourf", "contour"]);
        let fig = plot_kde(&x, Some(y.as_slice()), &quiet()).unwrap();
        assert_eq!(fig.methods(), vec!["contourf", "contour"]);
    }

    #[test]
    fn test_outer_contour_band_filled_by_default() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [3.0, 2.0, 1.0, 0.0];
        let fig = plot_kde(&x, Some(&y), &quiet()).unwrap();
        let levels = |i: usize| match &fig.axes[0].commands[i].mark {
            Mark::Contour { levels, .. } => levels.len(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(levels(0), levels(1));
    }

    #[test]
    fn test_rug_under_density() {
        let values: Vec<f64> = (0..50).map(|i| (i as f64 * 0.61).sin()).collect();
        let options = DistOptions {
            kind: DistKind::Kde,
            rug: true,
            ..quiet()
        };
        let fig = plot_dist(&values, None, &options).unwrap();
        assert_eq!(fig.methods(), vec!["plot", "plot"]);
        let rug = &fig.axes[0].commands[1];
        assert_eq!(rug.kwargs.get("marker"), Some(&StyleValue::Text("|".to_string())));
        match &rug.mark {
            Mark::Rug {
                positions, offset, ..
            } => {
                assert_eq!(positions.len(), 50);
                assert!(*offset < 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }

        let rotated = DistOptions {
            rotated: true,
            backend: Some(BackendKind::Bokeh),
            ..options
        };
        let fig = plot_dist(&values, None, &rotated).unwrap();
        assert_eq!(fig.methods(), vec!["line", "dash"]);
        match &fig.axes[0].commands[1].mark {
            Mark::Rug { orientation, .. } => assert_eq!(*orientation, Orientation::Horizontal),
            other => panic!("unexpected {other:?}"),
        }
    }
}
