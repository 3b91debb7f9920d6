use ndarray::Array1;

use super::{default_max_lag, names_ref, select};
use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Orientation, Panel, Placement, PlotBundle, PlotKind,
    StyleKey,
};
use crate::config::{self, PlotConfig};
use crate::dataset::{Coords, Dataset, DRAW};
use crate::error::Result;
use crate::layout::GridSizer;
use crate::stats::autocorr;
use crate::var_iter::{FilterPolicy, VarIter};

/// Options of [`plot_autocorr`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutocorrOptions {
    pub var_names: Option<Vec<String>>,
    pub coords: Option<Coords>,
    /// Number of lags drawn; `min(max_lag_cap, draws)` when `None`.
    pub max_lag: Option<usize>,
    /// Pool the chains instead of drawing one panel per chain.
    pub combined: bool,
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    /// Existing figure to draw onto; it must come from the same backend and have one axes
    /// per panel.
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

/// Bar plot of the autocorrelation function of every variable, one panel per plot unit.
pub fn plot_autocorr(data: &Dataset, options: &AutocorrOptions) -> Result<Figure> {
    let config = config::resolve(options.config.as_ref());
    let data = select(data, options.coords.as_ref())?;
    let names = names_ref(&options.var_names);
    let units: Vec<_> = VarIter::new(&data, names.as_deref(), options.combined)?.collect();
    let units = FilterPolicy::Autocorr.apply(units, config.max_subplots);

    let draws = data
        .dim_len(DRAW)
        .or_else(|| units.first().map(|u| u.values.len()))
        .unwrap_or(0);
    let max_lag = options
        .max_lag
        .unwrap_or_else(|| default_max_lag(draws, config.max_lag_cap));

    let sizer = GridSizer::new(config);
    let (rows, cols) = sizer.layout(units.len());
    let grid = sizer.scale(options.figsize, options.textsize, rows, cols);
    log::debug!(
        "plot_autocorr: {} unit(s) on {rows}x{cols}, max_lag={max_lag}",
        units.len()
    );

    let mut bundle = PlotBundle::new(PlotKind::Autocorr, grid);
    for (idx, unit) in units.iter().enumerate() {
        let values: Array1<f64> = unit.values.iter().copied().filter(|v| v.is_finite()).collect();
        let rho = autocorr(values.view());
        let lags = max_lag.min(rho.len());

        let mut panel = Panel::new(Placement::nth(idx, cols)).text_sizes(&grid);
        panel.title = Some(unit.label.clone());
        panel.xlim = Some((-0.5, max_lag as f64 - 0.5));
        panel.ylim = Some((-1.0, 1.0));
        panel.artists.push(
            Artist::new(Mark::Stems {
                positions: Array1::range(0.0, lags as f64, 1.0),
                values: rho.slice(ndarray::s![..lags]).to_owned(),
                baseline: 0.0,
                orientation: Orientation::Vertical,
            })
            .with(StyleKey::LineWidth, grid.line_width),
        );
        panel.artists.push(
            Artist::new(Mark::HLine { y: 0.0 })
                .with(StyleKey::LineWidth, grid.line_width)
                .with(StyleKey::LineColor, "gray"),
        );
        bundle.panels.push(panel);
    }

    bundle.sharex = true;
    bundle.sharey = true;
    bundle.show = options.show.unwrap_or(true);
    bundle.config = options.config.clone();
    backend::dispatch(bundle, options.backend, options.target.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CHAIN;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, Array3};

    fn dataset(draws: usize) -> Dataset {
        let mut data = Dataset::new();
        data.add_var(
            "mu",
            &[CHAIN, DRAW],
            Array2::from_shape_fn((2, draws), |(c, d)| ((c + 1) * d) as f64 % 7.0),
        )
        .unwrap();
        data.add_var(
            "theta",
            &[CHAIN, DRAW, "school"],
            Array3::from_shape_fn((2, draws, 3), |(c, d, s)| ((c + d * s) as f64).sin()),
        )
        .unwrap();
        data
    }

    fn quiet() -> AutocorrOptions {
        AutocorrOptions {
            show: Some(false),
            ..AutocorrOptions::default()
        }
    }

    fn stem_count(fig: &Figure, axes: usize) -> usize {
        match &fig.axes[axes].commands[0].mark {
            Mark::Stems { positions, .. } => positions.len(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_one_panel_per_chain() {
        let fig = plot_autocorr(&dataset(50), &quiet()).unwrap();
        // mu: 2 chains, theta: 2 chains x 3 schools.
        assert_eq!(fig.axes.len(), 8);
        assert_eq!((fig.rows, fig.cols), (2, 4));
        assert_eq!(stem_count(&fig, 0), 50);
        assert_eq!(fig.axes[2].title.as_deref(), Some("theta\n0, 0"));
        assert!(fig.sharex && fig.sharey);
    }

    #[test]
    fn test_max_lag_capped() {
        let options = AutocorrOptions {
            combined: true,
            var_names: Some(vec!["mu".to_string()]),
            ..quiet()
        };
        let fig = plot_autocorr(&dataset(500), &options).unwrap();
        assert_eq!(fig.axes.len(), 1);
        assert_eq!(stem_count(&fig, 0), 100);
        match &fig.axes[0].commands[0].mark {
            Mark::Stems { values, .. } => assert_abs_diff_eq!(values[0], 1.0, epsilon = 1e-12),
            other => panic!("unexpected {other:?}"),
        }

        let options = AutocorrOptions {
            max_lag: Some(7),
            ..options
        };
        let fig = plot_autocorr(&dataset(500), &options).unwrap();
        assert_eq!(stem_count(&fig, 0), 7);
    }

    #[test]
    fn test_subplot_limit() {
        let options = AutocorrOptions {
            config: Some(PlotConfig {
                max_subplots: 3,
                ..PlotConfig::default()
            }),
            ..quiet()
        };
        let fig = plot_autocorr(&dataset(20), &options).unwrap();
        assert_eq!(fig.axes.len(), 3);
    }

    #[test]
    fn test_missing_variable() {
        let options = AutocorrOptions {
            var_names: Some(vec!["tau".to_string(), "mu".to_string(), "eta".to_string()]),
            ..quiet()
        };
        match plot_autocorr(&dataset(20), &options) {
            Err(Error::NotFound { names, .. }) => assert_eq!(names, vec!["tau", "eta"]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
