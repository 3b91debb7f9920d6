use super::dist::{bivariate_artists, univariate_artists, Bivariate, Univariate};
use super::{auto_gridsize, names_ref, select, DistKind, JointKind};
use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Panel, Placement, PlotBundle, PlotKind, StyleKey,
};
use crate::config::{self, PlotConfig};
use crate::dataset::{Coords, Dataset};
use crate::error::{Error, Result};
use crate::kde::Bandwidth;
use crate::layout::GridSizer;
use crate::var_iter::VarIter;

/// Options of [`plot_joint`].
#[derive(Debug, Clone, PartialEq)]
pub struct JointOptions {
    /// Exactly two plot units must result from the names and `coords`.
    pub var_names: Option<Vec<String>>,
    pub coords: Option<Coords>,
    pub kind: JointKind,
    /// Hexagons along x for [`JointKind::Hexbin`]; `n^0.35` when `None`.
    pub gridsize: Option<usize>,
    pub bandwidth: Bandwidth,
    pub contour: bool,
    pub fill_last: bool,
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    /// Existing figure to draw onto; it must come from the same backend and have one axes
    /// per panel.
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

impl Default for JointOptions {
    fn default() -> Self {
        Self {
            var_names: None,
            coords: None,
            kind: JointKind::Scatter,
            gridsize: None,
            bandwidth: Bandwidth::default(),
            contour: true,
            fill_last: true,
            figsize: None,
            textsize: None,
            backend: None,
            show: None,
            target: None,
            config: None,
        }
    }
}

/// Artists of the central panel shared by joint and pair plots.
pub(crate) fn central_artists(
    x: &[f64],
    y: &[f64],
    kind: JointKind,
    gridsize: Option<usize>,
    settings: &Bivariate,
    marker_size: f64,
) -> Result<Vec<Artist>> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    Ok(match kind {
        JointKind::Scatter => vec![Artist::new(Mark::Scatter {
            x: x.iter().copied().collect(),
            y: y.iter().copied().collect(),
        })
        .with(StyleKey::MarkerSize, marker_size)
        .with(StyleKey::Alpha, 0.5)],
        JointKind::Hexbin => vec![Artist::new(Mark::Hexbin {
            x: x.iter().copied().collect(),
            y: y.iter().copied().collect(),
            gridsize: gridsize.unwrap_or_else(|| auto_gridsize(x.len())),
        })],
        JointKind::Kde => bivariate_artists(x, y, settings)?,
    })
}

/// Scatter, hexbin or 2D density of two variables with their marginal distributions.
///
/// The central panel spans the lower-left 3 x 3 block of a 4 x 4 grid, the x marginal sits
/// above it and the y marginal, rotated, to its right.
pub fn plot_joint(data: &Dataset, options: &JointOptions) -> Result<Figure> {
    let config = config::resolve(options.config.as_ref());
    let data = select(data, options.coords.as_ref())?;
    let names = names_ref(&options.var_names);
    let units: Vec<_> = VarIter::new(&data, names.as_deref(), true)?.collect();
    if units.len() != 2 {
        return Err(Error::Cardinality {
            expected: "2",
            actual: units.len(),
        });
    }
    let (x_unit, y_unit) = (&units[0], &units[1]);
    let x = x_unit.values.to_vec();
    let y = y_unit.values.to_vec();

    let mut grid = GridSizer::new(config).scale(options.figsize, options.textsize, 1, 1);
    grid.rows = 4;
    grid.cols = 4;

    let settings = Bivariate {
        bandwidth: options.bandwidth,
        contour: options.contour,
        fill_last: options.fill_last,
        line_width: grid.line_width,
        config,
    };
    let mut joint = Panel::new(Placement {
        row: 1,
        col: 0,
        row_span: 3,
        col_span: 3,
    })
    .text_sizes(&grid);
    joint.xlabel = Some(x_unit.label.clone());
    joint.ylabel = Some(y_unit.label.clone());
    joint.artists = central_artists(
        &x,
        &y,
        options.kind,
        options.gridsize,
        &settings,
        grid.marker_size,
    )?;

    let marginal = |values: &[f64], rotated: bool| {
        let settings = Univariate {
            rotated,
            bandwidth: options.bandwidth,
            ..Univariate::new(grid.line_width, config)
        };
        univariate_artists(values, DistKind::Auto, &settings)
    };
    let mut top = Panel::new(Placement {
        row: 0,
        col: 0,
        row_span: 1,
        col_span: 3,
    })
    .text_sizes(&grid);
    top.artists = marginal(&x, false)?;
    let mut right = Panel::new(Placement {
        row: 1,
        col: 3,
        row_span: 3,
        col_span: 1,
    })
    .text_sizes(&grid);
    right.artists = marginal(&y, true)?;

    let mut bundle = PlotBundle::new(PlotKind::Joint, grid);
    bundle.panels = vec![joint, top, right];
    bundle.show = options.show.unwrap_or(true);
    bundle.config = options.config.clone();
    backend::dispatch(bundle, options.backend, options.target.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CHAIN, DRAW};
    use ndarray::{Array2, Array3};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn dataset() -> Dataset {
        let mut rng = SmallRng::seed_from_u64(7);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut data = Dataset::new();
        for name in ["a", "b", "c"] {
            let draws = Array2::from_shape_simple_fn((2, 100), || normal.sample(&mut rng));
            data.add_var(name, &[CHAIN, DRAW], draws).unwrap();
        }
        data.add_var(
            "theta",
            &[CHAIN, DRAW, "school"],
            Array3::from_shape_simple_fn((2, 100, 2), || normal.sample(&mut rng)),
        )
        .unwrap();
        data
    }

    fn options(names: &[&str]) -> JointOptions {
        JointOptions {
            var_names: Some(names.iter().map(|n| n.to_string()).collect()),
            show: Some(false),
            ..JointOptions::default()
        }
    }

    #[test]
    fn test_requires_two_variables() {
        assert!(matches!(
            plot_joint(&dataset(), &options(&["a"])),
            Err(Error::Cardinality { actual: 1, .. })
        ));
        assert!(matches!(
            plot_joint(&dataset(), &options(&["a", "b", "c"])),
            Err(Error::Cardinality { actual: 3, .. })
        ));
        // One variable with two coordinates also makes two units.
        let fig = plot_joint(&dataset(), &options(&["theta"])).unwrap();
        assert_eq!(fig.axes[0].xlabel.as_deref(), Some("theta\n0"));
    }

    #[test]
    fn test_scatter_with_marginals() {
        let fig = plot_joint(&dataset(), &options(&["a", "b"])).unwrap();
        assert_eq!(fig.axes.len(), 3);
        assert_eq!(fig.methods(), vec!["scatter", "plot", "plot"]);
        assert_eq!(fig.axes[0].placement.row_span, 3);
        match &fig.axes[2].commands[0].mark {
            // Rotated marginal: density on x, grid on y.
            Mark::Line { x, y } => assert!(y[1] > y[0] && x.iter().all(|v| *v >= 0.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_hexbin_and_kde() {
        let hexbin = JointOptions {
            kind: JointKind::Hexbin,
            backend: Some(BackendKind::Bokeh),
            ..options(&["a", "b"])
        };
        let fig = plot_joint(&dataset(), &hexbin).unwrap();
        match &fig.axes[0].commands[0].mark {
            Mark::Hexbin { gridsize, .. } => assert_eq!(*gridsize, 6),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(fig.axes[0].commands[0].method, "hex_tile");

        let kde = JointOptions {
            kind: JointKind::Kde,
            ..options(&["a", "b"])
        };
        let fig = plot_joint(&dataset(), &kde).unwrap();
        assert_eq!(fig.axes[0].commands[0].method, "contourf");
    }

    #[test]
    fn test_overlay_second_posterior() {
        let data = dataset();
        let first = plot_joint(&data, &options(&["a", "b"])).unwrap();
        let overlay = JointOptions {
            target: Some(first),
            ..options(&["c", "a"])
        };
        let fig = plot_joint(&data, &overlay).unwrap();
        assert_eq!(fig.axes.len(), 3);
        assert_eq!(
            fig.methods(),
            vec!["scatter", "scatter", "plot", "plot", "plot", "plot"]
        );
        // The later plot's labels win.
        assert_eq!(fig.axes[0].xlabel.as_deref(), Some("c"));
    }

    #[test]
    fn test_overlay_target_must_match() {
        let data = dataset();
        let bokeh = JointOptions {
            backend: Some(BackendKind::Bokeh),
            ..options(&["a", "b"])
        };
        let first = plot_joint(&data, &bokeh).unwrap();
        let wrong_backend = JointOptions {
            target: Some(first.clone()),
            backend: Some(BackendKind::Matplotlib),
            ..options(&["a", "b"])
        };
        assert!(matches!(
            plot_joint(&data, &wrong_backend),
            Err(Error::UnsupportedCombination(_))
        ));

        let mut single = first;
        single.axes.truncate(1);
        let wrong_axes = JointOptions {
            target: Some(single),
            backend: Some(BackendKind::Bokeh),
            ..options(&["a", "b"])
        };
        assert!(matches!(
            plot_joint(&data, &wrong_axes),
            Err(Error::Cardinality { actual: 1, .. })
        ));
    }
}
