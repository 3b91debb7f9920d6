use ndarray::Array1;

use super::dist::Bivariate;
use super::joint::central_artists;
use super::{names_ref, select, JointKind};
use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Panel, Placement, PlotBundle, PlotKind, StyleKey,
};
use crate::config::{self, PlotConfig};
use crate::dataset::{Coords, Dataset};
use crate::error::{Error, Result};
use crate::kde::Bandwidth;
use crate::layout::GridSizer;
use crate::var_iter::{PlotUnit, VarIter};

/// Options of [`plot_pair`].
#[derive(Debug, Clone, PartialEq)]
pub struct PairOptions {
    pub var_names: Option<Vec<String>>,
    pub coords: Option<Coords>,
    pub kind: JointKind,
    pub gridsize: Option<usize>,
    pub bandwidth: Bandwidth,
    pub contour: bool,
    pub fill_last: bool,
    /// Per-draw divergence flags, in the flattened (chain-major) draw order.
    pub divergences: Option<Vec<bool>>,
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    /// Existing figure to draw onto; it must come from the same backend and have one axes
    /// per panel.
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            var_names: None,
            coords: None,
            kind: JointKind::Scatter,
            gridsize: None,
            bandwidth: Bandwidth::default(),
            contour: true,
            fill_last: true,
            divergences: None,
            figsize: None,
            textsize: None,
            backend: None,
            show: None,
            target: None,
            config: None,
        }
    }
}

/// Number of variables whose lower triangle fits in `max_subplots` panels.
fn vars_within_limit(numvars: usize, max_subplots: usize) -> usize {
    (0..numvars)
        .filter(|&k| k * (k + 1) / 2 < max_subplots)
        .count()
}

fn divergent_points(x: &[f64], y: &[f64], mask: &[bool]) -> (Array1<f64>, Array1<f64>) {
    let (dx, dy): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .zip(mask)
        .filter(|(_, diverged)| **diverged)
        .map(|((a, b), _)| (*a, *b))
        .unzip();
    (Array1::from(dx), Array1::from(dy))
}

/// Scatter plot matrix of every pair of variables.
///
/// Two variables give a single panel. More give the lower triangle of an
/// `(n - 1) x (n - 1)` grid where the panel in row `r`, column `c` shows variable `c` against
/// variable `r + 1`.
pub fn plot_pair(data: &Dataset, options: &PairOptions) -> Result<Figure> {
    let config = config::resolve(options.config.as_ref());
    let data = select(data, options.coords.as_ref())?;
    let names = names_ref(&options.var_names);
    let mut units: Vec<PlotUnit> = VarIter::new(&data, names.as_deref(), true)?.collect();
    if units.len() < 2 {
        return Err(Error::Cardinality {
            expected: "2 or greater",
            actual: units.len(),
        });
    }
    let keep = vars_within_limit(units.len(), config.max_subplots);
    if keep < units.len() {
        log::warn!(
            "max_subplots ({}) is smaller than the number of resulting pair plots with these variables, generating only a {keep}x{keep} grid",
            config.max_subplots
        );
        units.truncate(keep.max(2));
    }

    let draws = units[0].values.len();
    if let Some(unit) = units.iter().find(|u| u.values.len() != draws) {
        return Err(Error::LengthMismatch {
            x_len: draws,
            y_len: unit.values.len(),
        });
    }
    if let Some(mask) = &options.divergences {
        if mask.len() != draws {
            return Err(Error::LengthMismatch {
                x_len: draws,
                y_len: mask.len(),
            });
        }
    }

    let numvars = units.len();
    let side = numvars - 1;
    let sizer = GridSizer::new(config);
    let grid = sizer.scale(options.figsize, options.textsize, side, side);
    let settings = Bivariate {
        bandwidth: options.bandwidth,
        contour: options.contour,
        fill_last: options.fill_last,
        line_width: grid.line_width,
        config,
    };
    log::debug!("plot_pair: {numvars} variables on a {side}x{side} grid");

    let mut bundle = PlotBundle::new(PlotKind::Pair, grid);
    let values: Vec<Vec<f64>> = units.iter().map(|u| u.values.to_vec()).collect();
    for row in 0..side {
        for col in 0..=row {
            let (x, y) = (&values[col], &values[row + 1]);
            let mut panel = Panel::new(Placement::cell(row, col)).text_sizes(&grid);
            panel.artists = central_artists(
                x,
                y,
                options.kind,
                options.gridsize,
                &settings,
                grid.marker_size,
            )?;
            if let Some(mask) = &options.divergences {
                let (dx, dy) = divergent_points(x, y, mask);
                panel.artists.push(
                    Artist::new(Mark::Scatter { x: dx, y: dy })
                        .with(StyleKey::MarkerSize, grid.marker_size)
                        .with(StyleKey::LineColor, "C1")
                        .with(StyleKey::Marker, "o"),
                );
            }
            if row == side - 1 {
                panel.xlabel = Some(units[col].label.clone());
            }
            if col == 0 {
                panel.ylabel = Some(units[row + 1].label.clone());
            }
            bundle.panels.push(panel);
        }
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
    use crate::dataset::{CHAIN, DRAW};
    use ndarray::Array2;

    fn dataset(names: &[&str]) -> Dataset {
        let mut data = Dataset::new();
        for (k, name) in names.iter().enumerate() {
            let draws =
                Array2::from_shape_fn((2, 30), |(c, d)| ((c * 30 + d) as f64 * (k + 1) as f64).sin());
            data.add_var(name, &[CHAIN, DRAW], draws).unwrap();
        }
        data
    }

    fn quiet() -> PairOptions {
        PairOptions {
            show: Some(false),
            ..PairOptions::default()
        }
    }

    #[test]
    fn test_needs_two_variables() {
        assert!(matches!(
            plot_pair(&dataset(&["a"]), &quiet()),
            Err(Error::Cardinality { actual: 1, .. })
        ));
    }

    #[test]
    fn test_two_variables_single_panel() {
        let fig = plot_pair(&dataset(&["a", "b"]), &quiet()).unwrap();
        assert_eq!(fig.axes.len(), 1);
        assert_eq!(fig.axes[0].xlabel.as_deref(), Some("a"));
        assert_eq!(fig.axes[0].ylabel.as_deref(), Some("b"));
    }

    #[test]
    fn test_lower_triangle() {
        let fig = plot_pair(&dataset(&["a", "b", "c", "d"]), &quiet()).unwrap();
        assert_eq!((fig.rows, fig.cols), (3, 3));
        assert_eq!(fig.axes.len(), 6);
        let cells: Vec<_> = fig
            .axes
            .iter()
            .map(|ax| (ax.placement.row, ax.placement.col))
            .collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (1, 1), (2, 0), (2, 1), (2, 2)]);
        assert_eq!(fig.axes[5].xlabel.as_deref(), Some("c"));
        assert_eq!(fig.axes[3].ylabel.as_deref(), Some("d"));
    }

    #[test]
    fn test_divergences() {
        let mut mask = vec![false; 60];
        mask[3] = true;
        mask[41] = true;
        let options = PairOptions {
            divergences: Some(mask),
            ..quiet()
        };
        let fig = plot_pair(&dataset(&["a", "b"]), &options).unwrap();
        match &fig.axes[0].commands[1].mark {
            Mark::Scatter { x, .. } => assert_eq!(x.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        let bad = PairOptions {
            divergences: Some(vec![true; 10]),
            ..quiet()
        };
        assert!(matches!(
            plot_pair(&dataset(&["a", "b"]), &bad),
            Err(Error::LengthMismatch { x_len: 60, y_len: 10 })
        ));
    }

    #[test]
    fn test_subplot_limit() {
        assert_eq!(vars_within_limit(4, 40), 4);
        assert_eq!(vars_within_limit(10, 10), 4);
        let options = PairOptions {
            config: Some(PlotConfig {
                max_subplots: 3,
                ..PlotConfig::default()
            }),
            ..quiet()
        };
        let fig = plot_pair(&dataset(&["a", "b", "c", "d", "e"]), &options).unwrap();
        assert_eq!(fig.axes.len(), 1);
    }
}
