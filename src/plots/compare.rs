use std::fmt;
use std::str::FromStr;

use ndarray::Array1;

use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Panel, Placement, PlotBundle, PlotKind, StyleKey,
};
use crate::config::{self, PlotConfig};
use crate::error::{Error, Result};
use crate::layout::GridSizer;

/// Scale an information criterion is reported on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IcScale {
    /// Expected log predictive density, higher is better.
    Log,
    /// Negated log scale, lower is better.
    NegativeLog,
    /// `-2` times the log scale, lower is better.
    #[default]
    Deviance,
}

impl IcScale {
    /// Shift from the out-of-sample criterion to the in-sample one, given the effective
    /// number of parameters.
    fn in_sample_shift(self, p_ic: f64) -> f64 {
        match self {
            IcScale::Log => p_ic,
            IcScale::NegativeLog => -p_ic,
            IcScale::Deviance => -2.0 * p_ic,
        }
    }
}

impl FromStr for IcScale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "log" => Ok(IcScale::Log),
            "negative_log" => Ok(IcScale::NegativeLog),
            "deviance" => Ok(IcScale::Deviance),
            _ => Err(Error::invalid("scale", s, "log, negative_log, deviance")),
        }
    }
}

impl fmt::Display for IcScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcScale::Log => f.write_str("Log"),
            IcScale::NegativeLog => f.write_str("Negative_log"),
            IcScale::Deviance => f.write_str("Deviance"),
        }
    }
}

/// One model of a comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelComparison {
    pub name: String,
    /// Information criterion (WAIC or LOO) of the model.
    pub ic: f64,
    /// Effective number of parameters.
    pub p_ic: f64,
    /// Standard error of `ic`.
    pub se: f64,
    /// Standard error of the difference to the top-ranked model.
    pub dse: f64,
}

/// Options of [`plot_compare`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompareOptions {
    /// Mark the in-sample criterion next to every model.
    pub insample_dev: bool,
    /// Draw `ic ± se` instead of bare points.
    pub plot_standard_error: bool,
    /// Draw the difference to the top-ranked model between the rows.
    pub plot_ic_diff: bool,
    /// Axis label and in-sample correction; labelled `Deviance` when `None`.
    pub scale: Option<IcScale>,
    /// `(6, number of models)` when `None`.
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            insample_dev: true,
            plot_standard_error: true,
            plot_ic_diff: true,
            scale: None,
            figsize: None,
            textsize: None,
            backend: None,
            show: None,
            target: None,
            config: None,
        }
    }
}

/// Row positions: models on the even slots of `linspace(0, -1)`, differences halfway between
/// consecutive models. Returns the positions and the step between slots.
fn row_positions(models: usize) -> (Vec<f64>, f64) {
    let slots = 2 * models - 1;
    if slots == 1 {
        return (vec![0.0], -1.0);
    }
    let step = -1.0 / (slots - 1) as f64;
    let positions = (0..slots)
        .map(|i| {
            let y = i as f64 * step;
            if i % 2 == 1 {
                y + step / 2.0
            } else {
                y
            }
        })
        .collect();
    (positions, step)
}

/// Summary plot of a model comparison, top-ranked model first.
///
/// Each model gets its information criterion (with standard error bars), optionally the
/// in-sample value and, between rows, the difference to the best model with its standard
/// error. A dashed vertical line marks the best criterion.
pub fn plot_compare(rows: &[ModelComparison], options: &CompareOptions) -> Result<Figure> {
    if rows.is_empty() {
        return Err(Error::Cardinality {
            expected: "1 or greater",
            actual: 0,
        });
    }
    let config = config::resolve(options.config.as_ref());
    let figsize = options.figsize.unwrap_or((6.0, rows.len() as f64));
    let grid = GridSizer::new(config).scale(Some(figsize), options.textsize, 1, 1);
    let scale = options.scale.unwrap_or_default();

    let (positions, step) = row_positions(rows.len());
    let model_y: Array1<f64> = positions.iter().step_by(2).copied().collect();
    let ic: Array1<f64> = rows.iter().map(|r| r.ic).collect();

    let mut panel = Panel::new(Placement::cell(0, 0)).text_sizes(&grid);
    let with_diff = options.plot_ic_diff && rows.len() > 1;
    if with_diff {
        panel.yticks = positions
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let label = if i % 2 == 0 { rows[i / 2].name.clone() } else { String::new() };
                (*y, label)
            })
            .collect();
        panel.artists.push(
            Artist::new(Mark::ErrorBars {
                x: ic.slice(ndarray::s![1..]).to_owned(),
                y: positions.iter().skip(1).step_by(2).copied().collect(),
                xerr: rows[1..].iter().map(|r| r.dse).collect(),
            })
            .with(StyleKey::LineColor, "grey")
            .with(StyleKey::Marker, "^")
            .with(StyleKey::LineWidth, grid.line_width),
        );
    } else {
        panel.yticks = model_y
            .iter()
            .zip(rows)
            .map(|(y, row)| (*y, row.name.clone()))
            .collect();
    }

    let criterion = if options.plot_standard_error {
        Mark::ErrorBars {
            x: ic.clone(),
            y: model_y.clone(),
            xerr: rows.iter().map(|r| r.se).collect(),
        }
    } else {
        Mark::Scatter {
            x: ic.clone(),
            y: model_y.clone(),
        }
    };
    panel.artists.push(
        Artist::new(criterion)
            .with(StyleKey::LineColor, "k")
            .with(StyleKey::FillColor, "none")
            .with(StyleKey::Marker, "o")
            .with(StyleKey::LineWidth, grid.line_width),
    );

    if options.insample_dev {
        panel.artists.push(
            Artist::new(Mark::Scatter {
                x: rows.iter().map(|r| r.ic + scale.in_sample_shift(r.p_ic)).collect(),
                y: model_y,
            })
            .with(StyleKey::LineColor, "k")
            .with(StyleKey::Marker, "o"),
        );
    }

    panel.artists.push(
        Artist::new(Mark::VLine { x: ic[0] })
            .with(StyleKey::LineDash, "dashed")
            .with(StyleKey::LineColor, "grey")
            .with(StyleKey::LineWidth, grid.line_width),
    );

    panel.xlabel = Some(scale.to_string());
    panel.ylim = Some(if rows.len() > 1 {
        (-1.0 + step, -step)
    } else {
        (-1.0, 1.0)
    });
    log::debug!("plot_compare: {} model(s) on the {scale} scale", rows.len());

    let mut bundle = PlotBundle::new(PlotKind::Compare, grid);
    bundle.panels.push(panel);
    bundle.show = options.show.unwrap_or(true);
    bundle.config = options.config.clone();
    backend::dispatch(bundle, options.backend, options.target.clone())
}
