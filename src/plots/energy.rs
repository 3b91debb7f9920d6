use ndarray::{ArrayView2, Axis};

use super::dist::{univariate_artists, Univariate};
use super::{DistKind, EnergyKind};
use crate::backend::{
    self, Artist, BackendKind, Figure, Mark, Panel, Placement, PlotBundle, PlotKind,
};
use crate::config::{self, PlotConfig};
use crate::error::{Error, Result};
use crate::kde::{Bandwidth, Extent};
use crate::layout::GridSizer;

/// Options of [`plot_energy`].
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyOptions {
    pub kind: EnergyKind,
    pub bandwidth: Bandwidth,
    /// Fill opacity of the marginal and transition distributions.
    pub fill_alpha: (f64, f64),
    /// Fill colours of the marginal and transition distributions.
    pub fill_color: (String, String),
    pub figsize: Option<(f64, f64)>,
    pub textsize: Option<f64>,
    pub backend: Option<BackendKind>,
    pub show: Option<bool>,
    /// Existing figure to draw onto; it must come from the same backend and have one axes
    /// per panel.
    pub target: Option<Figure>,
    pub config: Option<PlotConfig>,
}

impl Default for EnergyOptions {
    fn default() -> Self {
        Self {
            kind: EnergyKind::Kde,
            bandwidth: Bandwidth::default(),
            fill_alpha: (1.0, 0.75),
            fill_color: ("C0".to_string(), "C5".to_string()),
            figsize: None,
            textsize: None,
            backend: None,
            show: None,
            target: None,
            config: None,
        }
    }
}

/// Legend line of one chain's BFMI.
fn bfmi_label(chain: usize, value: f64) -> String {
    format!("chain {chain:>2} BFMI = {value:.2}")
}

/// Overlays the marginal energy distribution (centred energy) and the energy transition
/// distribution (differences between successive draws) of a `chain × draw` energy array.
///
/// `bfmi`, when given, holds one value per chain and adds one legend line per chain.
pub fn plot_energy(
    energy: ArrayView2<f64>,
    bfmi: Option<&[f64]>,
    options: &EnergyOptions,
) -> Result<Figure> {
    let (chains, draws) = energy.dim();
    if let Some(bfmi) = bfmi {
        if bfmi.len() != chains {
            return Err(Error::LengthMismatch {
                x_len: bfmi.len(),
                y_len: chains,
            });
        }
    }
    if draws < 2 {
        return Err(Error::DegenerateSample { distinct: draws });
    }

    let config = config::resolve(options.config.as_ref());
    let grid = GridSizer::new(config).scale(options.figsize, options.textsize, 1, 1);

    let mean = energy.mean().unwrap_or(0.0);
    let marginal: Vec<f64> = energy.iter().map(|e| e - mean).collect();
    let transition: Vec<f64> = energy
        .axis_iter(Axis(0))
        .flat_map(|chain| {
            chain
                .windows(2)
                .into_iter()
                .map(|w| w[1] - w[0])
                .collect::<Vec<_>>()
        })
        .collect();

    let kind = match options.kind {
        EnergyKind::Kde => DistKind::Kde,
        EnergyKind::Hist => DistKind::Hist,
    };
    let mut panel = Panel::new(Placement::cell(0, 0)).text_sizes(&grid);
    let series = [
        ("Marginal Energy", &marginal, options.fill_alpha.0, &options.fill_color.0),
        ("Energy transition", &transition, options.fill_alpha.1, &options.fill_color.1),
    ];
    for (label, values, alpha, color) in series {
        let settings = Univariate {
            bandwidth: options.bandwidth,
            extent: Extent::Overlay,
            fill_alpha: Some(alpha),
            color: Some(color.as_str()),
            label: Some(label),
            ..Univariate::new(0.0, config)
        };
        panel.artists.extend(univariate_artists(values, kind, &settings)?);
    }

    let mut entries = vec!["Marginal Energy".to_string(), "Energy transition".to_string()];
    if let Some(bfmi) = bfmi {
        entries.extend(bfmi.iter().enumerate().map(|(i, v)| bfmi_label(i, *v)));
    }
    panel.artists.push(Artist::new(Mark::Legend { entries }));

    let mut bundle = PlotBundle::new(PlotKind::Energy, grid);
    bundle.panels.push(panel);
    bundle.show = options.show.unwrap_or(true);
    bundle.config = options.config.clone();
    backend::dispatch(bundle, options.backend, options.target.clone())
}
