//! Builds a synthetic posterior and renders every diagnostic plot through both backends.
//!
//! Run with `RUST_LOG=debug` to see the layout and bandwidth decisions.

use std::error::Error;

use ndarray::{Array2, Array3, Axis};
use posterior_plots::backend::{BackendKind, Figure};
use posterior_plots::dataset::{CoordValue, Dataset, CHAIN, DRAW};
use posterior_plots::plots::{
    plot_autocorr, plot_compare, plot_dist, plot_energy, plot_joint, plot_kde, plot_pair,
    AutocorrOptions, CompareOptions, DistOptions, EnergyOptions, IcScale, JointKind, JointOptions,
    ModelComparison, PairOptions,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Gamma, Normal};

const N_CHAINS: usize = 4;
const N_DRAWS: usize = 500;
const SEED: u64 = 42;

/// AR(1) chains around `mean`, mimicking a sampler with autocorrelated draws.
fn ar1_chains(
    rng: &mut SmallRng,
    mean: f64,
    scale: f64,
    phi: f64,
) -> Result<Array2<f64>, Box<dyn Error>> {
    let normal = Normal::new(0.0, scale)?;
    let mut out = Array2::zeros((N_CHAINS, N_DRAWS));
    for mut chain in out.axis_iter_mut(Axis(0)) {
        let mut x = normal.sample(rng);
        for v in chain.iter_mut() {
            x = phi * x + normal.sample(rng);
            *v = mean + x;
        }
    }
    Ok(out)
}

/// Bayesian fraction of missing information per chain.
fn bfmi(energy: &Array2<f64>) -> Vec<f64> {
    energy
        .axis_iter(Axis(0))
        .map(|chain| {
            let n = chain.len() as f64;
            let mean = chain.sum() / n;
            let var = chain.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
            let sq_diff: f64 = chain
                .windows(2)
                .into_iter()
                .map(|w| (w[1] - w[0]).powi(2))
                .sum();
            sq_diff / (n * var)
        })
        .collect()
}

fn summarize(name: &str, fig: &Figure) {
    println!(
        "{name:>8} [{}] {} axes, {:.0} x {:.0}, {} draw calls",
        fig.backend,
        fig.axes.len(),
        fig.width,
        fig.height,
        fig.methods().len()
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let mut rng = SmallRng::seed_from_u64(SEED);

    let mut data = Dataset::new();
    data.set_coords(
        "school",
        ["Choate", "Deerfield", "Phillips Andover", "Hotchkiss"]
            .into_iter()
            .map(CoordValue::from)
            .collect(),
    )?;
    data.add_var("mu", &[CHAIN, DRAW], ar1_chains(&mut rng, 4.0, 1.0, 0.8)?)?;
    let log_tau = ar1_chains(&mut rng, 1.0, 0.3, 0.6)?;
    data.add_var("tau", &[CHAIN, DRAW], log_tau.mapv(f64::exp))?;
    let mut theta = Array3::zeros((N_CHAINS, N_DRAWS, 4));
    for school in 0..4 {
        let shift = rng.gen_range(-3.0..3.0);
        theta
            .index_axis_mut(Axis(2), school)
            .assign(&ar1_chains(&mut rng, 4.0 + shift, 1.5, 0.5)?);
    }
    data.add_var("theta", &[CHAIN, DRAW, "school"], theta)?;

    let gamma = Gamma::new(20.0, 1.0)?;
    let energy = Array2::from_shape_simple_fn((N_CHAINS, N_DRAWS), || gamma.sample(&mut rng));
    let bfmi_values = bfmi(&energy);
    log::info!("Synthetic posterior with {N_CHAINS} chains of {N_DRAWS} draws, BFMI {bfmi_values:.2?}");

    let mu = data
        .var("mu")
        .map(|v| v.data().iter().copied().collect::<Vec<f64>>())
        .unwrap_or_default();
    let tau = data
        .var("tau")
        .map(|v| v.data().iter().copied().collect::<Vec<f64>>())
        .unwrap_or_default();

    let comparison = vec![
        ModelComparison {
            name: "hierarchical".into(),
            ic: -30.7,
            p_ic: 0.9,
            se: 1.3,
            dse: 0.0,
        },
        ModelComparison {
            name: "pooled".into(),
            ic: -30.8,
            p_ic: 1.0,
            se: 1.1,
            dse: 0.4,
        },
    ];

    for backend in [BackendKind::Matplotlib, BackendKind::Bokeh] {
        let fig = plot_autocorr(
            &data,
            &AutocorrOptions {
                var_names: Some(vec!["mu".into(), "tau".into()]),
                backend: Some(backend),
                ..AutocorrOptions::default()
            },
        )?;
        summarize("autocorr", &fig);

        let fig = plot_dist(
            &mu,
            None,
            &DistOptions {
                quantiles: vec![0.05, 0.5, 0.95],
                rug: true,
                label: Some("mu".into()),
                backend: Some(backend),
                ..DistOptions::default()
            },
        )?;
        summarize("dist", &fig);

        let fig = plot_kde(
            &mu,
            Some(tau.as_slice()),
            &DistOptions {
                backend: Some(backend),
                ..DistOptions::default()
            },
        )?;
        summarize("kde", &fig);

        let fig = plot_joint(
            &data,
            &JointOptions {
                var_names: Some(vec!["mu".into(), "tau".into()]),
                kind: JointKind::Hexbin,
                backend: Some(backend),
                ..JointOptions::default()
            },
        )?;
        summarize("joint", &fig);

        let divergences: Vec<bool> = (0..N_CHAINS * N_DRAWS).map(|_| rng.gen_bool(0.01)).collect();
        let fig = plot_pair(
            &data,
            &PairOptions {
                var_names: Some(vec!["mu".into(), "tau".into(), "theta".into()]),
                kind: JointKind::Kde,
                divergences: Some(divergences),
                backend: Some(backend),
                ..PairOptions::default()
            },
        )?;
        summarize("pair", &fig);

        let fig = plot_energy(
            energy.view(),
            Some(bfmi_values.as_slice()),
            &EnergyOptions {
                backend: Some(backend),
                ..EnergyOptions::default()
            },
        )?;
        summarize("energy", &fig);

        let fig = plot_compare(
            &comparison,
            &CompareOptions {
                scale: Some(IcScale::Log),
                backend: Some(backend),
                ..CompareOptions::default()
            },
        )?;
        summarize("compare", &fig);
    }

    Ok(())
}
