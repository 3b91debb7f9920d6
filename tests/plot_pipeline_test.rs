//! End-to-end checks of the plot entry points on a synthetic eight-schools style posterior.

use ndarray::{Array2, Array3};
use posterior_plots::backend::{BackendKind, Mark};
use posterior_plots::dataset::{CoordValue, Coords, Dataset, CHAIN, DRAW};
use posterior_plots::layout::GridSizer;
use posterior_plots::plots::{
    plot_autocorr, plot_dist, plot_energy, plot_joint, plot_pair, AutocorrOptions, DistKind,
    DistOptions, EnergyOptions, JointKind, JointOptions, PairOptions,
};
use posterior_plots::var_iter::VarIter;
use posterior_plots::Error;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const SCHOOLS: [&str; 8] = [
    "Choate",
    "Deerfield",
    "Phillips Andover",
    "Phillips Exeter",
    "Hotchkiss",
    "Lawrenceville",
    "St. Paul's",
    "Mt. Hermon",
];

fn eight_schools(chains: usize, draws: usize) -> Dataset {
    let mut rng = SmallRng::seed_from_u64(42);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut data = Dataset::new();
    data.set_coords("school", SCHOOLS.iter().map(|s| CoordValue::from(*s)).collect())
        .unwrap();
    data.add_var(
        "mu",
        &[CHAIN, DRAW],
        Array2::from_shape_simple_fn((chains, draws), || 4.0 + 3.0 * normal.sample(&mut rng)),
    )
    .unwrap();
    data.add_var(
        "tau",
        &[CHAIN, DRAW],
        Array2::from_shape_simple_fn((chains, draws), || normal.sample(&mut rng).exp()),
    )
    .unwrap();
    data.add_var(
        "theta",
        &[CHAIN, DRAW, "school"],
        Array3::from_shape_simple_fn((chains, draws, 8), || 4.0 + 5.0 * normal.sample(&mut rng)),
    )
    .unwrap();
    data
}

fn names(list: &[&str]) -> Option<Vec<String>> {
    Some(list.iter().map(|s| s.to_string()).collect())
}

#[test]
fn test_unit_count_matches_coordinate_product() {
    let data = eight_schools(4, 50);
    // Chains iterated: 4 * (1 + 1 + 8); combined: 1 + 1 + 8.
    assert_eq!(VarIter::new(&data, None, false).unwrap().count(), 40);
    assert_eq!(VarIter::new(&data, None, true).unwrap().count(), 10);
}

#[test]
fn test_autocorr_layout_and_lags() {
    let data = eight_schools(2, 50);
    let options = AutocorrOptions {
        combined: true,
        show: Some(false),
        ..AutocorrOptions::default()
    };
    let fig = plot_autocorr(&data, &options).unwrap();
    assert_eq!(fig.axes.len(), 10);
    let cfg = posterior_plots::config::PlotConfig::default();
    assert_eq!((fig.rows, fig.cols), GridSizer::new(&cfg).layout(10));
    for ax in &fig.axes {
        assert_eq!(ax.ylim, Some((-1.0, 1.0)));
        match &ax.commands[0].mark {
            Mark::Stems { positions, .. } => assert_eq!(positions.len(), 50),
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(fig.axes[2].title.as_deref(), Some("theta\nChoate"));
}

#[test]
fn test_autocorr_coords_selection() {
    let data = eight_schools(2, 20);
    let mut coords = Coords::new();
    coords.insert(
        "school".to_string(),
        vec!["Hotchkiss".into(), "Choate".into()],
    );
    let options = AutocorrOptions {
        var_names: names(&["theta"]),
        coords: Some(coords.clone()),
        combined: true,
        show: Some(false),
        ..AutocorrOptions::default()
    };
    let fig = plot_autocorr(&data, &options).unwrap();
    let titles: Vec<_> = fig.axes.iter().filter_map(|ax| ax.title.clone()).collect();
    assert_eq!(titles, vec!["theta\nHotchkiss", "theta\nChoate"]);

    coords.insert("school".to_string(), vec!["Harvard".into()]);
    let options = AutocorrOptions {
        coords: Some(coords),
        ..options
    };
    assert!(matches!(
        plot_autocorr(&data, &options),
        Err(Error::NotFound { what: "coordinate", .. })
    ));
}

#[test]
fn test_joint_cardinality() {
    let data = eight_schools(2, 30);
    for (list, expected) in [(vec!["mu"], 1), (vec!["mu", "tau", "mu"], 3)] {
        let options = JointOptions {
            var_names: names(&list),
            show: Some(false),
            ..JointOptions::default()
        };
        match plot_joint(&data, &options) {
            Err(Error::Cardinality { actual, .. }) => assert_eq!(actual, expected),
            other => panic!("unexpected {other:?}"),
        }
    }
    // The whole theta vector is eight units.
    let options = JointOptions {
        var_names: names(&["theta"]),
        show: Some(false),
        ..JointOptions::default()
    };
    assert!(matches!(
        plot_joint(&data, &options),
        Err(Error::Cardinality { actual: 8, .. })
    ));
}

#[test]
fn test_joint_kde_on_bokeh() {
    let data = eight_schools(2, 100);
    let options = JointOptions {
        var_names: names(&["mu", "tau"]),
        kind: JointKind::Kde,
        backend: Some(BackendKind::Bokeh),
        show: Some(false),
        ..JointOptions::default()
    };
    let fig = plot_joint(&data, &options).unwrap();
    assert_eq!(fig.backend, BackendKind::Bokeh);
    assert_eq!(
        fig.methods(),
        vec!["multi_polygons", "multi_line", "line", "line"]
    );
}

#[test]
fn test_pair_grid() {
    let data = eight_schools(2, 40);
    let mut coords = Coords::new();
    coords.insert("school".to_string(), vec!["Choate".into(), "Deerfield".into()]);
    let options = PairOptions {
        coords: Some(coords),
        show: Some(false),
        ..PairOptions::default()
    };
    // mu, tau, theta[Choate], theta[Deerfield].
    let fig = plot_pair(&data, &options).unwrap();
    assert_eq!((fig.rows, fig.cols), (3, 3));
    assert_eq!(fig.axes.len(), 6);
    assert!(fig.methods().iter().all(|m| *m == "scatter"));
}

#[test]
fn test_bogus_kind_rejected_before_data() {
    assert!(matches!(
        "bogus".parse::<DistKind>(),
        Err(Error::InvalidArgument { argument: "kind", .. })
    ));
    assert!("bogus".parse::<BackendKind>().is_err());
}

#[test]
fn test_dist_of_integer_draws_is_histogram() {
    let counts: Vec<f64> = (0..200).map(|i| ((i * 7) % 5) as f64).collect();
    let options = DistOptions {
        show: Some(false),
        ..DistOptions::default()
    };
    let fig = plot_dist(&counts, None, &options).unwrap();
    match &fig.axes[0].commands[0].mark {
        Mark::Bars { edges, heights, .. } => {
            assert_eq!(edges.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
            assert!(heights.iter().all(|h| (*h - 0.2).abs() < 1e-12));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_energy_both_backends() {
    let energy = Array2::from_shape_fn((3, 100), |(c, d)| ((c * 100 + d) as f64 * 0.7).sin() * 2.0 + 10.0);
    for backend in [BackendKind::Matplotlib, BackendKind::Bokeh] {
        let options = EnergyOptions {
            backend: Some(backend),
            show: Some(false),
            ..EnergyOptions::default()
        };
        let fig = plot_energy(energy.view(), Some([0.5, 0.75, 1.25].as_slice()), &options).unwrap();
        assert_eq!(fig.axes.len(), 1);
        assert_eq!(fig.axes[0].commands.len(), 5);
    }
}
