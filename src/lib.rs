//! Diagnostic plots for posterior samples of Bayesian inference.
//!
//! Samples live in a labeled [`dataset::Dataset`] of `chain × draw × shape` arrays. The plot
//! functions in [`plots`] flatten it into plot units ([`var_iter`]), estimate densities
//! ([`kde`], [`hist`]) or autocorrelations ([`stats`]), lay the panels out ([`layout`]) and hand
//! a backend-neutral description to one of the rendering adapters in [`backend`].
//!
//! ```rust
//! use ndarray::Array3;
//! use posterior_plots::dataset::Dataset;
//! use posterior_plots::plots::{plot_autocorr, AutocorrOptions};
//!
//! let draws = Array3::from_shape_fn((2, 200, 2), |(c, d, p)| ((c + d * (p + 1)) as f64).sin());
//! let data = Dataset::from_draws(&["alpha", "beta"], &draws).unwrap();
//! let options = AutocorrOptions { show: Some(false), ..AutocorrOptions::default() };
//! let fig = plot_autocorr(&data, &options).unwrap();
//! assert_eq!(fig.axes.len(), 4);
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod hist;
pub mod kde;
pub mod layout;
pub mod plots;
pub mod stats;
pub mod var_iter;

pub use error::{Error, Result};
