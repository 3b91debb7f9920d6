//! Diagnostic plot entry points.
//!
//! Each plot validates its arguments, flattens the data into plot units, runs the estimators,
//! lays the panels out on a grid and hands the result to [`crate::backend::dispatch`].

mod autocorr;
mod compare;
mod dist;
mod energy;
mod joint;
mod pair;

pub use autocorr::{plot_autocorr, AutocorrOptions};
pub use compare::{plot_compare, CompareOptions, IcScale, ModelComparison};
pub use dist::{plot_dist, plot_kde, DistOptions};
pub use energy::{plot_energy, EnergyOptions};
pub use joint::{plot_joint, JointOptions};
pub use pair::{plot_pair, PairOptions};

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::dataset::{Coords, Dataset};
use crate::error::{Error, Result};
use crate::hist::is_integral;

/// Representation of a one- or two-dimensional distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistKind {
    /// Histogram for integer-valued samples, density estimate otherwise.
    #[default]
    Auto,
    Kde,
    Hist,
}

impl DistKind {
    /// Resolves `Auto` against the sample.
    pub fn resolve(self, values: &[f64]) -> DistKind {
        match self {
            DistKind::Auto if is_integral(values) => DistKind::Hist,
            DistKind::Auto => DistKind::Kde,
            kind => kind,
        }
    }
}

impl FromStr for DistKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(DistKind::Auto),
            "kde" => Ok(DistKind::Kde),
            "hist" => Ok(DistKind::Hist),
            _ => Err(Error::invalid("kind", s, "auto, kde, hist")),
        }
    }
}

/// Central panel of joint and pair plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JointKind {
    #[default]
    Scatter,
    Kde,
    Hexbin,
}

impl FromStr for JointKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scatter" => Ok(JointKind::Scatter),
            "kde" => Ok(JointKind::Kde),
            "hexbin" => Ok(JointKind::Hexbin),
            _ => Err(Error::invalid("kind", s, "scatter, kde, hexbin")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnergyKind {
    #[default]
    Kde,
    Hist,
}

impl FromStr for EnergyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kde" => Ok(EnergyKind::Kde),
            "hist" | "histogram" => Ok(EnergyKind::Hist),
            _ => Err(Error::invalid("kind", s, "kde, hist, histogram")),
        }
    }
}

macro_rules! display_as_lowercase {
    ($($kind:ty),*) => {$(
        impl fmt::Display for $kind {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = format!("{self:?}");
                f.write_str(&name.to_lowercase())
            }
        }
    )*};
}

display_as_lowercase!(DistKind, JointKind, EnergyKind);

/// Default number of autocorrelation lags: every draw, capped at `cap`.
pub fn default_max_lag(draws: usize, cap: usize) -> usize {
    cap.min(draws)
}

/// Applies an optional coordinate selection.
fn select<'a>(data: &'a Dataset, coords: Option<&Coords>) -> Result<Cow<'a, Dataset>> {
    match coords {
        Some(coords) => Ok(Cow::Owned(data.select(coords)?)),
        None => Ok(Cow::Borrowed(data)),
    }
}

/// Borrowed view of optional owned variable names.
fn names_ref(names: &Option<Vec<String>>) -> Option<Vec<&str>> {
    names
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect())
}

/// Hexbin grid size when none is given: `n^0.35` hexagons along x.
fn auto_gridsize(n: usize) -> usize {
    ((n as f64).powf(0.35) as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(50, 100), 50);
        assert_eq!(default_max_lag(500, 100), 100);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("hexbin".parse::<JointKind>().unwrap(), JointKind::Hexbin);
        assert_eq!("histogram".parse::<EnergyKind>().unwrap(), EnergyKind::Hist);
        assert_eq!(DistKind::Hist.to_string(), "hist");
        match "bogus".parse::<DistKind>() {
            Err(Error::InvalidArgument {
                argument, expected, ..
            }) => {
                assert_eq!(argument, "kind");
                assert_eq!(expected, "auto, kde, hist");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!("violin".parse::<EnergyKind>().is_err());
    }

    #[test]
    fn test_auto_kind() {
        assert_eq!(DistKind::Auto.resolve(&[1.0, 2.0, 2.0]), DistKind::Hist);
        assert_eq!(DistKind::Auto.resolve(&[1.0, 2.5]), DistKind::Kde);
        assert_eq!(DistKind::Kde.resolve(&[1.0, 2.0]), DistKind::Kde);
    }

    #[test]
    fn test_auto_gridsize() {
        assert_eq!(auto_gridsize(1000), 11);
        assert_eq!(auto_gridsize(0), 1);
    }
}
