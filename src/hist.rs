//! Histograms with automatic bin edges.

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::stats::{cmp_f64, finite, iqr_sorted};

/// Bin edges (`n + 1`) and bar heights (`n`).
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Array1<f64>,
    pub heights: Array1<f64>,
}

/// Returns true when every finite value is a whole number.
pub fn is_integral(values: &[f64]) -> bool {
    let mut any = false;
    for v in values.iter().filter(|v| v.is_finite()) {
        if v.fract() != 0.0 {
            return false;
        }
        any = true;
    }
    any
}

/// How [`histogram`] obtains its bin edges.
#[derive(Debug, Clone, PartialEq)]
pub enum Bins {
    /// Explicit, strictly increasing edges.
    Edges(Array1<f64>),
    /// [`get_bins`] with at most `max_bins` bins.
    Auto { max_bins: usize },
}

/// Automatic bin edges, never more than `max_bins` bins.
///
/// Integer-valued samples get bins of a whole-number width (one per integer when the range
/// allows it). Other samples use the wider of the Sturges and Freedman–Diaconis widths.
pub fn get_bins(values: &[f64], max_bins: usize) -> Array1<f64> {
    let max_bins = max_bins.max(1);
    let mut x = finite(values);
    if x.is_empty() {
        return Array1::from(vec![0.0, 1.0]);
    }
    x.sort_unstable_by(cmp_f64);
    let (lo, hi) = (x[0], x[x.len() - 1]);

    if is_integral(&x) {
        let span = hi - lo + 1.0;
        let width = (span / max_bins as f64).ceil().max(1.0);
        let n_bins = ((span / width).ceil() as usize).clamp(1, max_bins);
        return Array1::from_iter((0..=n_bins).map(|k| lo + k as f64 * width));
    }
    if hi == lo {
        return Array1::from(vec![lo - 0.5, hi + 0.5]);
    }

    let n = x.len() as f64;
    let range = hi - lo;
    let sturges = range / (n.log2() + 1.0);
    let fd = 2.0 * iqr_sorted(&x) * n.powf(-1.0 / 3.0);
    let width = sturges.max(fd);
    let n_bins = ((range / width).ceil() as usize).clamp(1, max_bins);
    Array1::linspace(lo, hi, n_bins + 1)
}

/// Bins the finite values of `values`.
///
/// Values outside the edges are ignored; the last bin includes its right edge. With
/// `density` the heights integrate to one; with `cumulative` they are accumulated and
/// scaled to end at one.
pub fn histogram(values: &[f64], bins: Bins, density: bool, cumulative: bool) -> Result<Histogram> {
    let x = finite(values);
    let edges = match bins {
        Bins::Edges(edges) => edges,
        Bins::Auto { max_bins } => get_bins(&x, max_bins),
    };
    if edges.len() < 2 || edges.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(Error::invalid(
            "bins",
            format!("{edges}"),
            "at least two strictly increasing edges",
        ));
    }

    let n_bins = edges.len() - 1;
    let (lo, hi) = (edges[0], edges[n_bins]);
    let mut counts = Array1::<f64>::zeros(n_bins);
    for &v in &x {
        if v < lo || v > hi {
            continue;
        }
        let bin = match edges
            .as_slice()
            .map(|e| e.partition_point(|edge| *edge <= v))
        {
            Some(pos) => pos.saturating_sub(1).min(n_bins - 1),
            None => continue,
        };
        counts[bin] += 1.0;
    }

    let total = counts.sum();
    let mut heights = if density && total > 0.0 {
        let widths = &edges.slice(ndarray::s![1..]) - &edges.slice(ndarray::s![..-1]);
        counts / (widths * total)
    } else {
        counts
    };
    if cumulative {
        heights.accumulate_axis_inplace(ndarray::Axis(0), |&prev, curr| *curr += prev);
        if let Some(&last) = heights.last() {
            if last > 0.0 {
                heights /= last;
            }
        }
    }
    Ok(Histogram { edges, heights })
}
