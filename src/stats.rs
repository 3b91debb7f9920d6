//! Summary statistics used by the density estimator and the autocorrelation plot.

use ndarray::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use std::cmp::Ordering;

/// Comparison function for sorting f64 slices, treating NAN as greater than all real values.
pub(crate) fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    if a.is_nan() {
        return Ordering::Greater;
    }
    if b.is_nan() {
        return Ordering::Less;
    }
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Copies the finite values of `values`, dropping NaN and infinities.
pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// Number of distinct values in an already sorted slice.
pub(crate) fn count_distinct_sorted(sorted: &[f64]) -> usize {
    if sorted.is_empty() {
        return 0;
    }
    1 + sorted.windows(2).filter(|w| w[0] != w[1]).count()
}

/// Quantile of an already sorted slice, interpolating linearly between order statistics.
///
/// Returns NaN for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Interquartile range of an already sorted slice.
pub fn iqr_sorted(sorted: &[f64]) -> f64 {
    quantile_sorted(sorted, 0.75) - quantile_sorted(sorted, 0.25)
}

/// Sample standard deviation (`ddof = 1`). Zero for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    ArrayView1::from(values).std(1.0)
}

/// Autocovariance of a sequence for every lag `0..n`, normalised by `n`.
///
/// Short sequences use the direct sum, longer ones an FFT.
pub fn autocov(sample: ArrayView1<f64>) -> Array1<f64> {
    if sample.len() <= 100 {
        autocov_bf(sample)
    } else {
        autocov_fft(sample)
    }
}

/// Autocorrelation for every lag `0..n`.
///
/// A constant sequence has no defined correlation; it is reported as `1` at lag zero and `0`
/// elsewhere so that it renders as white noise rather than NaN.
pub fn autocorr(sample: ArrayView1<f64>) -> Array1<f64> {
    let cov = autocov(sample);
    match cov.first() {
        Some(&c0) if c0 > 0.0 && c0.is_finite() => cov / c0,
        Some(_) => {
            log::warn!("Constant sequence of length {}, autocorrelation is undefined", sample.len());
            let mut out = Array1::zeros(sample.len());
            out[0] = 1.0;
            out
        }
        None => cov,
    }
}

/// FFT autocovariance. Zero-pads to a power of two `>= 2n - 1` to avoid wrap-around; rustfft
/// does not normalise, so `1 / n_padded` is applied explicitly.
fn autocov_fft(sample: ArrayView1<f64>) -> Array1<f64> {
    let n = sample.len();
    if n == 0 {
        return Array1::zeros(0);
    }
    let mut n_padded = 1;
    while n_padded < 2 * n - 1 {
        n_padded <<= 1;
    }
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_padded);
    let ffti = planner.plan_fft_inverse(n_padded);

    let mean = sample.sum() / n as f64;
    let mut x: Vec<Complex<f64>> = sample
        .iter()
        .map(|xi| Complex::new(xi - mean, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)).take(n_padded - n))
        .collect();
    fft.process(&mut x);
    x.iter_mut().for_each(|xi| *xi *= xi.conj());
    ffti.process(&mut x);
    x.iter()
        .take(n)
        .map(|xi| xi.re / n_padded as f64 / n as f64)
        .collect()
}

/// Brute force autocovariance: `sum_t x[t] * x[t + lag] / n` over the centred sequence.
fn autocov_bf(sample: ArrayView1<f64>) -> Array1<f64> {
    let n = sample.len();
    if n == 0 {
        return Array1::zeros(0);
    }
    let centred = &sample - sample.sum() / n as f64;
    (0..n)
        .map(|lag| {
            let mut sum_lag = 0.0;
            for t in 0..(n - lag) {
                sum_lag += centred[t] * centred[t + lag];
            }
            sum_lag / n as f64
        })
        .collect()
}
