/*!
# Kernel density estimation

Gaussian kernel density estimates of one sample ([`kde_1d`]) or of a pair of samples
([`kde_2d`]). Both bin the data linearly onto a regular grid and convolve the bin counts with a
sampled Gaussian kernel through an FFT, so the cost grows with the grid size rather than with
the product of sample size and grid size.

## Example

```rust
use posterior_plots::kde::{kde_1d, KdeOptions};

let sample = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 4.0, 4.0];
let kde = kde_1d(&sample, &KdeOptions::default()).unwrap();

let dx = kde.grid[1] - kde.grid[0];
let mass: f64 = kde.density.sum() * dx;
assert!((mass - 1.0).abs() < 1e-2);
```

## Notes

The 2D estimate uses an axis-aligned kernel (no correlation term) and neither estimate
reflects mass across hard parameter bounds.
*/

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};
use ndarray_stats::QuantileExt;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::PlotConfig;
use crate::error::{Error, Result};
use crate::stats::{cmp_f64, count_distinct_sorted, iqr_sorted, std_dev};

/// Closed-form bandwidth rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandwidthRule {
    /// `1.06 σ n^(-1/5)`.
    Scott,
    /// `0.9 min(σ, IQR / 1.34) n^(-1/5)`.
    #[default]
    Silverman,
}

/// How the kernel bandwidth is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bandwidth {
    /// Use a named rule as is.
    Rule(BandwidthRule),
    /// Multiply the dispersion-based default (Silverman) by a positive factor.
    Scale(f64),
}

impl Default for Bandwidth {
    fn default() -> Self {
        Bandwidth::Rule(BandwidthRule::default())
    }
}

impl FromStr for Bandwidth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        const EXPECTED: &str = "scott, silverman, or a positive number";
        match s.to_ascii_lowercase().as_str() {
            "scott" => Ok(Bandwidth::Rule(BandwidthRule::Scott)),
            "silverman" | "default" => Ok(Bandwidth::Rule(BandwidthRule::Silverman)),
            other => match other.parse::<f64>() {
                Ok(f) if f.is_finite() && f > 0.0 => Ok(Bandwidth::Scale(f)),
                _ => Err(Error::invalid("bandwidth", s, EXPECTED)),
            },
        }
    }
}

impl Bandwidth {
    fn validate(self) -> Result<Self> {
        match self {
            Bandwidth::Scale(f) if !(f.is_finite() && f > 0.0) => Err(Error::invalid(
                "bandwidth",
                f,
                "scott, silverman, or a positive number",
            )),
            bw => Ok(bw),
        }
    }

    /// Bandwidth for a sorted sample with at least two distinct values.
    fn estimate(self, sorted: &[f64]) -> f64 {
        let n = sorted.len() as f64;
        let sd = std_dev(sorted);
        let silverman = || {
            let robust = iqr_sorted(sorted) / 1.34;
            let spread = if robust > 0.0 { sd.min(robust) } else { sd };
            0.9 * spread * n.powf(-0.2)
        };
        match self {
            Bandwidth::Rule(BandwidthRule::Scott) => 1.06 * sd * n.powf(-0.2),
            Bandwidth::Rule(BandwidthRule::Silverman) => silverman(),
            Bandwidth::Scale(f) => silverman() * f,
        }
    }
}

/// Margin added around the data range, in bandwidths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extent {
    /// `PlotConfig::kde_extend` bandwidths.
    #[default]
    Standard,
    /// `PlotConfig::kde_extend_overlay` bandwidths, for densities overlaid on one axes.
    Overlay,
}

/// Options of a one-dimensional estimate.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KdeOptions {
    pub bandwidth: Bandwidth,
    /// Return the running integral instead of the density.
    pub cumulative: bool,
    /// Probabilities in `[0, 1]` whose positions are reported as [`QuantileMark`]s.
    pub quantiles: Vec<f64>,
    pub extent: Extent,
    /// Explicit grid limits; they must contain every finite value.
    pub limits: Option<(f64, f64)>,
    /// Number of grid points; `None` uses `PlotConfig::kde_grid_len`.
    pub grid_len: Option<usize>,
    /// Per-call configuration override.
    pub config: Option<PlotConfig>,
}

/// Position of a requested quantile on the density grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileMark {
    pub q: f64,
    pub x: f64,
    /// Value of the returned curve at `x`.
    pub density: f64,
}

/// One-dimensional density estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Density1d {
    pub grid: Array1<f64>,
    pub density: Array1<f64>,
    pub bandwidth: f64,
    pub cumulative: bool,
    pub quantiles: Vec<QuantileMark>,
}

impl Density1d {
    /// Single-point result for samples without spread. `None` (no finite values) yields an
    /// empty curve.
    pub fn degenerate(value: Option<f64>, cumulative: bool) -> Self {
        let (grid, density) = match value {
            Some(v) => (Array1::from(vec![v]), Array1::from(vec![1.0])),
            None => (Array1::zeros(0), Array1::zeros(0)),
        };
        Self {
            grid,
            density,
            bandwidth: 0.0,
            cumulative,
            quantiles: Vec::new(),
        }
    }

    /// Grid spacing, zero for degenerate results.
    pub fn dx(&self) -> f64 {
        if self.grid.len() < 2 {
            0.0
        } else {
            self.grid[1] - self.grid[0]
        }
    }

    /// Grid position of the highest density value.
    pub fn mode(&self) -> Option<f64> {
        let idx = self.density.argmax().ok()?;
        Some(self.grid[idx])
    }
}

/// Sorted finite values plus the number of distinct ones.
fn prepare(values: &[f64]) -> (Vec<f64>, usize) {
    let mut x = crate::stats::finite(values);
    x.sort_unstable_by(cmp_f64);
    let distinct = count_distinct_sorted(&x);
    (x, distinct)
}

fn extend_factor(extent: Extent, config: &PlotConfig) -> f64 {
    match extent {
        Extent::Standard => config.kde_extend,
        Extent::Overlay => config.kde_extend_overlay,
    }
}

/// Estimates the density of `values`.
///
/// Non-finite values are dropped first. Fails with [`Error::DegenerateSample`] when fewer than
/// two distinct finite values remain; see [`kde_1d_or_degenerate`] for the recovering variant.
pub fn kde_1d(values: &[f64], options: &KdeOptions) -> Result<Density1d> {
    let config = crate::config::resolve(options.config.as_ref());
    let bandwidth = options.bandwidth.validate()?;
    for &q in &options.quantiles {
        if !(0.0..=1.0).contains(&q) {
            return Err(Error::invalid("quantile", q, "values between 0 and 1"));
        }
    }
    let grid_len = options.grid_len.unwrap_or(config.kde_grid_len);
    if grid_len < 2 {
        return Err(Error::invalid("grid_len", grid_len, "at least 2 grid points"));
    }

    let (x, distinct) = prepare(values);
    if distinct < 2 {
        return Err(Error::DegenerateSample { distinct });
    }
    let (x_min, x_max) = (x[0], x[x.len() - 1]);
    let bw = bandwidth.estimate(&x);

    let (lo, hi) = match options.limits {
        Some((lo, hi)) => {
            if !(lo < hi && lo <= x_min && hi >= x_max) {
                return Err(Error::invalid(
                    "limits",
                    format!("({lo}, {hi})"),
                    format!("an increasing range containing [{x_min}, {x_max}]"),
                ));
            }
            (lo, hi)
        }
        None => {
            let margin = extend_factor(options.extent, config) * bw;
            (x_min - margin, x_max + margin)
        }
    };
    let grid = Array1::linspace(lo, hi, grid_len);
    let dx = (hi - lo) / (grid_len - 1) as f64;

    let counts = linear_binning(&x, lo, dx, grid_len);
    let mut density = gaussian_smooth(&counts, bw / dx);
    normalise(&mut density, dx);
    log::debug!("kde_1d: n={} bandwidth={bw:.5} grid=[{lo:.4}, {hi:.4}]x{grid_len}", x.len());

    let cdf = cumulative_of(&density);
    let curve = if options.cumulative {
        cdf.clone()
    } else {
        density
    };
    let quantiles = options
        .quantiles
        .iter()
        .map(|&q| {
            let idx = cdf
                .iter()
                .position(|&c| c >= q)
                .unwrap_or(grid_len - 1);
            QuantileMark {
                q,
                x: grid[idx],
                density: curve[idx],
            }
        })
        .collect();

    Ok(Density1d {
        grid,
        density: curve,
        bandwidth: bw,
        cumulative: options.cumulative,
        quantiles,
    })
}

/// Like [`kde_1d`], but recovers a degenerate sample into [`Density1d::degenerate`].
pub fn kde_1d_or_degenerate(values: &[f64], options: &KdeOptions) -> Result<Density1d> {
    match kde_1d(values, options) {
        Err(Error::DegenerateSample { distinct }) => {
            log::warn!(
                "Sample has {distinct} distinct finite value(s); drawing a single-point density"
            );
            let value = values.iter().copied().find(|v| v.is_finite());
            Ok(Density1d::degenerate(value, options.cumulative))
        }
        other => other,
    }
}

/// Options of a two-dimensional estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde2dOptions {
    pub bandwidth: Bandwidth,
    /// Compute contour levels.
    pub contour: bool,
    /// Number of contour levels; `None` uses `PlotConfig::contour_levels`.
    pub n_levels: Option<usize>,
    /// Grid points along x and y; `None` uses `PlotConfig::kde_grid_2d` for both.
    pub gridsize: Option<(usize, usize)>,
    /// Per-call configuration override.
    pub config: Option<PlotConfig>,
}

impl Default for Kde2dOptions {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::default(),
            contour: true,
            n_levels: None,
            gridsize: None,
            config: None,
        }
    }
}

/// Two-dimensional density estimate. `density[[i, j]]` is the density at
/// `(grid_x[i], grid_y[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct Density2d {
    pub grid_x: Array1<f64>,
    pub grid_y: Array1<f64>,
    pub density: Array2<f64>,
    /// Marginal bandwidths; the kernel covariance is `diag(bx², by²)`.
    pub bandwidth: (f64, f64),
    /// Strictly increasing density thresholds, empty unless contours were requested.
    pub contour_levels: Vec<f64>,
}

impl Density2d {
    /// Single-cell result for pairs without spread.
    pub fn degenerate(point: Option<(f64, f64)>) -> Self {
        let (gx, gy, density) = match point {
            Some((x, y)) => (
                Array1::from(vec![x]),
                Array1::from(vec![y]),
                Array2::from_elem((1, 1), 1.0),
            ),
            None => (Array1::zeros(0), Array1::zeros(0), Array2::zeros((0, 0))),
        };
        Self {
            grid_x: gx,
            grid_y: gy,
            density,
            bandwidth: (0.0, 0.0),
            contour_levels: Vec::new(),
        }
    }
}

/// Estimates the joint density of paired samples.
///
/// Pairs with a non-finite member are dropped. Each marginal needs two distinct values.
pub fn kde_2d(x: &[f64], y: &[f64], options: &Kde2dOptions) -> Result<Density2d> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    let config = crate::config::resolve(options.config.as_ref());
    let bandwidth = options.bandwidth.validate()?;
    let (nx, ny) = options
        .gridsize
        .unwrap_or((config.kde_grid_2d, config.kde_grid_2d));
    if nx < 2 || ny < 2 {
        return Err(Error::invalid(
            "gridsize",
            format!("({nx}, {ny})"),
            "at least 2 grid points per axis",
        ));
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    let (sx, dist_x) = prepare(&xs);
    let (sy, dist_y) = prepare(&ys);
    if dist_x < 2 || dist_y < 2 {
        return Err(Error::DegenerateSample {
            distinct: dist_x.min(dist_y),
        });
    }

    let bx = bandwidth.estimate(&sx);
    let by = bandwidth.estimate(&sy);
    let ext = config.kde_extend;
    let (x_lo, x_hi) = (sx[0] - ext * bx, sx[sx.len() - 1] + ext * bx);
    let (y_lo, y_hi) = (sy[0] - ext * by, sy[sy.len() - 1] + ext * by);
    let dx = (x_hi - x_lo) / (nx - 1) as f64;
    let dy = (y_hi - y_lo) / (ny - 1) as f64;

    // Bilinear binning.
    let mut counts = Array2::<f64>::zeros((nx, ny));
    for (&a, &b) in xs.iter().zip(&ys) {
        let (i, fx) = split_position((a - x_lo) / dx, nx);
        let (j, fy) = split_position((b - y_lo) / dy, ny);
        counts[[i, j]] += (1.0 - fx) * (1.0 - fy);
        if i + 1 < nx {
            counts[[i + 1, j]] += fx * (1.0 - fy);
        }
        if j + 1 < ny {
            counts[[i, j + 1]] += (1.0 - fx) * fy;
        }
        if i + 1 < nx && j + 1 < ny {
            counts[[i + 1, j + 1]] += fx * fy;
        }
    }

    // Separable convolution: along y for every x row, then along x for every y column.
    for mut row in counts.axis_iter_mut(Axis(0)) {
        let smoothed = gaussian_smooth(&row.to_owned(), by / dy);
        row.assign(&smoothed);
    }
    for mut col in counts.axis_iter_mut(Axis(1)) {
        let smoothed = gaussian_smooth(&col.to_owned(), bx / dx);
        col.assign(&smoothed);
    }
    let mut density = counts;
    density.mapv_inplace(|v| v.max(0.0));
    let total = density.sum() * dx * dy;
    if total > 0.0 {
        density /= total;
    }
    log::debug!("kde_2d: n={} bandwidth=({bx:.5}, {by:.5}) grid={nx}x{ny}", xs.len());

    let contour_levels = if options.contour {
        hdr_levels(
            &density,
            dx * dy,
            options.n_levels.unwrap_or(config.contour_levels),
        )
    } else {
        Vec::new()
    };

    Ok(Density2d {
        grid_x: Array1::linspace(x_lo, x_hi, nx),
        grid_y: Array1::linspace(y_lo, y_hi, ny),
        density,
        bandwidth: (bx, by),
        contour_levels,
    })
}

/// Like [`kde_2d`], but recovers a degenerate pair into [`Density2d::degenerate`].
pub fn kde_2d_or_degenerate(x: &[f64], y: &[f64], options: &Kde2dOptions) -> Result<Density2d> {
    match kde_2d(x, y, options) {
        Err(Error::DegenerateSample { distinct }) => {
            log::warn!("Paired sample has {distinct} distinct value(s) on one axis; drawing a single cell");
            let point = x
                .iter()
                .zip(y)
                .find(|(a, b)| a.is_finite() && b.is_finite())
                .map(|(a, b)| (*a, *b));
            Ok(Density2d::degenerate(point))
        }
        other => other,
    }
}

/// Density thresholds of the highest-density regions holding `1 - k / (n + 1)` of the mass,
/// `k = 1..=n`, returned strictly increasing.
fn hdr_levels(density: &Array2<f64>, cell_area: f64, n_levels: usize) -> Vec<f64> {
    let mut values: Vec<f64> = density.iter().copied().filter(|v| *v > 0.0).collect();
    values.sort_unstable_by(|a, b| cmp_f64(b, a));
    let total: f64 = values.iter().sum::<f64>() * cell_area;
    if values.is_empty() || total <= 0.0 {
        return Vec::new();
    }

    let mut cumulative = Vec::with_capacity(values.len());
    let mut acc = 0.0;
    for v in &values {
        acc += v * cell_area / total;
        cumulative.push(acc);
    }

    let mut levels: Vec<f64> = (1..=n_levels)
        .map(|k| {
            let mass = 1.0 - k as f64 / (n_levels + 1) as f64;
            let idx = cumulative
                .iter()
                .position(|&c| c >= mass)
                .unwrap_or(values.len() - 1);
            values[idx]
        })
        .collect();
    levels.dedup();
    levels
}

/// Splits a fractional grid position into a lower index and the weight of the upper one.
fn split_position(pos: f64, len: usize) -> (usize, f64) {
    let pos = pos.clamp(0.0, (len - 1) as f64);
    let i = (pos.floor() as usize).min(len - 1);
    (i, pos - i as f64)
}

/// Linear binning: each value splits its unit weight between the two nearest grid points.
fn linear_binning(sorted: &[f64], lo: f64, dx: f64, len: usize) -> Array1<f64> {
    let mut counts = Array1::<f64>::zeros(len);
    for &v in sorted {
        let (i, frac) = split_position((v - lo) / dx, len);
        counts[i] += 1.0 - frac;
        if i + 1 < len {
            counts[i + 1] += frac;
        }
    }
    counts
}

/// Convolves `signal` with a Gaussian of standard deviation `sigma` (in grid steps),
/// truncated at four standard deviations, returning an output of the same length.
fn gaussian_smooth(signal: &Array1<f64>, sigma: f64) -> Array1<f64> {
    let n = signal.len();
    if n == 0 || !(sigma.is_finite() && sigma > 0.0) {
        return signal.clone();
    }
    let half = ((4.0 * sigma).ceil() as usize).clamp(1, n.saturating_sub(1).max(1));
    let kernel: Vec<f64> = (0..=2 * half)
        .map(|k| {
            let u = (k as f64 - half as f64) / sigma;
            (-0.5 * u * u).exp()
        })
        .collect();

    let full_len = n + kernel.len() - 1;
    let mut n_padded = 1;
    while n_padded < full_len {
        n_padded <<= 1;
    }
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_padded);
    let ffti = planner.plan_fft_inverse(n_padded);

    let pad = |data: &mut dyn Iterator<Item = f64>| -> Vec<Complex<f64>> {
        let mut buf: Vec<Complex<f64>> = data.map(|v| Complex::new(v, 0.0)).collect();
        buf.resize(n_padded, Complex::new(0.0, 0.0));
        buf
    };
    let mut a = pad(&mut signal.iter().copied());
    let mut b = pad(&mut kernel.iter().copied());
    fft.process(&mut a);
    fft.process(&mut b);
    a.iter_mut().zip(&b).for_each(|(ai, bi)| *ai *= bi);
    ffti.process(&mut a);

    // rustfft leaves the inverse unnormalised.
    a.iter()
        .skip(half)
        .take(n)
        .map(|c| (c.re / n_padded as f64).max(0.0))
        .collect()
}

/// Scales `density` so that `sum(density) * dx == 1`.
fn normalise(density: &mut Array1<f64>, dx: f64) {
    let total = density.sum() * dx;
    if total > 0.0 {
        *density /= total;
    }
}

/// Running sum scaled so the last value is exactly one.
fn cumulative_of(density: &Array1<f64>) -> Array1<f64> {
    let mut cdf = density.clone();
    cdf.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
    if let Some(&last) = cdf.last() {
        if last > 0.0 {
            cdf /= last;
        }
    }
    cdf
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bandwidth::Rule(BandwidthRule::Scott) => f.write_str("scott"),
            Bandwidth::Rule(BandwidthRule::Silverman) => f.write_str("silverman"),
            Bandwidth::Scale(v) => write!(f, "{v}"),
        }
    }
}
