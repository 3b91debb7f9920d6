/*!
Process-wide plotting defaults.

The configuration is loaded once: [`init`] installs a [`PlotConfig`] for the whole process and
[`global`] hands out a shared reference to it (falling back to [`PlotConfig::default`] when
nothing was installed). Every options struct in [`crate::plots`] also carries an optional
`config` field that overrides the global one for a single call.

# Example

```rust
use posterior_plots::config::{self, PlotConfig};

let cfg = PlotConfig {
    max_subplots: 12,
    ..PlotConfig::default()
};
assert_eq!(cfg.max_subplots, 12);
assert_eq!(config::global().kde_grid_len, 512);
```
*/

use std::sync::OnceLock;

use crate::backend::BackendKind;
use crate::error::{Error, Result};

static GLOBAL: OnceLock<PlotConfig> = OnceLock::new();

/// Defaults used by layout, density estimation and dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Backend used when a call does not select one.
    pub default_backend: BackendKind,
    /// Width of a single subplot in inches.
    pub figure_width: f64,
    /// Height of a single subplot in inches.
    pub figure_height: f64,
    /// Extra scaling applied to each cell when more than one subplot is drawn.
    pub grid_scale: f64,
    /// Base axis-label font size.
    pub label_size: f64,
    /// Base title font size.
    pub title_size: f64,
    /// Base tick-label font size; an explicit `textsize` is relative to this.
    pub tick_size: f64,
    /// Base line width.
    pub line_width: f64,
    /// Base marker size.
    pub marker_size: f64,
    /// Lower bound for the automatic text scale.
    pub min_text_scale: f64,
    /// Maximum number of subplots generated by a single call.
    pub max_subplots: usize,
    /// Upper bound of the number of automatic histogram bins.
    pub max_bins: usize,
    /// Number of evaluation points of a 1D density.
    pub kde_grid_len: usize,
    /// Number of evaluation points per axis of a 2D density.
    pub kde_grid_2d: usize,
    /// Number of contour levels of a 2D density.
    pub contour_levels: usize,
    /// Grid margin around the data, in bandwidths.
    pub kde_extend: f64,
    /// Grid margin used when densities are overlaid for comparison.
    pub kde_extend_overlay: f64,
    /// Upper bound of the default autocorrelation lag.
    pub max_lag_cap: usize,
    /// Pixels per inch when sizing Bokeh figures.
    pub bokeh_dpi: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            default_backend: BackendKind::Matplotlib,
            figure_width: 6.4,
            figure_height: 4.8,
            grid_scale: 1.15,
            label_size: 10.0,
            title_size: 12.0,
            tick_size: 10.0,
            line_width: 1.5,
            marker_size: 6.0,
            min_text_scale: 0.5,
            max_subplots: 40,
            max_bins: 200,
            kde_grid_len: 512,
            kde_grid_2d: 128,
            contour_levels: 10,
            kde_extend: 3.0,
            kde_extend_overlay: 5.0,
            max_lag_cap: 100,
            bokeh_dpi: 60.0,
        }
    }
}

/// Installs the process-wide configuration. Fails if a configuration was already installed
/// or read through [`global`].
pub fn init(config: PlotConfig) -> Result<()> {
    GLOBAL.set(config).map_err(|_| {
        Error::invalid(
            "config",
            "second initialisation",
            "a single call to config::init before any plot is drawn",
        )
    })
}

/// Returns the process-wide configuration.
pub fn global() -> &'static PlotConfig {
    GLOBAL.get_or_init(PlotConfig::default)
}

/// Picks the per-call override if present, the global configuration otherwise.
pub(crate) fn resolve(local: Option<&PlotConfig>) -> &PlotConfig {
    local.unwrap_or_else(|| global())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_local() {
        let local = PlotConfig {
            max_lag_cap: 7,
            ..PlotConfig::default()
        };
        assert_eq!(resolve(Some(&local)).max_lag_cap, 7);
        assert_eq!(resolve(None).max_lag_cap, global().max_lag_cap);
    }

    #[test]
    fn test_init_only_once() {
        // `global` may already have been touched by another test; either way a second
        // installation must be rejected.
        let _ = global();
        assert!(init(PlotConfig::default()).is_err());
    }
}
