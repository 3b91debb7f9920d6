/*!
# Variable iteration

Flattens a [`Dataset`] into an ordered sequence of [`PlotUnit`]s: one unit per variable and per
combination of the variable's non-sample coordinates. The draw dimension is always flattened
into the unit's values; the chain dimension is flattened too when chains are combined, and
otherwise iterated like any other coordinate axis.

```rust
use ndarray::Array3;
use posterior_plots::dataset::Dataset;
use posterior_plots::var_iter::VarIter;

let mut data = Dataset::new();
data.add_var("theta", &["chain", "draw", "school"], Array3::<f64>::zeros((4, 100, 3)))
    .unwrap();

let combined: Vec<_> = VarIter::new(&data, None, true).unwrap().collect();
assert_eq!(combined.len(), 3);
assert_eq!(combined[0].values.len(), 400);

let per_chain = VarIter::new(&data, None, false).unwrap().count();
assert_eq!(per_chain, 12);
```
*/

use ndarray::{Array1, Axis};

use crate::dataset::{CoordValue, Dataset, Variable, CHAIN, DRAW};
use crate::error::{Error, Result};

/// One flattened `(label, values)` pair, ready for estimation or direct rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotUnit {
    pub var_name: String,
    pub label: String,
    /// Fixed coordinate per iterated dimension, in the variable's dimension order.
    pub selection: Vec<(String, CoordValue)>,
    pub values: Array1<f64>,
}

/// Builds the human-readable label of a unit: the variable name, and when coordinates are
/// selected, a second line with the comma-separated coordinate values.
pub fn make_label(var_name: &str, selection: &[(String, CoordValue)]) -> String {
    if selection.is_empty() {
        return var_name.to_string();
    }
    let coords = selection
        .iter()
        .map(|(_, value)| value.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{var_name}\n{coords}")
}

/// Resolves requested variable names against the dataset.
///
/// `None` selects every variable in declaration order. A list whose entries all start with
/// `~` selects every variable except the listed ones. Any other list is taken literally and
/// every missing name is reported at once.
pub fn resolve_var_names(data: &Dataset, var_names: Option<&[&str]>) -> Result<Vec<String>> {
    let all = data.var_names();
    let requested = match var_names {
        None => return Ok(all.into_iter().map(str::to_string).collect()),
        Some(names) => names,
    };

    let excluded: Vec<&str> = requested.iter().filter_map(|n| n.strip_prefix('~')).collect();
    let (wanted, lookup): (Vec<String>, Vec<&str>) =
        if !requested.is_empty() && excluded.len() == requested.len() {
            let kept = all
                .iter()
                .filter(|name| !excluded.contains(name))
                .map(|name| name.to_string())
                .collect();
            (kept, excluded)
        } else {
            (
                requested.iter().map(|n| n.to_string()).collect(),
                requested.to_vec(),
            )
        };

    let missing: Vec<String> = lookup
        .iter()
        .filter(|name| data.var(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::NotFound {
            what: "variable",
            names: missing,
        });
    }
    Ok(wanted)
}

/// Iterator over the plot units of a dataset.
///
/// Deterministic and finite; the only state is the position of the current variable and the
/// index tuple over its iterated dimensions. [`VarIter::restart`] rewinds it.
#[derive(Debug, Clone)]
pub struct VarIter<'a> {
    data: &'a Dataset,
    vars: Vec<&'a Variable>,
    combined: bool,
    var_pos: usize,
    index: Option<Vec<usize>>,
}

impl<'a> VarIter<'a> {
    /// Creates the iterator. Fails with [`Error::NotFound`] if a requested variable is absent.
    pub fn new(data: &'a Dataset, var_names: Option<&[&str]>, combined: bool) -> Result<Self> {
        let names = resolve_var_names(data, var_names)?;
        let vars = names.iter().filter_map(|name| data.var(name)).collect();
        let mut iter = Self {
            data,
            vars,
            combined,
            var_pos: 0,
            index: None,
        };
        iter.restart();
        Ok(iter)
    }

    /// Rewinds to the first unit.
    pub fn restart(&mut self) {
        self.var_pos = 0;
        self.index = self.vars.first().map(|var| vec![0; self.iter_axes(var).len()]);
    }

    fn is_sample_dim(&self, dim: &str) -> bool {
        dim == DRAW || (self.combined && dim == CHAIN)
    }

    /// Axes of `var` that are iterated rather than flattened, in declaration order.
    fn iter_axes(&self, var: &Variable) -> Vec<usize> {
        var.dims()
            .iter()
            .enumerate()
            .filter(|(_, dim)| !self.is_sample_dim(dim))
            .map(|(axis, _)| axis)
            .collect()
    }

    fn advance(&mut self) {
        let Some(var) = self.vars.get(self.var_pos).copied() else {
            self.index = None;
            return;
        };
        let axes = self.iter_axes(var);
        if let Some(index) = self.index.as_mut() {
            // Row-major increment: the last iterated axis moves fastest.
            for pos in (0..axes.len()).rev() {
                index[pos] += 1;
                if index[pos] < var.data().len_of(Axis(axes[pos])) {
                    return;
                }
                index[pos] = 0;
            }
        }
        self.var_pos += 1;
        self.index = self
            .vars
            .get(self.var_pos)
            .map(|next| vec![0; self.iter_axes(next).len()]);
    }

    fn unit(&self, var: &Variable, index: &[usize]) -> PlotUnit {
        let axes = self.iter_axes(var);
        let selection: Vec<(String, CoordValue)> = axes
            .iter()
            .zip(index)
            .map(|(&axis, &i)| {
                let dim = &var.dims()[axis];
                let coord = self
                    .data
                    .coords(dim)
                    .and_then(|coords| coords.get(i).cloned())
                    .unwrap_or(CoordValue::Int(i as i64));
                (dim.clone(), coord)
            })
            .collect();

        // Remove the highest axes first so the remaining axis numbers stay valid.
        let mut view = var.data().view();
        for (&axis, &i) in axes.iter().zip(index).rev() {
            view = view.index_axis_move(Axis(axis), i);
        }
        PlotUnit {
            var_name: var.name().to_string(),
            label: make_label(var.name(), &selection),
            selection,
            values: view.iter().copied().collect(),
        }
    }
}

impl Iterator for VarIter<'_> {
    type Item = PlotUnit;

    fn next(&mut self) -> Option<PlotUnit> {
        loop {
            let var = *self.vars.get(self.var_pos)?;
            let index = self.index.clone()?;
            let axes = self.iter_axes(var);
            let empty = axes
                .iter()
                .any(|&axis| var.data().len_of(Axis(axis)) == 0);
            if empty {
                // A zero-length coordinate axis has no combinations at all.
                self.var_pos += 1;
                self.index = self
                    .vars
                    .get(self.var_pos)
                    .map(|next| vec![0; self.iter_axes(next).len()]);
                continue;
            }
            let unit = self.unit(var, &index);
            self.advance();
            return Some(unit);
        }
    }
}

/// Named rule pruning the unit sequence between iteration and layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Only the subplot limit applies.
    #[default]
    None,
    /// Autocorrelation plots: additionally drop units without any draws.
    Autocorr,
}

impl FilterPolicy {
    /// Applies the policy and truncates to `max_subplots`, warning when units are dropped.
    pub fn apply(self, units: Vec<PlotUnit>, max_subplots: usize) -> Vec<PlotUnit> {
        let mut units: Vec<PlotUnit> = match self {
            FilterPolicy::None => units,
            FilterPolicy::Autocorr => units.into_iter().filter(|u| !u.values.is_empty()).collect(),
        };
        if units.len() > max_subplots {
            log::warn!(
                "max_subplots ({max_subplots}) is smaller than the number of variables to plot ({}), generating only {max_subplots} plots",
                units.len()
            );
            units.truncate(max_subplots);
        }
        units
    }
}
