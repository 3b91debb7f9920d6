/*!
# Labeled posterior arrays

A [`Dataset`] holds named variables sharing a set of named dimensions, each dimension carrying
one coordinate label per index. Posterior draws conventionally use the sample dimensions
[`CHAIN`] and [`DRAW`] first, followed by the parameter's own shape dimensions.

```rust
use ndarray::{Array2, Array3};
use posterior_plots::dataset::{CoordValue, Dataset};

let mut data = Dataset::new();
data.set_coords("school", vec!["Choate".into(), "Deerfield".into()])
    .unwrap();
data.add_var("mu", &["chain", "draw"], Array2::<f64>::zeros((2, 50)))
    .unwrap();
data.add_var("theta", &["chain", "draw", "school"], Array3::<f64>::zeros((2, 50, 2)))
    .unwrap();

assert_eq!(data.dim_len("draw"), Some(50));
assert_eq!(data.coords("school").unwrap()[1], CoordValue::from("Deerfield"));
```
*/

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{ArrayD, Axis};
use num_traits::ToPrimitive;

use crate::error::{Error, Result};

/// Name of the chain sample dimension.
pub const CHAIN: &str = "chain";
/// Name of the draw sample dimension.
pub const DRAW: &str = "draw";

/// A single coordinate label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CoordValue {
    /// Integer label, used for implicit `0..len` coordinates.
    Int(i64),
    /// Text label.
    Str(String),
}

impl fmt::Display for CoordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordValue::Int(v) => write!(f, "{v}"),
            CoordValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CoordValue {
    fn from(v: i64) -> Self {
        CoordValue::Int(v)
    }
}

impl From<&str> for CoordValue {
    fn from(s: &str) -> Self {
        CoordValue::Str(s.to_string())
    }
}

impl From<String> for CoordValue {
    fn from(s: String) -> Self {
        CoordValue::Str(s)
    }
}

/// Restriction of dimensions to a subset of their coordinates, in the listed order.
pub type Coords = BTreeMap<String, Vec<CoordValue>>;

/// A named array whose axes are named dimensions of the owning [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl Variable {
    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension names, one per axis of [`Variable::data`].
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The raw values.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Axis index of dimension `dim`, if the variable has it.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

/// A collection of labeled variables over shared dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    dims: Vec<(String, Vec<CoordValue>)>,
    vars: Vec<Variable>,
}

impl Dataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a dataset from a `chain × draw × parameter` array, one scalar variable per
    /// parameter column.
    pub fn from_draws<T: ToPrimitive + Copy>(
        names: &[&str],
        draws: &ndarray::Array3<T>,
    ) -> Result<Self> {
        let n_params = draws.len_of(Axis(2));
        if names.len() != n_params {
            return Err(Error::LengthMismatch {
                x_len: names.len(),
                y_len: n_params,
            });
        }
        let mut out = Self::new();
        for (name, column) in names.iter().zip(draws.axis_iter(Axis(2))) {
            out.add_var_from(name, &[CHAIN, DRAW], &column.to_owned().into_dyn())?;
        }
        Ok(out)
    }

    /// Declares (or replaces) the coordinate labels of a dimension. The length must agree with
    /// every variable already using the dimension.
    pub fn set_coords(&mut self, dim: &str, coords: Vec<CoordValue>) -> Result<()> {
        for var in &self.vars {
            if let Some(axis) = var.axis_of(dim) {
                if var.data.len_of(Axis(axis)) != coords.len() {
                    return Err(Error::LengthMismatch {
                        x_len: coords.len(),
                        y_len: var.data.len_of(Axis(axis)),
                    });
                }
            }
        }
        match self.dims.iter_mut().find(|(name, _)| name == dim) {
            Some((_, existing)) => *existing = coords,
            None => self.dims.push((dim.to_string(), coords)),
        }
        Ok(())
    }

    /// Adds a variable. Dimensions not declared yet receive integer coordinates `0..len`.
    pub fn add_var<D>(&mut self, name: &str, dims: &[&str], data: ndarray::Array<f64, D>) -> Result<()>
    where
        D: ndarray::Dimension,
    {
        let data = data.into_dyn();
        if data.ndim() != dims.len() {
            return Err(ndarray::ShapeError::from_kind(ndarray::ErrorKind::IncompatibleShape).into());
        }
        let mut pending = Vec::new();
        for (axis, dim) in dims.iter().enumerate() {
            let len = data.len_of(Axis(axis));
            match self.coords(dim) {
                Some(coords) if coords.len() != len => {
                    return Err(Error::LengthMismatch {
                        x_len: len,
                        y_len: coords.len(),
                    })
                }
                Some(_) => {}
                None => pending.push((
                    dim.to_string(),
                    (0..len as i64).map(CoordValue::Int).collect::<Vec<_>>(),
                )),
            }
        }
        self.dims.extend(pending);
        let var = Variable {
            name: name.to_string(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
        };
        match self.vars.iter_mut().find(|v| v.name == name) {
            Some(existing) => *existing = var,
            None => self.vars.push(var),
        }
        Ok(())
    }

    /// Adds a variable from any numeric element type.
    pub fn add_var_from<T: ToPrimitive + Copy>(
        &mut self,
        name: &str,
        dims: &[&str],
        data: &ArrayD<T>,
    ) -> Result<()> {
        let converted = data.mapv(|x| x.to_f64().unwrap_or(f64::NAN));
        self.add_var(name, dims, converted)
    }

    /// Coordinates of a dimension.
    pub fn coords(&self, dim: &str) -> Option<&[CoordValue]> {
        self.dims
            .iter()
            .find(|(name, _)| name == dim)
            .map(|(_, coords)| coords.as_slice())
    }

    /// Length of a dimension.
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.coords(dim).map(<[CoordValue]>::len)
    }

    /// Dimension names in declaration order.
    pub fn dim_names(&self) -> impl Iterator<Item = &str> {
        self.dims.iter().map(|(name, _)| name.as_str())
    }

    /// Variables in declaration order.
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// Looks up a variable by name.
    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.vars.iter().find(|v| v.name == name)
    }

    /// Variable names in declaration order.
    pub fn var_names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    /// Restricts dimensions to the listed coordinates. Unspecified dimensions are kept whole.
    pub fn select(&self, coords: &Coords) -> Result<Dataset> {
        if coords.is_empty() {
            return Ok(self.clone());
        }
        let missing_dims: Vec<String> = coords
            .keys()
            .filter(|dim| self.coords(dim).is_none())
            .cloned()
            .collect();
        if !missing_dims.is_empty() {
            return Err(Error::NotFound {
                what: "dimension",
                names: missing_dims,
            });
        }

        let mut indices: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        let mut missing_coords = Vec::new();
        for (dim, wanted) in coords {
            let available = self.coords(dim).unwrap_or_default();
            let mut idx = Vec::with_capacity(wanted.len());
            for value in wanted {
                match available.iter().position(|c| c == value) {
                    Some(i) => idx.push(i),
                    None => missing_coords.push(format!("{dim}={value}")),
                }
            }
            indices.insert(dim.as_str(), idx);
        }
        if !missing_coords.is_empty() {
            return Err(Error::NotFound {
                what: "coordinate",
                names: missing_coords,
            });
        }

        let dims = self
            .dims
            .iter()
            .map(|(name, values)| match coords.get(name) {
                Some(wanted) => (name.clone(), wanted.clone()),
                None => (name.clone(), values.clone()),
            })
            .collect();
        let vars = self
            .vars
            .iter()
            .map(|var| {
                let mut data = var.data.clone();
                for (axis, dim) in var.dims.iter().enumerate() {
                    if let Some(idx) = indices.get(dim.as_str()) {
                        data = data.select(Axis(axis), idx);
                    }
                }
                Variable {
                    name: var.name.clone(),
                    dims: var.dims.clone(),
                    data,
                }
            })
            .collect();
        Ok(Dataset { dims, vars })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn shape_of(data: &ArrayD<f64>) -> Vec<usize> {
        data.shape().to_vec()
    }

    fn eight_schools() -> Dataset {
        let mut data = Dataset::new();
        data.set_coords(
            "school",
            vec!["Choate".into(), "Deerfield".into(), "Phillips Andover".into()],
        )
        .unwrap();
        data.add_var("mu", &[CHAIN, DRAW], Array2::<f64>::zeros((2, 10)))
            .unwrap();
        let theta = Array3::from_shape_fn((2, 10, 3), |(c, d, s)| (c * 100 + d * 10 + s) as f64);
        data.add_var("theta", &[CHAIN, DRAW, "school"], theta)
            .unwrap();
        data
    }

    #[test]
    fn test_implicit_integer_coords() {
        let data = eight_schools();
        assert_eq!(data.dim_len(CHAIN), Some(2));
        assert_eq!(data.coords(DRAW).unwrap()[9], CoordValue::Int(9));
        assert_eq!(data.var_names(), vec!["mu", "theta"]);
    }

    #[test]
    fn test_length_mismatch_with_declared_coords() {
        let mut data = eight_schools();
        let res = data.add_var("bad", &[CHAIN, DRAW, "school"], Array3::<f64>::zeros((2, 10, 4)));
        assert!(matches!(res, Err(Error::LengthMismatch { x_len: 4, y_len: 3 })));
    }

    #[test]
    fn test_dims_must_match_ndim() {
        let mut data = Dataset::new();
        let res = data.add_var("x", &[CHAIN], Array2::<f64>::zeros((2, 3)));
        assert!(matches!(res, Err(Error::Shape(_))));
    }

    #[test]
    fn test_select_reorders_and_restricts() {
        let data = eight_schools();
        let mut coords = Coords::new();
        coords.insert(
            "school".into(),
            vec!["Phillips Andover".into(), "Choate".into()],
        );
        let sub = data.select(&coords).unwrap();
        let theta = sub.var("theta").unwrap();
        assert_eq!(shape_of(theta.data()), vec![2, 10, 2]);
        assert_eq!(theta.data()[[1, 3, 0]], 132.0);
        assert_eq!(theta.data()[[1, 3, 1]], 130.0);
        assert_eq!(sub.coords("school").unwrap()[0], CoordValue::from("Phillips Andover"));
        // Variables without the dimension are untouched.
        assert_eq!(shape_of(sub.var("mu").unwrap().data()), vec![2, 10]);
    }

    #[test]
    fn test_select_unknown_names() {
        let data = eight_schools();
        let mut coords = Coords::new();
        coords.insert("county".into(), vec!["x".into()]);
        assert!(matches!(
            data.select(&coords),
            Err(Error::NotFound { what: "dimension", .. })
        ));

        let mut coords = Coords::new();
        coords.insert("school".into(), vec!["Hotchkiss".into(), "Choate".into()]);
        match data.select(&coords) {
            Err(Error::NotFound { what, names }) => {
                assert_eq!(what, "coordinate");
                assert_eq!(names, vec!["school=Hotchkiss".to_string()]);
            }
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_from_draws() {
        let draws = Array3::from_shape_fn((2, 5, 2), |(c, d, p)| (c + d + p) as i32);
        let data = Dataset::from_draws(&["a", "b"], &draws).unwrap();
        assert_eq!(data.var_names(), vec!["a", "b"]);
        assert_eq!(data.var("b").unwrap().data()[[1, 4]], 6.0);
        assert!(Dataset::from_draws(&["a"], &draws).is_err());
    }
}
