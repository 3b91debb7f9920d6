//! Error types shared by every plotting and estimation routine.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while preparing diagnostic plots.
///
/// All variants are raised at the point of detection. None of them is transient,
/// so callers should not retry.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Unrecognized mode string or out-of-range option.
    #[error("Invalid {argument} `{value}`. Expected one of: {expected}")]
    InvalidArgument {
        /// Name of the offending argument (e.g. `kind`).
        argument: &'static str,
        /// The value that was supplied.
        value: String,
        /// Human-readable description of the accepted values.
        expected: String,
    },

    /// Requested names are absent from the dataset.
    #[error("{what} not found: {}", names.join(", "))]
    NotFound {
        /// What kind of name was looked up (variable, dimension, coordinate).
        what: &'static str,
        /// Every missing name.
        names: Vec<String>,
    },

    /// An operation needed a specific number of variables or axes.
    #[error("Number of variables to be plotted must be {expected} (you supplied {actual})")]
    Cardinality {
        /// Description of the accepted count, e.g. `"2"` or `"2 or greater"`.
        expected: &'static str,
        /// The count that was actually supplied.
        actual: usize,
    },

    /// The sample has fewer than two distinct finite values.
    #[error("Degenerate sample: {distinct} distinct finite value(s), at least 2 are required")]
    DegenerateSample {
        /// Number of distinct finite values found.
        distinct: usize,
    },

    /// The requested feature combination is not implemented for this mode.
    #[error("Unsupported combination: {0}")]
    UnsupportedCombination(String),

    /// Paired inputs do not have the same length.
    #[error("Data length mismatch: x has {x_len} elements, y has {y_len} elements")]
    LengthMismatch {
        /// Length of the first input.
        x_len: usize,
        /// Length of the second input.
        y_len: usize,
    },

    /// Variable data does not match its declared dimensions.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    pub(crate) fn invalid(
        argument: &'static str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Error::InvalidArgument {
            argument,
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}
