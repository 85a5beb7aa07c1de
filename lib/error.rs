//! Error types shared across the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// One of the defining properties of a density matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StateProperty {
    /// The matrix equals its own conjugate transpose.
    Hermitian,
    /// The trace of the matrix is equal to 1.
    UnitTrace,
    /// No eigenvalue of the matrix is negative.
    PositiveSemidefinite,
}

impl fmt::Display for StateProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hermitian => write!(f, "hermitianity"),
            Self::UnitTrace => write!(f, "unit trace"),
            Self::PositiveSemidefinite => write!(f, "positivity"),
        }
    }
}

fn list_properties(props: &[StateProperty]) -> String {
    props.iter()
        .map(|p| p.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Input to an operator constructor was not a 2D square array.
    #[error("an operator must be initialised with a 2D square array; got shape {0:?}")]
    NotSquare(Vec<usize>),

    /// Two operands have incompatible dimensions.
    #[error("dimension mismatch: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    /// An array element could not be interpreted as a finite complex number.
    #[error("element at {index:?} cannot be interpreted as a complex number: {found}")]
    NotComplex { index: (usize, usize), found: String },

    /// A computation produced infinite or NaN matrix elements.
    #[error("{0} produced non-finite matrix elements")]
    NonFinite(&'static str),

    /// Input of a kind that cannot describe an operator.
    #[error("unsupported input type: {0}")]
    UnsupportedType(String),

    /// The input array is not Hermitian.
    #[error("the input array is not hermitian")]
    NotHermitian,

    /// The input array lacks one or more of the density-matrix properties.
    #[error("the input array lacks the following properties: {}", list_properties(.0))]
    InvalidDensityMatrix(Vec<StateProperty>),

    /// Failure inside a LAPACK-backed routine, e.g. inverting a singular
    /// matrix.
    #[error("linear algebra error: {0}")]
    LinearAlgebra(#[from] ndarray_linalg::error::LinalgError),

    /// A required field is missing from a parameter bundle.
    #[error("missing required parameter `{0}`")]
    MissingKey(String),

    /// A parameter-bundle field has the wrong type.
    #[error("parameter `{key}` should be {expected}")]
    WrongType { key: String, expected: &'static str },

    /// Spin quantum numbers must be non-negative half-integers.
    #[error("invalid spin quantum number {0}: must be a non-negative multiple of 1/2")]
    InvalidQuantumNumber(f64),

    /// Evolution durations must be finite and non-negative.
    #[error("invalid evolution duration {0}: must be finite and non-negative")]
    NegativeDuration(f64),

    /// Unknown name for an evolution picture.
    #[error("unknown picture `{0}`: expected \"IP\" or \"RRF\"")]
    UnknownPicture(String),

    /// A physical parameter lies outside its allowed range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A parameter bundle could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Error {
    /// Return the list of density-matrix properties that failed validation,
    /// if `self` is [`Error::InvalidDensityMatrix`].
    pub fn missing_properties(&self) -> Option<&[StateProperty]> {
        match self {
            Self::InvalidDensityMatrix(props) => Some(props.as_slice()),
            _ => None,
        }
    }

    pub(crate) fn invalid<S>(name: &'static str, reason: S) -> Self
    where S: Into<String>
    {
        Self::InvalidParameter { name, reason: reason.into() }
    }
}
