//! Physical constants and numerical tolerances.

// Planck constant [J s]
pub const PLANCK: f64 = 6.62607015e-34;

// Boltzmann constant [J / K]
pub const BOLTZMANN: f64 = 1.380649e-23;

// frequencies and energies are expressed in MHz throughout [Hz / MHz]
pub const MHZ: f64 = 1e6;

/// Tolerance used in the validation of [`Observable`][crate::Observable]s and
/// [`DensityMatrix`][crate::DensityMatrix]s.
///
/// All three checks are absolute: the largest elementwise deviation from the
/// adjoint, the deviation of the trace from 1, and the most negative
/// eigenvalue.
pub const EPSILON: f64 = 1e-10;
