//! Density matrices and thermal equilibrium states.

use std::{ f64::consts::TAU, ops::Deref };
use ndarray as nd;
use ndarray_linalg::{ EigVals, EigValsh, UPLO };
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    constants::{ BOLTZMANN, EPSILON, MHZ, PLANCK },
    error::{ Error, Result, StateProperty },
    hilbert::outer_prod,
    operator::{ Observable, Operator, spectral },
};

/// An [`Operator`] that is Hermitian, has unit trace, and is positive
/// semidefinite, all within [`EPSILON`].
#[derive(Clone, Debug, PartialEq)]
pub struct DensityMatrix(Operator);

impl AsRef<Operator> for DensityMatrix {
    fn as_ref(&self) -> &Operator { &self.0 }
}

impl Deref for DensityMatrix {
    type Target = Operator;

    fn deref(&self) -> &Operator { &self.0 }
}

impl From<DensityMatrix> for Operator {
    fn from(rho: DensityMatrix) -> Operator { rho.0 }
}

impl TryFrom<Operator> for DensityMatrix {
    type Error = Error;

    fn try_from(op: Operator) -> Result<Self> { Self::new(op) }
}

/// Return the density-matrix properties that `op` lacks.
pub fn missing_properties(op: &Operator) -> Result<Vec<StateProperty>> {
    let mut missing: Vec<StateProperty> = Vec::new();
    let hermitian = op.is_hermitian();
    if !hermitian {
        missing.push(StateProperty::Hermitian);
    }
    if (op.trace() - 1.0).norm() > EPSILON {
        missing.push(StateProperty::UnitTrace);
    }
    let min_eig: f64
        = if hermitian {
            op.matrix.eigvalsh(UPLO::Lower)?
                .into_iter()
                .fold(f64::INFINITY, f64::min)
        } else {
            op.matrix.eigvals()?
                .into_iter()
                .map(|w| w.re)
                .fold(f64::INFINITY, f64::min)
        };
    if min_eig < -EPSILON {
        missing.push(StateProperty::PositiveSemidefinite);
    }
    Ok(missing)
}

impl DensityMatrix {
    /// Create a new `DensityMatrix`, failing with the list of missing
    /// properties if `op` is not a valid state.
    pub fn new(op: Operator) -> Result<Self> {
        let missing = missing_properties(&op)?;
        if missing.is_empty() {
            Ok(Self(op))
        } else {
            Err(Error::InvalidDensityMatrix(missing))
        }
    }

    /// Create a new `DensityMatrix` from a square array.
    pub fn from_array(matrix: nd::Array2<C64>) -> Result<Self> {
        Self::new(Operator::new(matrix)?)
    }

    /// Create the projector onto the `k`-th basis state of a `d`-dimensional
    /// space.
    pub fn basis_state(d: usize, k: usize) -> Result<Self> {
        if k >= d {
            return Err(Error::invalid(
                "basis index", format!("{} is out of range for dimension {}", k, d)));
        }
        let mut op = Operator::zeros(d);
        op.matrix[[k, k]] = C64::from(1.0);
        Ok(Self(op))
    }

    /// Create the projector onto the (normalised) pure state `psi`.
    pub fn from_pure(psi: &nd::Array1<C64>) -> Result<Self> {
        let norm: f64 = psi.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        if psi.is_empty() || !norm.is_finite() || norm == 0.0 {
            return Err(Error::invalid("state vector", "must have finite, nonzero norm"));
        }
        let psi: nd::Array1<C64> = psi / C64::from(norm);
        Self::new(Operator::new(outer_prod(&psi, &psi))?)
    }

    /// Create the maximally mixed state `I / d`.
    pub fn maximally_mixed(d: usize) -> Result<Self> {
        Ok(Self(Operator::identity(d)? / d as f64))
    }

    /// Return a reference to the underlying [`Operator`].
    pub fn as_operator(&self) -> &Operator { &self.0 }

    /// Strip the density-matrix tag.
    pub fn into_operator(self) -> Operator { self.0 }

    /// Return the diagonal elements (real parts).
    pub fn populations(&self) -> nd::Array1<f64> {
        self.0.matrix.diag().mapv(|p| p.re)
    }

    /// Return `true` if `self` is proportional to the identity.
    pub fn is_maximally_mixed(&self) -> bool {
        let d = self.dim();
        self.0.max_abs_diff(&(Operator::eye(d) / d as f64)) <= EPSILON
    }

    /// Compute `U ρ U^†` and validate the result.
    pub fn transformed(&self, U: &Operator) -> Result<Self> {
        let rho = U.checked_mul(&self.0)?.checked_mul(&U.dagger())?;
        Self::new(rho)
    }

    /// Evolve freely under the time-independent Hamiltonian `h` (in MHz) for
    /// a time `t` (in μs).
    pub fn free_evolution(&self, h: &Observable, t: f64) -> Result<Self> {
        let U = (h.as_operator() * C64::new(0.0, -TAU * t)).exp()?;
        self.transformed(&U)
    }
}

/// Compute the thermal equilibrium state `exp(-h H / k_B T) / Z` for a
/// Hamiltonian `h` in MHz at temperature `temperature` in K.
///
/// The exponential is taken in the eigenbasis of `h` with the ground energy
/// shifted to zero, so arbitrarily low temperatures are safe.
pub fn canonical_density_matrix(h: &Observable, temperature: f64)
    -> Result<DensityMatrix>
{
    if !(temperature > 0.0 && temperature.is_finite()) {
        return Err(Error::invalid(
            "temperature", format!("must be positive and finite, got {}", temperature)));
    }
    let beta: f64 = PLANCK * MHZ / (BOLTZMANN * temperature);
    let (w, V) = h.diagonalisation()?;
    let w0: f64 = w.iter().copied().fold(f64::INFINITY, f64::min);
    let boltz: nd::Array1<f64> = w.mapv(|wk| (-beta * (wk - w0)).exp());
    let Z: f64 = boltz.sum();
    debug!(temperature, beta, partition = Z, "canonical state");
    let p: nd::Array1<C64> = boltz.mapv(|b| C64::from(b / Z));
    let rho = Operator::from_matrix_unchecked(spectral(V.matrix(), &p));
    DensityMatrix::new(rho.hermitian_part())
}
