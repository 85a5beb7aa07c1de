//! Hamiltonian builders for nuclear spin systems.
//!
//! All Hamiltonians are in units of MHz (i.e. `H / h`); time is in μs.

use ndarray as nd;
use crate::{
    error::Result,
    hilbert::SpinSystem,
    operator::{ Observable, observable::sum_observables },
    spin::Component,
};

pub mod zeeman;
pub use zeeman::{ HZeeman, ZeemanParams };

pub mod quadrupole;
pub use quadrupole::{ EfgComponents, HQuadrupole, QuadrupoleParams };

pub mod pulse;
pub use pulse::{ HPulse, PulseMode };

pub mod coupling;
pub use coupling::{ CouplingKind, HJCoupling, JCouplingParams };

/// Basic requirements for any Hamiltonian builder.
pub trait HBuild {
    /// Initialization data type.
    type Params;

    /// Initialize `self` for a given spin system.
    fn new_builder(system: &SpinSystem, params: Self::Params) -> Result<Self>
    where Self: Sized;

    /// Build a time-independent Hamiltonian, if possible.
    fn build_static(&self) -> Option<Observable>;

    /// Build the Hamiltonian at a given time.
    fn build_at(&self, t: f64) -> Observable;

    /// Build the Hamiltonian at each of a series of times.
    fn build(&self, time: &nd::Array1<f64>) -> Vec<Observable> {
        time.iter().map(|t| self.build_at(*t)).collect()
    }

    /// Return the dimension of the Hilbert space acted upon.
    fn dim(&self) -> usize;
}

/// Return the unit vector `(sinθ cosφ, sinθ sinφ, cosθ)`.
pub(crate) fn unit_vector(theta: f64, phi: f64) -> [f64; 3] {
    [theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()]
}

/// Compute `Σ_k c_k (n · I^k)` for per-spin weights `c_k = weight(spin)` and
/// a unit vector `n` given by spherical angles.
pub(crate) fn projected_total<F>(system: &SpinSystem, theta: f64, phi: f64, weight: F)
    -> Observable
where F: Fn(f64) -> f64
{
    let [nx, ny, nz] = unit_vector(theta, phi);
    let op = system.sum_embedded(|spin| {
        let c = weight(spin.gyro_ratio());
        spin.operator(Component::X) * (c * nx)
            + spin.operator(Component::Y) * (c * ny)
            + spin.operator(Component::Z) * (c * nz)
    });
    Observable::hermitian_part_of(&op)
}

/// Sum a series of time-independent terms into a single Hamiltonian.
///
/// Returns `None` if `terms` is empty.
pub fn overlay(terms: &[Observable]) -> Option<Observable> {
    sum_observables(terms)
}
