//! Hamiltonians of nuclear spin systems and associated numerical utilities.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;

pub mod hamiltonians;
pub use hamiltonians::{
    coupling::{ CouplingKind, HJCoupling, JCouplingParams },
    pulse::{ HPulse, PulseMode },
    quadrupole::{ EfgComponents, HQuadrupole, QuadrupoleParams, quadrupole_single },
    zeeman::{ HZeeman, ZeemanParams },
    HBuild,
    overlay,
};

/// Compute the integral of `y` sampled at uniform step size `dx` using the
/// trapezoidal rule.
pub(crate) fn trapz(y: &[C64], dx: f64) -> C64 {
    if y.len() < 2 { return C64::zero(); }
    let inner: C64 = y[1..y.len() - 1].iter().sum();
    (inner + (y[0] + y[y.len() - 1]) / 2.0) * dx
}

/// Return `n` evenly spaced points over `[a, b]`, including both endpoints.
///
/// `n == 1` gives `[a]`.
pub(crate) fn linspace(a: f64, b: f64, n: usize) -> nd::Array1<f64> {
    match n {
        0 => nd::Array1::zeros(0),
        1 => nd::array![a],
        _ => nd::Array1::linspace(a, b, n),
    }
}
