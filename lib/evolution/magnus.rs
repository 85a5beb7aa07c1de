//! Terms of the Magnus expansion of the propagator generated by a sampled,
//! time-dependent Hamiltonian.
//!
//! For `U' = -i2π H(t) U`, the propagator over `[0, T]` is `U = exp(Ω)` with
//! `Ω = Ω₁ + Ω₂ + Ω₃ + ...`. Each term is approximated here by left-point
//! sums over the samples `H_0, ..., H_{N-2}` with uniform step `dt`; the last
//! sample only closes the interval. Every term is anti-Hermitian for
//! Hermitian input.

use std::f64::consts::TAU;
use num_complex::Complex64 as C64;
use crate::{
    operator::{ Observable, Operator, commutator },
};

/// Truncation order of the Magnus expansion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum MagnusOrder {
    First,
    #[default]
    Second,
    Third,
}

fn body(h: &[Observable]) -> &[Observable] {
    &h[..h.len().saturating_sub(1)]
}

/// Compute `Ω₁ = -i2π ∫ H(t) dt`.
///
/// *Panics* if `h` is empty or the samples' dimensions differ.
pub fn magnus_first(h: &[Observable], dt: f64) -> Operator {
    let d = h[0].dim();
    let sum = body(h).iter().fold(Operator::zeros(d), |acc, hk| acc + hk);
    sum * C64::new(0.0, -TAU * dt)
}

/// Compute `Ω₂ = -(2π)²/2 ∫∫_{t₂ < t₁} [H(t₁), H(t₂)] dt₂ dt₁`.
///
/// *Panics* if `h` is empty or the samples' dimensions differ.
pub fn magnus_second(h: &[Observable], dt: f64) -> Operator {
    let d = h[0].dim();
    let mut prefix = Operator::zeros(d);
    let mut acc = Operator::zeros(d);
    for hk in body(h) {
        acc = acc + commutator(hk, &prefix);
        prefix = prefix + hk;
    }
    acc * (-TAU.powi(2) / 2.0 * dt.powi(2))
}

/// Compute
/// `Ω₃ = i(2π)³/6 ∫∫∫_{t₃ < t₂ < t₁} ([H₁, [H₂, H₃]] + [H₃, [H₂, H₁]])`.
///
/// Quadratic in the number of samples.
///
/// *Panics* if `h` is empty or the samples' dimensions differ.
pub fn magnus_third(h: &[Observable], dt: f64) -> Operator {
    let d = h[0].dim();
    let h = body(h);
    // prefix[j] = Σ_{k ≤ j} H_k
    let mut prefix: Vec<Operator> = Vec::with_capacity(h.len());
    let mut run = Operator::zeros(d);
    for hk in h {
        run = run + hk;
        prefix.push(run.clone());
    }
    let mut acc = Operator::zeros(d);
    for (i, hi) in h.iter().enumerate() {
        for (hj, pj) in h.iter().zip(&prefix).take(i + 1) {
            acc = acc
                + commutator(hi, &commutator(hj, pj))
                + commutator(pj, &commutator(hj, hi));
        }
    }
    acc * C64::new(0.0, TAU.powi(3) / 6.0 * dt.powi(3))
}

/// Sum the Magnus expansion up to `order`.
///
/// *Panics* if `h` is empty or the samples' dimensions differ.
pub fn magnus_expansion(h: &[Observable], dt: f64, order: MagnusOrder) -> Operator {
    let mut omega = magnus_first(h, dt);
    if matches!(order, MagnusOrder::Second | MagnusOrder::Third) {
        omega = omega + magnus_second(h, dt);
    }
    if matches!(order, MagnusOrder::Third) {
        omega = omega + magnus_third(h, dt);
    }
    omega
}
