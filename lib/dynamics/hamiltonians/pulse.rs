//! Interaction with a (possibly multi-mode) linearly polarized radio-frequency
//! pulse.

use std::f64::consts::TAU;
use crate::{
    dynamics::hamiltonians::{ HBuild, projected_total },
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ Observable, Operator },
};

/// A single monochromatic component of a pulse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PulseMode {
    /// Carrier frequency, in MHz.
    pub frequency: f64,
    /// Field amplitude `B_1`, in T.
    pub amplitude: f64,
    /// Carrier phase at the start of the pulse, in radians.
    pub phase: f64,
    /// Polar angle of the polarization direction.
    pub theta: f64,
    /// Azimuthal angle of the polarization direction.
    pub phi: f64,
}

impl PulseMode {
    /// Return a mode with zero amplitude.
    pub fn null() -> Self {
        Self { frequency: 0.0, amplitude: 0.0, phase: 0.0, theta: 0.0, phi: 0.0 }
    }

    fn check(&self) -> Result<()> {
        if !(self.frequency >= 0.0 && self.frequency.is_finite()) {
            return Err(Error::invalid(
                "frequency", format!("must be finite and non-negative, got {}", self.frequency)));
        }
        let named = [
            ("amplitude", self.amplitude),
            ("phase", self.phase),
            ("theta_p", self.theta),
            ("phi_p", self.phi),
        ];
        match named.into_iter().find(|(_, x)| !x.is_finite()) {
            Some((name, x)) => Err(Error::invalid(name, format!("must be finite, got {}", x))),
            None => Ok(()),
        }
    }
}

/// Builder for the pulse Hamiltonian
/// ```math
/// H_p(t) = -\sum_{\text{modes}} B_1 \cos(2\pi f t + \varphi)
///     \sum_k \frac{\gamma_k}{2\pi} (\vec{n}_p \cdot \vec{I}^k)
/// ```
/// where `t` is measured from the start of the pulse.
#[derive(Clone, Debug)]
pub struct HPulse {
    modes: Vec<PulseMode>,
    // −B₁ (n_p · Σ γ_k I^k) for each mode
    couplings: Vec<Observable>,
    dim: usize,
}

impl HPulse {
    /// Return the pulse modes.
    pub fn modes(&self) -> &[PulseMode] { &self.modes }

    fn is_static(&self) -> bool {
        self.modes.iter().all(|m| m.amplitude == 0.0 || m.frequency == 0.0)
    }
}

impl HBuild for HPulse {
    type Params = Vec<PulseMode>;

    fn new_builder(system: &SpinSystem, modes: Vec<PulseMode>) -> Result<Self> {
        modes.iter().try_for_each(|m| m.check())?;
        let couplings: Vec<Observable>
            = modes.iter()
            .map(|m| projected_total(system, m.theta, m.phi, |gamma| -gamma * m.amplitude))
            .collect();
        Ok(Self { modes, couplings, dim: system.dim() })
    }

    fn build_static(&self) -> Option<Observable> {
        self.is_static().then(|| self.build_at(0.0))
    }

    fn build_at(&self, t: f64) -> Observable {
        let h = self.modes.iter().zip(&self.couplings)
            .fold(Operator::zeros(self.dim), |acc, (mode, coupling)| {
                let c = (TAU * mode.frequency * t + mode.phase).cos();
                acc + coupling.as_operator() * c
            });
        Observable::hermitian_part_of(&h)
    }

    fn dim(&self) -> usize { self.dim }
}
