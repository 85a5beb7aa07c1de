//! Interaction of nuclear electric quadrupole moments with the electric field
//! gradient (EFG) at the nucleus.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    dynamics::hamiltonians::HBuild,
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ Observable, Operator },
    spin::{ Component, NuclearSpin },
};

/// Quadrupole parameters for a single spin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadrupoleParams {
    /// Coupling constant `e²qQ / h`, in MHz.
    pub coupling: f64,
    /// Asymmetry parameter `η` of the EFG, in `[0, 1]`.
    pub asymmetry: f64,
    /// Euler angles of the EFG principal axes with respect to the lab frame.
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

/// Spherical components of the EFG tensor in the lab frame, normalised to
/// `eq` and scaled such that the quadrupole Hamiltonian reads
/// ```math
/// H_Q = \frac{e^2 q Q}{4 I (2 I - 1)} \left[
///     \frac{1}{2} (3 I_z^2 - I (I + 1)) V_0
///     + \frac{\sqrt{6}}{4} \left(
///         \{I_z, I_+\} V_{-1} + \{I_z, I_-\} V_{+1} + I_+^2 V_{-2} + I_-^2 V_{+2}
///     \right)
/// \right]
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EfgComponents {
    pub v0: f64,
    /// `[V_{-1}, V_{+1}]`
    pub v1: [C64; 2],
    /// `[V_{-2}, V_{+2}]`
    pub v2: [C64; 2],
}

fn rot_z(a: f64) -> nd::Array2<f64> {
    let (s, c) = a.sin_cos();
    nd::array![[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
}

fn rot_y(b: f64) -> nd::Array2<f64> {
    let (s, c) = b.sin_cos();
    nd::array![[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]]
}

impl EfgComponents {
    /// Compute the EFG components for asymmetry `eta` and (z-y-z) Euler
    /// angles `(alpha, beta, gamma)` of the principal axis frame.
    pub fn new(eta: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        let R: nd::Array2<f64> = rot_z(alpha).dot(&rot_y(beta)).dot(&rot_z(gamma));
        let pas: nd::Array2<f64>
            = nd::Array2::from_diag(&nd::array![-(1.0 - eta) / 2.0, -(1.0 + eta) / 2.0, 1.0]);
        let v: nd::Array2<f64> = R.dot(&pas).dot(&R.t());
        let k = 4.0 / 6.0_f64.sqrt();
        let v0 = 2.0 * v[[2, 2]];
        let v1 = [
            k * C64::new(v[[0, 2]], -v[[1, 2]]),
            k * C64::new(v[[0, 2]], v[[1, 2]]),
        ];
        let d = (v[[0, 0]] - v[[1, 1]]) / 2.0;
        let v2 = [
            k * C64::new(d, -v[[0, 1]]),
            k * C64::new(d, v[[0, 1]]),
        ];
        Self { v0, v1, v2 }
    }
}

fn check_params(params: &QuadrupoleParams) -> Result<()> {
    if !(0.0..=1.0).contains(&params.asymmetry) {
        return Err(Error::invalid(
            "asymmetry parameter",
            format!("must lie in [0, 1], got {}", params.asymmetry),
        ));
    }
    let named = [
        ("coupling constant", params.coupling),
        ("alpha_q", params.alpha),
        ("beta_q", params.beta),
        ("gamma_q", params.gamma),
    ];
    match named.into_iter().find(|(_, x)| !x.is_finite()) {
        Some((name, x)) => Err(Error::invalid(name, format!("must be finite, got {}", x))),
        None => Ok(()),
    }
}

/// Compute the quadrupole Hamiltonian of a single spin, in its own space.
///
/// Identically zero for spins with `I < 1`.
pub fn quadrupole_single(spin: &NuclearSpin, params: &QuadrupoleParams)
    -> Result<Observable>
{
    check_params(params)?;
    let d = spin.dim();
    let halves = spin.total().halves();
    if halves < 2 {
        return Ok(Observable::zeros(d));
    }
    let i = spin.quantum_number();
    let pref = params.coupling / (4.0 * i * (2.0 * i - 1.0));
    let efg = EfgComponents::new(params.asymmetry, params.alpha, params.beta, params.gamma);

    let iz = spin.operator(Component::Z);
    let ip = spin.operator(Component::Raising);
    let im = spin.operator(Component::Lowering);
    let id = Operator::eye(d);

    let t0: Operator = (iz * iz * 3.0 - &id * (i * (i + 1.0))) * (0.5 * efg.v0);
    let t1: Operator
        = (iz * ip + ip * iz) * efg.v1[0]
        + (iz * im + im * iz) * efg.v1[1];
    let t2: Operator = ip * ip * efg.v2[0] + im * im * efg.v2[1];
    let h = (t0 + (t1 + t2) * (6.0_f64.sqrt() / 4.0)) * pref;
    Ok(Observable::hermitian_part_of(&h))
}

/// Builder for the quadrupole Hamiltonian of a spin system, with one optional
/// set of parameters per spin.
#[derive(Clone, Debug)]
pub struct HQuadrupole {
    params: Vec<Option<QuadrupoleParams>>,
    h: Observable,
}

impl HQuadrupole {
    /// Return the per-spin parameters.
    pub fn params(&self) -> &[Option<QuadrupoleParams>] { &self.params }
}

impl HBuild for HQuadrupole {
    type Params = Vec<Option<QuadrupoleParams>>;

    fn new_builder(system: &SpinSystem, params: Self::Params) -> Result<Self> {
        if params.len() != system.len() {
            return Err(Error::DimensionMismatch(system.len(), params.len()));
        }
        let n = system.dim();
        let mut acc = Operator::zeros(n);
        for (k, (spin, p)) in system.spins().iter().zip(&params).enumerate() {
            if let Some(p) = p {
                let hk = quadrupole_single(spin, p)?;
                acc = acc + system.embed(k, &hk)?;
            }
        }
        Ok(Self { params, h: Observable::hermitian_part_of(&acc) })
    }

    fn build_static(&self) -> Option<Observable> { Some(self.h.clone()) }

    fn build_at(&self, _t: f64) -> Observable { self.h.clone() }

    fn dim(&self) -> usize { self.h.dim() }
}
