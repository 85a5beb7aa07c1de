//! Indirect spin-spin (J) coupling.

use ndarray as nd;
use crate::{
    dynamics::hamiltonians::HBuild,
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ Observable, Operator },
    spin::Component,
};

/// Form of the pairwise coupling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum CouplingKind {
    /// `J I_z^n I_z^m`
    #[default]
    Secular,
    /// `J I^n · I^m`
    Isotropic,
}

/// J-coupling constants, in MHz.
///
/// Only the strict upper triangle of `matrix` is read: the coupling between
/// spins `n < m` is `matrix[[n, m]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct JCouplingParams {
    pub matrix: nd::Array2<f64>,
    pub kind: CouplingKind,
}

/// Builder for the J-coupling Hamiltonian
/// ```math
/// H_J = \sum_{n < m} J_{nm} I_z^n I_z^m
/// ```
/// or its isotropic counterpart.
#[derive(Clone, Debug)]
pub struct HJCoupling {
    params: JCouplingParams,
    h: Observable,
}

impl HJCoupling {
    /// Return the coupling parameters.
    pub fn params(&self) -> &JCouplingParams { &self.params }
}

impl HBuild for HJCoupling {
    type Params = JCouplingParams;

    fn new_builder(system: &SpinSystem, params: JCouplingParams) -> Result<Self> {
        let n = system.len();
        let (r, c) = params.matrix.dim();
        if r != n || c != n {
            return Err(Error::DimensionMismatch(n, r.max(c)));
        }
        if params.matrix.iter().any(|j| !j.is_finite()) {
            return Err(Error::invalid("j coupling", "couplings must be finite"));
        }
        let comps: &[Component]
            = match params.kind {
                CouplingKind::Secular => &[Component::Z],
                CouplingKind::Isotropic => &[Component::X, Component::Y, Component::Z],
            };
        let mut acc = Operator::zeros(system.dim());
        for (a, b) in system.pairs() {
            let j = params.matrix[[a, b]];
            if j == 0.0 { continue; }
            for comp in comps {
                let ia = system.component(a, *comp)?;
                let ib = system.component(b, *comp)?;
                acc = acc + (ia * ib) * j;
            }
        }
        Ok(Self { params, h: Observable::hermitian_part_of(&acc) })
    }

    fn build_static(&self) -> Option<Observable> { Some(self.h.clone()) }

    fn build_at(&self, _t: f64) -> Observable { self.h.clone() }

    fn dim(&self) -> usize { self.h.dim() }
}
