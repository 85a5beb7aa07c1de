//! Interaction of nuclear magnetic moments with a static magnetic field.

use crate::{
    dynamics::hamiltonians::{ HBuild, projected_total },
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::Observable,
};

/// Static field parameters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZeemanParams {
    /// Field magnitude `B_0`, in T.
    pub field: f64,
    /// Polar angle of the field direction.
    pub theta: f64,
    /// Azimuthal angle of the field direction.
    pub phi: f64,
}

/// Builder for the Zeeman Hamiltonian
/// ```math
/// H_Z = -B_0 \sum_k \frac{\gamma_k}{2\pi} \left(
///     \sin\theta \cos\phi I_x^k + \sin\theta \sin\phi I_y^k + \cos\theta I_z^k
/// \right)
/// ```
#[derive(Clone, Debug)]
pub struct HZeeman {
    params: ZeemanParams,
    h: Observable,
}

impl HZeeman {
    /// Return the field parameters.
    pub fn params(&self) -> ZeemanParams { self.params }
}

impl HBuild for HZeeman {
    type Params = ZeemanParams;

    fn new_builder(system: &SpinSystem, params: ZeemanParams) -> Result<Self> {
        if !(params.field >= 0.0 && params.field.is_finite()) {
            return Err(Error::invalid(
                "field magnitude",
                format!("must be finite and non-negative, got {}", params.field),
            ));
        }
        let h = projected_total(
            system, params.theta, params.phi, |gamma| -gamma * params.field);
        Ok(Self { params, h })
    }

    fn build_static(&self) -> Option<Observable> { Some(self.h.clone()) }

    fn build_at(&self, _t: f64) -> Observable { self.h.clone() }

    fn dim(&self) -> usize { self.h.dim() }
}
