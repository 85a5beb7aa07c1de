//! Assembly of a complete nuclear spin system from physical parameters: the
//! spins themselves, the unperturbed Hamiltonian and the initial state.

use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    dynamics::{
        HBuild,
        HJCoupling,
        HQuadrupole,
        HZeeman,
        JCouplingParams,
        QuadrupoleParams,
        ZeemanParams,
        overlay,
    },
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ DensityMatrix, Observable, Operator, canonical_density_matrix },
    spin::NuclearSpin,
};

/// Description of the state a simulation starts from.
#[derive(Clone, Debug, PartialEq)]
pub enum InitialState {
    /// Thermal equilibrium with the unperturbed Hamiltonian at the given
    /// temperature, in K.
    Canonical { temperature: f64 },
    /// An explicit density matrix, validated on setup.
    Matrix(Operator),
    /// A single basis state `|k⟩⟨k|`, counting from `m = I` downward.
    BasisState(usize),
    /// A pure state vector, normalized on setup.
    Pure(nd::Array1<C64>),
}

impl Default for InitialState {
    fn default() -> Self { Self::Canonical { temperature: 300.0 } }
}

/// Parameters of a single nuclear spin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpinParams {
    pub quantum_number: f64,
    /// Gyromagnetic ratio over 2π, in MHz/T.
    pub gyro_ratio: f64,
    /// Quadrupole interaction of this spin, if any.
    pub quadrupole: Option<QuadrupoleParams>,
}

/// Everything needed to set up a [`NuclearSystem`].
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationParams {
    pub spins: Vec<SpinParams>,
    pub zeeman: ZeemanParams,
    pub j_coupling: Option<JCouplingParams>,
    pub initial_state: InitialState,
}

/// A spin system together with its unperturbed Hamiltonian and initial
/// state.
#[derive(Clone, Debug)]
pub struct NuclearSystem {
    pub system: SpinSystem,
    /// Individual terms of the unperturbed Hamiltonian: Zeeman, then
    /// quadrupole, then J-coupling (the last two only if present).
    pub h_terms: Vec<Observable>,
    /// Sum of `h_terms`.
    pub h_unperturbed: Observable,
    pub initial_state: DensityMatrix,
}

fn initial_density_matrix(state: &InitialState, h0: &Observable)
    -> Result<DensityMatrix>
{
    let d = h0.dim();
    match state {
        InitialState::Canonical { temperature }
            => canonical_density_matrix(h0, *temperature),
        InitialState::Matrix(op) => {
            if op.dim() != d {
                return Err(Error::DimensionMismatch(d, op.dim()));
            }
            DensityMatrix::new(op.clone())
        },
        InitialState::BasisState(k) => DensityMatrix::basis_state(d, *k),
        InitialState::Pure(psi) => {
            if psi.len() != d {
                return Err(Error::DimensionMismatch(d, psi.len()));
            }
            let norm: f64 = psi.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
            if !(norm > 0.0 && norm.is_finite()) {
                return Err(Error::invalid("pure state", "vector must have finite, nonzero norm"));
            }
            DensityMatrix::from_pure(&psi.mapv(|a| a / norm))
        },
    }
}

/// Build the spin system, the terms of its unperturbed Hamiltonian, and the
/// initial density matrix described by `params`.
pub fn nuclear_system_setup(params: &SimulationParams) -> Result<NuclearSystem> {
    let spins: Vec<NuclearSpin>
        = params.spins.iter()
        .map(|s| NuclearSpin::new(s.quantum_number, s.gyro_ratio))
        .collect::<Result<_>>()?;
    let system = SpinSystem::new(spins)?;

    let mut h_terms: Vec<Observable> = Vec::with_capacity(3);
    let zeeman = HZeeman::new_builder(&system, params.zeeman)?;
    h_terms.extend(zeeman.build_static());
    let quad_params: Vec<Option<QuadrupoleParams>>
        = params.spins.iter().map(|s| s.quadrupole).collect();
    if quad_params.iter().any(Option::is_some) {
        let quadrupole = HQuadrupole::new_builder(&system, quad_params)?;
        h_terms.extend(quadrupole.build_static());
    }
    if let Some(j) = params.j_coupling.as_ref() {
        let coupling = HJCoupling::new_builder(&system, j.clone())?;
        h_terms.extend(coupling.build_static());
    }
    let h_unperturbed
        = overlay(&h_terms)
        .map_or_else(|| Observable::identity(system.dim()).map(|id| id.scaled(0.0)), Ok)?;
    let initial_state = initial_density_matrix(&params.initial_state, &h_unperturbed)?;
    debug!(
        spins = system.len(),
        dim = system.dim(),
        terms = h_terms.len(),
        initial_state = ?params.initial_state,
        "nuclear system setup"
    );
    Ok(NuclearSystem { system, h_terms, h_unperturbed, initial_state })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{ FRAC_PI_2, PI };
    use approx::assert_relative_eq;
    use crate::{
        dynamics::PulseMode,
        evolution::{ EvolutionParams, Picture, Pulse, RrfParams, evolve },
        operator::tests::assert_close,
        spectrum::power_absorption_spectrum,
    };

    fn spin_three_halves(initial_state: InitialState) -> SimulationParams {
        SimulationParams {
            spins: vec![
                SpinParams { quantum_number: 1.5, gyro_ratio: 1.0, quadrupole: None },
            ],
            zeeman: ZeemanParams { field: 10.0, theta: 0.0, phi: 0.0 },
            j_coupling: None,
            initial_state,
        }
    }

    #[test]
    fn pure_zeeman_rrf_end_to_end() {
        let params = spin_three_halves(InitialState::Canonical { temperature: 1e-4 });
        let NuclearSystem { system, h_unperturbed, initial_state, .. }
            = nuclear_system_setup(&params).unwrap();
        assert_eq!(system.dim(), 4);

        let spectrum = power_absorption_spectrum(&system, &h_unperturbed, None, true)
            .unwrap();
        assert_eq!(spectrum.len(), 6);
        let lines: Vec<(f64, f64)>
            = spectrum.iter().filter(|(_, p)| *p > 1e-10).collect();
        assert_eq!(lines.len(), 3);
        for (nu, _) in lines {
            assert_relative_eq!(nu, 10.0, epsilon = 1e-9);
        }

        let mode = PulseMode {
            frequency: 10.0, amplitude: 1.0, phase: 0.0, theta: FRAC_PI_2, phi: 0.0,
        };
        let pulse = Pulse::new(vec![mode], 20.0);
        let evolution = EvolutionParams {
            picture: Picture::RotatingFrame(RrfParams { nu: 10.0, theta: PI, phi: 0.0 }),
            ..EvolutionParams::default()
        };
        let evolved = evolve(&system, &h_unperturbed, &initial_state, &pulse, &evolution)
            .unwrap();
        assert!(DensityMatrix::new(evolved.as_operator().clone()).is_ok());
        assert_relative_eq!(evolved.trace().re, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn initial_state_kinds() {
        let basis = nuclear_system_setup(&spin_three_halves(InitialState::BasisState(2)))
            .unwrap();
        assert_close(&basis.initial_state, &DensityMatrix::basis_state(4, 2).unwrap());

        let psi = nd::array![C64::from(2.0), C64::from(0.0), C64::from(0.0), C64::from(0.0)];
        let pure = nuclear_system_setup(&spin_three_halves(InitialState::Pure(psi)))
            .unwrap();
        assert_close(&pure.initial_state, &DensityMatrix::basis_state(4, 0).unwrap());

        let short = nd::array![C64::from(1.0), C64::from(0.0)];
        assert!(matches!(
            nuclear_system_setup(&spin_three_halves(InitialState::Pure(short))),
            Err(Error::DimensionMismatch(4, 2)),
        ));

        let not_a_state = Operator::identity(4).unwrap();
        assert!(matches!(
            nuclear_system_setup(&spin_three_halves(InitialState::Matrix(not_a_state))),
            Err(Error::InvalidDensityMatrix(_)),
        ));
    }

    #[test]
    fn terms_follow_interactions() {
        let mut params = spin_three_halves(InitialState::default());
        params.spins.push(SpinParams { quantum_number: 0.5, gyro_ratio: 2.0, quadrupole: None });
        params.spins[0].quadrupole = Some(QuadrupoleParams {
            coupling: 2.0, asymmetry: 0.1, alpha: 0.0, beta: 0.3, gamma: 0.0,
        });
        params.j_coupling = Some(JCouplingParams {
            matrix: nd::array![[0.0, 0.2], [0.0, 0.0]],
            kind: Default::default(),
        });
        let setup = nuclear_system_setup(&params).unwrap();
        assert_eq!(setup.system.dim(), 8);
        assert_eq!(setup.h_terms.len(), 3);
        let sum = setup.h_terms.iter()
            .fold(Operator::zeros(8), |acc, h| acc + h);
        assert_close(&setup.h_unperturbed, &sum);
    }

    #[test]
    fn invalid_spin_fails() {
        let mut params = spin_three_halves(InitialState::default());
        params.spins[0].quantum_number = 0.7;
        assert!(matches!(
            nuclear_system_setup(&params),
            Err(Error::InvalidQuantumNumber(_)),
        ));
    }
}
