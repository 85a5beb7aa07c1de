//! Time evolution of density matrices under pulse sequences.
//!
//! Each pulse is simulated in a frame rotating under a time-independent
//! generator `F` (the unperturbed Hamiltonian in the interaction picture, or
//! a user-defined rotating reference frame). The Hamiltonian in the new frame
//! is sampled over the pulse duration and exponentiated through a truncated
//! Magnus expansion, and the resulting state is cast back to the lab frame.

use std::f64::consts::TAU;
use num_complex::Complex64 as C64;
use tracing::{ debug, trace };
use crate::{
    constants::EPSILON,
    dynamics::{ HBuild, HPulse, PulseMode, hamiltonians::projected_total, linspace },
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ DensityMatrix, Observable, Operator },
};

pub mod magnus;
pub use magnus::{
    MagnusOrder,
    magnus_expansion,
    magnus_first,
    magnus_second,
    magnus_third,
};

/// Parameters of a rotating reference frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RrfParams {
    /// Rotation frequency, in MHz.
    pub nu: f64,
    /// Polar angle of the rotation axis.
    pub theta: f64,
    /// Azimuthal angle of the rotation axis.
    pub phi: f64,
}

/// Frame in which evolution is computed.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Picture {
    /// Interaction picture, rotating with the unperturbed Hamiltonian.
    #[default]
    Interaction,
    /// Rotating reference frame.
    RotatingFrame(RrfParams),
}

impl Picture {
    /// Parse a picture from its short name, `"IP"` or `"RRF"`.
    ///
    /// `"RRF"` requires frame parameters.
    pub fn from_name(name: &str, rrf: Option<RrfParams>) -> Result<Self> {
        match name {
            "IP" => Ok(Self::Interaction),
            "RRF" => rrf.map(Self::RotatingFrame)
                .ok_or_else(|| Error::MissingKey("nu_RRF".to_string())),
            other => Err(Error::UnknownPicture(other.to_string())),
        }
    }
}

/// Number of sample points used to discretize the Hamiltonian of a pulse.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Sampling {
    /// Fixed number of points regardless of the pulse duration.
    Total(usize),
    /// Number of points per unit time (μs).
    PerUnitTime(f64),
}

impl Default for Sampling {
    fn default() -> Self { Self::PerUnitTime(100.0) }
}

impl Sampling {
    /// Return the number of points for a pulse of length `duration`; never
    /// fewer than 2.
    pub fn n_points(&self, duration: f64) -> usize {
        let n = match self {
            Self::Total(n) => *n,
            Self::PerUnitTime(rate) => (rate * duration).ceil().max(0.0) as usize,
        };
        n.max(2)
    }
}

/// Configuration shared by all steps of an evolution.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct EvolutionParams {
    pub picture: Picture,
    pub order: MagnusOrder,
    pub sampling: Sampling,
}

/// A single step of a sequence: a (possibly empty) set of simultaneous pulse
/// modes applied for a fixed duration.
#[derive(Clone, Debug, PartialEq)]
pub struct Pulse {
    pub modes: Vec<PulseMode>,
    /// Duration, in μs.
    pub duration: f64,
}

impl Pulse {
    /// Create a new pulse.
    pub fn new(modes: Vec<PulseMode>, duration: f64) -> Self {
        Self { modes, duration }
    }

    /// Create a step of free evolution.
    pub fn free(duration: f64) -> Self {
        Self { modes: Vec::new(), duration }
    }
}

/// An ordered series of pulses with shared evolution parameters.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PulseSequence {
    pub pulses: Vec<Pulse>,
    pub params: EvolutionParams,
}

/// Return the generator of a rotating reference frame,
/// `ν (I_z cosθ + sinθ (I_x cosφ + I_y sinφ))`, built from the total angular
/// momentum of `system`.
pub fn rrf_operator(system: &SpinSystem, params: &RrfParams) -> Observable {
    projected_total(system, params.theta, params.phi, |_| params.nu)
}

/// Return the frame generator `F` for `picture`.
pub fn frame_generator(system: &SpinSystem, h0: &Observable, picture: &Picture)
    -> Observable
{
    match picture {
        Picture::Interaction => h0.clone(),
        Picture::RotatingFrame(rrf) => rrf_operator(system, rrf),
    }
}

/// Compute the Hamiltonian in the frame generated by `frame` at time `t`:
/// `(H₀ + H_p(t))` cast into the frame, minus `frame`.
pub fn h_changed_picture(
    h0: &Observable,
    pulse: &HPulse,
    frame: &Observable,
    t: f64,
) -> Result<Observable>
{
    let total = h0.checked_add(&pulse.build_at(t))?;
    let h_cp = total.changed_picture(frame, t, false)?.checked_sub(frame)?;
    Ok(Observable::hermitian_part_of(&h_cp))
}

fn check_duration(duration: f64) -> Result<()> {
    if duration >= 0.0 && duration.is_finite() {
        Ok(())
    } else {
        Err(Error::NegativeDuration(duration))
    }
}

fn all_equal(h: &[Observable]) -> bool {
    let first = &h[0];
    let scale = first.max_abs().max(1.0);
    h.iter().all(|hk| hk.max_abs_diff(first) <= EPSILON * scale)
}

/// Compute the propagator over `[0, duration]` in the changed picture from
/// Hamiltonian samples.
fn propagator(h: &[Observable], duration: f64, order: MagnusOrder)
    -> Result<Operator>
{
    if all_equal(h) {
        trace!("time-independent generator; using exact exponential");
        return (h[0].as_operator() * C64::new(0.0, -TAU * duration)).exp();
    }
    let dt = duration / (h.len() - 1) as f64;
    magnus_expansion(h, dt, order).anti_hermitian_part().exp()
}

/// Evolve `rho` through a single pulse under unperturbed Hamiltonian `h0`.
///
/// A zero duration or a maximally mixed state returns `rho` unchanged.
pub fn evolve(
    system: &SpinSystem,
    h0: &Observable,
    rho: &DensityMatrix,
    pulse: &Pulse,
    params: &EvolutionParams,
) -> Result<DensityMatrix>
{
    check_duration(pulse.duration)?;
    if h0.dim() != system.dim() {
        return Err(Error::DimensionMismatch(system.dim(), h0.dim()));
    }
    if rho.dim() != system.dim() {
        return Err(Error::DimensionMismatch(system.dim(), rho.dim()));
    }
    if pulse.duration == 0.0 || rho.is_maximally_mixed() {
        return Ok(rho.clone());
    }
    let h_pulse = HPulse::new_builder(system, pulse.modes.clone())?;
    let frame = frame_generator(system, h0, &params.picture);
    let n = params.sampling.n_points(pulse.duration);
    debug!(
        duration = pulse.duration,
        n_points = n,
        modes = pulse.modes.len(),
        order = ?params.order,
        picture = ?params.picture,
        "evolving pulse"
    );
    let h: Vec<Observable>
        = linspace(0.0, pulse.duration, n).iter()
        .map(|t| h_changed_picture(h0, &h_pulse, &frame, *t))
        .collect::<Result<_>>()?;
    let U = propagator(&h, pulse.duration, params.order)?;
    let rho_cp = U.checked_mul(rho)?.checked_mul(&U.dagger())?;
    let rho_lab = rho_cp.changed_picture(&frame, pulse.duration, true)?;
    DensityMatrix::new(rho_lab)
}

/// A state recorded after a step of a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceStep {
    /// Cumulative time at the end of the step, in μs.
    pub time: f64,
    pub state: DensityMatrix,
}

/// Evolve `rho` through every pulse of `sequence` in order, recording the
/// state after each.
pub fn evolve_sequence(
    system: &SpinSystem,
    h0: &Observable,
    rho: &DensityMatrix,
    sequence: &PulseSequence,
) -> Result<Vec<SequenceStep>>
{
    let mut steps: Vec<SequenceStep> = Vec::with_capacity(sequence.pulses.len());
    let mut state = rho.clone();
    let mut time: f64 = 0.0;
    for (k, pulse) in sequence.pulses.iter().enumerate() {
        debug!(step = k, start = time, "sequence step");
        state = evolve(system, h0, &state, pulse, &sequence.params)?;
        time += pulse.duration;
        steps.push(SequenceStep { time, state: state.clone() });
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{ FRAC_PI_2, PI };
    use approx::assert_relative_eq;
    use rand::{ SeedableRng, rngs::StdRng };
    use crate::{
        dynamics::{ HZeeman, ZeemanParams, HJCoupling, JCouplingParams, CouplingKind },
        operator::{ random_density_matrix, tests::assert_close },
        spin::{ Component, NuclearSpin },
    };

    fn zeeman(system: &SpinSystem, field: f64) -> Observable {
        let params = ZeemanParams { field, theta: 0.0, phi: 0.0 };
        HZeeman::new_builder(system, params).unwrap().build_static().unwrap()
    }

    fn x_pulse(frequency: f64, amplitude: f64, duration: f64) -> Pulse {
        let mode = PulseMode {
            frequency, amplitude, phase: 0.0, theta: FRAC_PI_2, phi: 0.0,
        };
        Pulse::new(vec![mode], duration)
    }

    #[test]
    fn picture_names() {
        assert_eq!(Picture::from_name("IP", None).unwrap(), Picture::Interaction);
        let rrf = RrfParams { nu: 1.0, theta: 0.0, phi: 0.0 };
        assert_eq!(
            Picture::from_name("RRF", Some(rrf)).unwrap(),
            Picture::RotatingFrame(rrf),
        );
        assert!(matches!(Picture::from_name("RRF", None), Err(Error::MissingKey(_))));
        assert!(matches!(Picture::from_name("lab", None), Err(Error::UnknownPicture(_))));
    }

    #[test]
    fn sampling_points() {
        assert_eq!(Sampling::default().n_points(20.0), 2000);
        assert_eq!(Sampling::PerUnitTime(100.0).n_points(0.001), 2);
        assert_eq!(Sampling::Total(0).n_points(5.0), 2);
    }

    #[test]
    fn rrf_operator_along_z() {
        let system = SpinSystem::from(NuclearSpin::new(1.5, 1.0).unwrap());
        let rrf = RrfParams { nu: 10.0, theta: 0.0, phi: 0.0 };
        let op = rrf_operator(&system, &rrf);
        let iz = system.total(Component::Z);
        let c = op.matrix()[[0, 0]] / iz.matrix()[[0, 0]];
        assert_relative_eq!(c.re, 10.0, epsilon = 1e-12);
        assert_close(&op, &(&iz * c));
    }

    #[test]
    fn invalid_durations() {
        let system = SpinSystem::from(NuclearSpin::new(0.5, 1.0).unwrap());
        let h0 = zeeman(&system, 1.0);
        let rho = DensityMatrix::basis_state(2, 0).unwrap();
        let params = EvolutionParams::default();
        for duration in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                evolve(&system, &h0, &rho, &Pulse::free(duration), &params),
                Err(Error::NegativeDuration(_)),
            ));
        }
    }

    #[test]
    fn trivial_evolutions_are_identity() {
        let system = SpinSystem::from(NuclearSpin::new(1.0, 1.0).unwrap());
        let h0 = zeeman(&system, 3.0);
        let params = EvolutionParams::default();
        let rho = DensityMatrix::basis_state(3, 1).unwrap();
        let same = evolve(&system, &h0, &rho, &x_pulse(3.0, 1.0, 0.0), &params).unwrap();
        assert_eq!(same, rho);
        let mixed = DensityMatrix::maximally_mixed(3).unwrap();
        let same = evolve(&system, &h0, &mixed, &x_pulse(3.0, 1.0, 2.0), &params).unwrap();
        assert_eq!(same, mixed);
    }

    #[test]
    fn free_step_matches_free_evolution() {
        let mut rng = StdRng::seed_from_u64(8);
        let system = SpinSystem::from(NuclearSpin::new(1.5, 1.3).unwrap());
        let h0 = zeeman(&system, 2.0);
        let rho = random_density_matrix(4, &mut rng).unwrap();
        let params = EvolutionParams::default();
        let evolved = evolve(&system, &h0, &rho, &Pulse::free(0.37), &params).unwrap();
        assert_close(&evolved, &rho.free_evolution(&h0, 0.37).unwrap());
    }

    #[test]
    fn pi_pulse_inverts_spin_half() {
        let system = SpinSystem::from(NuclearSpin::new(0.5, 1.0).unwrap());
        let h0 = zeeman(&system, 10.0);
        let rho = DensityMatrix::basis_state(2, 0).unwrap();
        let params = EvolutionParams {
            picture: Picture::Interaction,
            order: MagnusOrder::Second,
            sampling: Sampling::Total(1001),
        };
        let evolved = evolve(&system, &h0, &rho, &x_pulse(10.0, 1.0, 1.0), &params).unwrap();
        assert!(evolved.populations()[1] > 0.98);
    }

    #[test]
    fn rrf_matches_interaction_picture_on_resonance() {
        // F = ν I_z cos(π) = -10 I_z = H₀
        let system = SpinSystem::from(NuclearSpin::new(1.5, 1.0).unwrap());
        let h0 = zeeman(&system, 10.0);
        let rho = DensityMatrix::basis_state(4, 0).unwrap();
        let pulse = x_pulse(10.0, 1.0, 0.5);
        let ip = EvolutionParams::default();
        let rrf = EvolutionParams {
            picture: Picture::RotatingFrame(RrfParams { nu: 10.0, theta: PI, phi: 0.0 }),
            ..EvolutionParams::default()
        };
        let a = evolve(&system, &h0, &rho, &pulse, &ip).unwrap();
        let b = evolve(&system, &h0, &rho, &pulse, &rrf).unwrap();
        assert!(a.max_abs_diff(&b) < 1e-8);
    }

    #[test]
    fn sequence_records_cumulative_time() {
        let system = SpinSystem::from(NuclearSpin::new(0.5, 1.0).unwrap());
        let h0 = zeeman(&system, 10.0);
        let rho = DensityMatrix::basis_state(2, 0).unwrap();
        let sequence = PulseSequence {
            pulses: vec![Pulse::free(0.5), x_pulse(10.0, 1.0, 0.25), Pulse::free(1.0)],
            params: EvolutionParams::default(),
        };
        let steps = evolve_sequence(&system, &h0, &rho, &sequence).unwrap();
        let times: Vec<f64> = steps.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![0.5, 0.75, 1.75]);
        assert_close(&steps[0].state, &rho);
        assert!(steps.iter().all(|s| s.state.trace().re > 1.0 - 1e-10));
    }

    #[test]
    fn j_coupling_refocusing() {
        let mut rng = StdRng::seed_from_u64(2024);
        let system = SpinSystem::new(vec![
            NuclearSpin::new(0.5, 1.0).unwrap(),
            NuclearSpin::new(0.5, 5.0).unwrap(),
        ]).unwrap();
        let h_zeeman = zeeman(&system, 5.0);
        let j = JCouplingParams {
            matrix: ndarray::array![[0.0, 0.1], [0.0, 0.0]],
            kind: CouplingKind::Secular,
        };
        let h_j = HJCoupling::new_builder(&system, j).unwrap().build_static().unwrap();
        let h0 = h_zeeman.plus(&h_j);

        let r1 = random_density_matrix(2, &mut rng).unwrap();
        let r2 = random_density_matrix(2, &mut rng).unwrap();
        let rho = r1.kron(&r2).cast_to_density_matrix().unwrap();

        // π pulses on the second spin only (Larmor frequency 25 MHz)
        let pi_pulse = x_pulse(25.0, 2.0, 0.1);
        let sequence = PulseSequence {
            pulses: vec![Pulse::free(1.0), pi_pulse.clone(), Pulse::free(1.0), pi_pulse],
            params: EvolutionParams {
                sampling: Sampling::PerUnitTime(10000.0),
                ..EvolutionParams::default()
            },
        };
        let steps = evolve_sequence(&system, &h0, &rho, &sequence).unwrap();
        let last = &steps.last().unwrap().state;
        let refocused = last.changed_picture(&h_zeeman, 2.2, false).unwrap();
        assert!(refocused.max_abs_diff(&rho) < 0.1);
    }
}
