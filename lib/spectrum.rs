//! Spectra and detected signals.
//!
//! Frequencies are in MHz and times in μs throughout.

use std::f64::consts::TAU;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use tracing::debug;
use crate::{
    dynamics::{ linspace, trapz },
    error::{ Error, Result },
    hilbert::SpinSystem,
    operator::{ DensityMatrix, Observable, Operator },
    spin::Component,
};

/* Absorption spectrum *******************************************************/

/// Transition frequencies and intensities, one entry per unordered pair of
/// energy eigenstates.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSpectrum {
    pub frequencies: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl TransitionSpectrum {
    /// Return the number of entries.
    pub fn len(&self) -> usize { self.frequencies.len() }

    /// Return `true` if there are no entries.
    pub fn is_empty(&self) -> bool { self.frequencies.is_empty() }

    /// Iterate over `(frequency, intensity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies.iter().copied().zip(self.intensities.iter().copied())
    }
}

/// Compute the power absorption spectrum of `system` under the unperturbed
/// Hamiltonian `h0` for a field linearly polarized along x.
///
/// For every pair of eigenstates `i < j` the entry is
/// `ν = |E_i - E_j|` with intensity `ν |⟨j|μ_x|i⟩|²`, `μ_x = Σ_k γ_k I_x^k`.
/// If `rho` is given, intensities are further weighted by the population
/// difference `|p_i - p_j|` in the energy eigenbasis. If `normalized`,
/// intensities are divided by their maximum.
pub fn power_absorption_spectrum(
    system: &SpinSystem,
    h0: &Observable,
    rho: Option<&DensityMatrix>,
    normalized: bool,
) -> Result<TransitionSpectrum>
{
    let d = system.dim();
    if h0.dim() != d {
        return Err(Error::DimensionMismatch(d, h0.dim()));
    }
    let (E, V) = h0.diagonalisation()?;
    let Vd = V.dagger();
    let mu = system.gamma_weighted(Component::X);
    let mu_e = (&Vd * &mu) * &V;
    let populations: Option<nd::Array1<f64>>
        = match rho {
            Some(rho) => {
                if rho.dim() != d {
                    return Err(Error::DimensionMismatch(d, rho.dim()));
                }
                let rho_e = (&Vd * rho) * &V;
                Some(rho_e.matrix().diag().mapv(|p| p.re))
            },
            None => None,
        };
    let (frequencies, mut intensities): (Vec<f64>, Vec<f64>)
        = (0..d).tuple_combinations()
        .map(|(i, j)| {
            let nu = (E[i] - E[j]).abs();
            let mut intensity = nu * mu_e.matrix()[[j, i]].norm_sqr();
            if let Some(p) = populations.as_ref() {
                intensity *= (p[i] - p[j]).abs();
            }
            (nu, intensity)
        })
        .unzip();
    if normalized {
        let max = intensities.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            intensities.iter_mut().for_each(|p| { *p /= max; });
        }
    }
    debug!(dim = d, entries = frequencies.len(), normalized, "absorption spectrum");
    Ok(TransitionSpectrum { frequencies, intensities })
}

/* Free induction decay ******************************************************/

/// Acquisition parameters for a free induction decay.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FidParams {
    /// Total acquisition time.
    pub acquisition_time: f64,
    /// Transverse relaxation time.
    pub t2: f64,
    /// Number of samples over `[0, acquisition_time]`.
    pub n_points: usize,
    /// Frequency of the reference signal demodulating the detected signal.
    pub reference_frequency: f64,
    /// Overall phase applied to the signal.
    pub phase: f64,
    /// Polar angle of the detection-coil axis.
    pub theta: f64,
    /// Azimuthal angle of the detection-coil axis.
    pub phi: f64,
}

impl Default for FidParams {
    fn default() -> Self {
        Self {
            acquisition_time: 500.0,
            t2: 100.0,
            n_points: 1000,
            reference_frequency: 0.0,
            phase: 0.0,
            theta: 0.0,
            phi: 0.0,
        }
    }
}

impl FidParams {
    fn check(&self) -> Result<()> {
        if !(self.acquisition_time >= 0.0 && self.acquisition_time.is_finite()) {
            return Err(Error::invalid("acquisition time", "must be finite and non-negative"));
        }
        if !(self.t2 > 0.0) {
            return Err(Error::invalid("T2", format!("must be positive, got {}", self.t2)));
        }
        if self.n_points < 2 {
            return Err(Error::invalid("n_points", "at least two samples are required"));
        }
        Ok(())
    }
}

/// A complex signal sampled at uniformly spaced times.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub times: nd::Array1<f64>,
    pub values: nd::Array1<C64>,
}

impl Signal {
    /// Return a copy with every value multiplied by `exp(iφ)`.
    pub fn rotated(&self, phi: f64) -> Self {
        let r = C64::from_polar(1.0, phi);
        Self { times: self.times.clone(), values: self.values.mapv(|s| s * r) }
    }
}

/// Compute the free induction decay of `rho` under `h0`, as picked up by a
/// coil along `(θ, φ)`.
///
/// The detected operator is `I₋` of the total spin, rotated onto the coil
/// axis; the signal is
/// `s(t) = e^{iφ₀} e^{-t/T₂} e^{-i2π f_ref t} tr(ρ(t) D)`, where `ρ(t)` is the
/// free evolution of `rho` under `h0`. A positive Larmor frequency thus
/// appears at positive frequency.
pub fn fid_signal(
    system: &SpinSystem,
    h0: &Observable,
    rho: &DensityMatrix,
    params: &FidParams,
) -> Result<Signal>
{
    params.check()?;
    let d = system.dim();
    if h0.dim() != d {
        return Err(Error::DimensionMismatch(d, h0.dim()));
    }
    if rho.dim() != d {
        return Err(Error::DimensionMismatch(d, rho.dim()));
    }
    let iz = system.total(Component::Z);
    let iy = system.total(Component::Y);
    let rot
        = (&iz * C64::new(0.0, -params.phi)).exp()?
        * (&iy * C64::new(0.0, -params.theta)).exp()?;
    let det = (&rot * system.total(Component::Lowering)) * rot.dagger();

    let (E, V) = h0.diagonalisation()?;
    let Vd = V.dagger();
    let rho_e: Operator = (&Vd * rho) * &V;
    let det_e: Operator = (&Vd * &det) * &V;
    // only pairs with nonvanishing ρ[a, b] D[b, a] contribute
    let terms: Vec<(f64, C64)>
        = (0..d).cartesian_product(0..d)
        .filter_map(|(a, b)| {
            let w = rho_e.matrix()[[a, b]] * det_e.matrix()[[b, a]];
            (w.norm() > 0.0).then_some((E[a] - E[b], w))
        })
        .collect();

    let times = linspace(0.0, params.acquisition_time, params.n_points);
    let pref = C64::from_polar(1.0, params.phase);
    let values: nd::Array1<C64>
        = times.mapv(|t| {
            let trace: C64
                = terms.iter()
                .map(|(dE, w)| w * C64::from_polar(1.0, -TAU * dE * t))
                .sum();
            pref * (-t / params.t2).exp()
                * C64::from_polar(1.0, -TAU * params.reference_frequency * t)
                * trace
        });
    debug!(
        n_points = params.n_points,
        acquisition_time = params.acquisition_time,
        coherences = terms.len(),
        "free induction decay"
    );
    Ok(Signal { times, values })
}

/* Fourier analysis **********************************************************/

/// Frequency window for a Fourier transform.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FourierParams {
    pub frequency_start: f64,
    pub frequency_stop: f64,
    /// Number of frequencies over `[frequency_start, frequency_stop]`.
    pub n_frequencies: usize,
    /// Also compute the transform at `-f` for every `f` in the window.
    pub opposite_frequency: bool,
}

impl FourierParams {
    /// Create a window with the default number of frequencies (1000) and no
    /// opposite-frequency branch.
    pub fn new(frequency_start: f64, frequency_stop: f64) -> Self {
        Self {
            frequency_start,
            frequency_stop,
            n_frequencies: 1000,
            opposite_frequency: false,
        }
    }
}

/// Complex spectrum of a [`Signal`].
#[derive(Clone, Debug, PartialEq)]
pub struct FourierSpectrum {
    pub frequencies: nd::Array1<f64>,
    pub values: nd::Array1<C64>,
    /// Values at `-frequencies`, if requested.
    pub opposite: Option<nd::Array1<C64>>,
}

fn transform_at(signal: &Signal, dt: f64, f: f64) -> C64 {
    let integrand: Vec<C64>
        = signal.times.iter().zip(signal.values.iter())
        .map(|(t, s)| s * C64::from_polar(1.0, -TAU * f * t))
        .collect();
    trapz(&integrand, dt)
}

/// Compute `F(f) = ∫ s(t) e^{-i2πft} dt` over the window given by `params`,
/// using the trapezoidal rule. The sample times must be uniformly spaced.
pub fn fourier_transform_signal(signal: &Signal, params: &FourierParams)
    -> Result<FourierSpectrum>
{
    let n = signal.times.len();
    if n != signal.values.len() {
        return Err(Error::DimensionMismatch(n, signal.values.len()));
    }
    if n < 2 {
        return Err(Error::invalid("signal", "at least two samples are required"));
    }
    if params.n_frequencies == 0 {
        return Err(Error::invalid("n_frequencies", "must be positive"));
    }
    let dt = signal.times[1] - signal.times[0];
    let uniform
        = dt.is_finite() && dt != 0.0
        && signal.times.windows(2).into_iter()
            .all(|w| ((w[1] - w[0]) - dt).abs() <= 1e-9 * dt.abs());
    if !uniform {
        return Err(Error::invalid("signal", "sample times must be uniformly spaced"));
    }
    let frequencies
        = linspace(params.frequency_start, params.frequency_stop, params.n_frequencies);
    let values = frequencies.mapv(|f| transform_at(signal, dt, f));
    let opposite
        = params.opposite_frequency
        .then(|| frequencies.mapv(|f| transform_at(signal, dt, -f)));
    Ok(FourierSpectrum { frequencies, values, opposite })
}

/// Compute the phase `φ` for which `e^{iφ} F` has maximal real part summed
/// over the window `|f - peak_frequency| ≤ width / 2`, including the
/// opposite-frequency branch if present. The result lies in `[0, 2π)`.
pub fn fourier_phase_shift(
    spectrum: &FourierSpectrum,
    peak_frequency: f64,
    width: f64,
) -> Result<f64>
{
    let mut points: Vec<C64> = Vec::new();
    let in_window = |f: f64| (f - peak_frequency).abs() <= width / 2.0;
    spectrum.frequencies.iter().zip(spectrum.values.iter())
        .filter(|(f, _)| in_window(**f))
        .for_each(|(_, v)| points.push(*v));
    if let Some(opp) = spectrum.opposite.as_ref() {
        spectrum.frequencies.iter().zip(opp.iter())
            .filter(|(f, _)| in_window(-**f))
            .for_each(|(_, v)| points.push(*v));
    }
    if points.is_empty() {
        return Err(Error::invalid(
            "integration domain",
            format!("no frequencies within {} of {}", width / 2.0, peak_frequency),
        ));
    }
    let total: C64 = points.iter().sum();
    Ok((-total.arg()).rem_euclid(TAU))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{ FRAC_PI_2, PI };
    use approx::assert_relative_eq;
    use crate::{
        dynamics::{ HBuild, HZeeman, ZeemanParams },
        spin::NuclearSpin,
    };

    fn zeeman_system(quantum_number: f64, field: f64) -> (SpinSystem, Observable) {
        let system = SpinSystem::from(NuclearSpin::new(quantum_number, 1.0).unwrap());
        let params = ZeemanParams { field, theta: 0.0, phi: 0.0 };
        let h0 = HZeeman::new_builder(&system, params).unwrap().build_static().unwrap();
        (system, h0)
    }

    // transverse magnetization along x for a single spin-1/2
    fn x_state() -> DensityMatrix {
        DensityMatrix::from_array(nd::array![
            [C64::from(0.5), C64::from(0.5)],
            [C64::from(0.5), C64::from(0.5)],
        ]).unwrap()
    }

    #[test]
    fn absorption_lines_for_pure_zeeman() {
        let (system, h0) = zeeman_system(1.5, 10.0);
        let spec = power_absorption_spectrum(&system, &h0, None, true).unwrap();
        assert_eq!(spec.len(), 6);
        let lines: Vec<(f64, f64)> = spec.iter().filter(|(_, p)| *p > 1e-10).collect();
        assert_eq!(lines.len(), 3);
        for (nu, _) in lines {
            assert_relative_eq!(nu, 10.0, epsilon = 1e-9);
        }
        assert_relative_eq!(
            spec.intensities.iter().copied().fold(0.0, f64::max), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn absorption_weighted_by_populations() {
        let (system, h0) = zeeman_system(0.5, 4.0);
        let mixed = DensityMatrix::maximally_mixed(2).unwrap();
        let spec = power_absorption_spectrum(&system, &h0, Some(&mixed), false).unwrap();
        assert_eq!(spec.len(), 1);
        assert_relative_eq!(spec.intensities[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn fid_decays() {
        let (system, h0) = zeeman_system(0.5, 1.0);
        let params = FidParams {
            acquisition_time: 100.0, t2: 1.0, n_points: 1000, ..FidParams::default()
        };
        let fid = fid_signal(&system, &h0, &x_state(), &params).unwrap();
        assert_eq!(fid.values.len(), 1000);
        assert!(fid.values[999].norm() < 1e-10);
        assert_relative_eq!(fid.values[0].norm(), 0.5, epsilon = 1e-10);
    }

    #[test]
    fn fid_is_periodic_under_zeeman() {
        let (system, h0) = zeeman_system(0.5, 1.0);
        let t2 = 10.0;
        let params = FidParams {
            acquisition_time: 2.0, t2, n_points: 201, ..FidParams::default()
        };
        let fid = fid_signal(&system, &h0, &x_state(), &params).unwrap();
        let decay = (-1.0 / t2).exp();
        for k in 0..=100 {
            assert!((fid.values[k + 100] - fid.values[k] * decay).norm() < 1e-10);
        }
    }

    #[test]
    fn fourier_peak_at_larmor_frequency() {
        let (system, h0) = zeeman_system(0.5, 2.0);
        let params = FidParams {
            acquisition_time: 20.0, t2: 5.0, n_points: 4000, ..FidParams::default()
        };
        let fid = fid_signal(&system, &h0, &x_state(), &params).unwrap();
        let mut fp = FourierParams::new(0.0, 4.0);
        fp.n_frequencies = 401;
        let spec = fourier_transform_signal(&fid, &fp).unwrap();
        let (k_max, _)
            = spec.values.iter().enumerate()
            .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
            .unwrap();
        assert_relative_eq!(spec.frequencies[k_max], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn pi_phase_negates_transform() {
        let (system, h0) = zeeman_system(0.5, 1.0);
        let base = FidParams {
            acquisition_time: 10.0, t2: 2.0, n_points: 500, ..FidParams::default()
        };
        let flipped = FidParams { phase: PI, ..base };
        let rho = x_state();
        let a = fid_signal(&system, &h0, &rho, &base).unwrap();
        let b = fid_signal(&system, &h0, &rho, &flipped).unwrap();
        let mut fp = FourierParams::new(0.0, 2.0);
        fp.n_frequencies = 100;
        fp.opposite_frequency = true;
        let fa = fourier_transform_signal(&a, &fp).unwrap();
        let fb = fourier_transform_signal(&b, &fp).unwrap();
        for (x, y) in fa.values.iter().zip(fb.values.iter()) {
            assert!((x + y).norm() <= 1e-10 * x.norm().max(1.0));
        }
        let (oa, ob) = (fa.opposite.unwrap(), fb.opposite.unwrap());
        for (x, y) in oa.iter().zip(ob.iter()) {
            assert!((x + y).norm() <= 1e-10 * x.norm().max(1.0));
        }
    }

    #[test]
    fn phase_alignment_equivalence() {
        let (system, h0) = zeeman_system(0.5, 1.0);
        // coherence rotated away from the real axis
        let rho = DensityMatrix::from_array(nd::array![
            [C64::from(0.5), C64::new(0.0, 0.5)],
            [C64::new(0.0, -0.5), C64::from(0.5)],
        ]).unwrap();
        let params = FidParams {
            acquisition_time: 20.0, t2: 4.0, n_points: 2000, ..FidParams::default()
        };
        let fid = fid_signal(&system, &h0, &rho, &params).unwrap();
        let mut fp = FourierParams::new(0.5, 1.5);
        fp.n_frequencies = 201;
        let spec = fourier_transform_signal(&fid, &fp).unwrap();
        let phi = fourier_phase_shift(&spec, 1.0, 0.2).unwrap();
        assert!((0.0..TAU).contains(&phi));

        // rotating the signal before the transform ...
        let shifted = fid_signal(&system, &h0, &rho, &FidParams { phase: phi, ..params })
            .unwrap();
        let before = fourier_transform_signal(&shifted, &fp).unwrap();
        let before_alt = fourier_transform_signal(&fid.rotated(phi), &fp).unwrap();
        // ... is the same as rotating the spectrum after
        let after = spec.values.mapv(|v| v * C64::from_polar(1.0, phi));
        for ((x, y), z) in before.values.iter().zip(after.iter()).zip(before_alt.values.iter()) {
            assert!((x - y).norm() < 1e-9);
            assert!((z - y).norm() < 1e-9);
        }
        // and puts the integrated peak on the positive real axis
        let total: C64 = before.values.iter().zip(before.frequencies.iter())
            .filter(|(_, f)| (**f - 1.0).abs() <= 0.1)
            .map(|(v, _)| *v)
            .sum();
        assert!(total.re > 0.0);
        assert!(total.im.abs() < 1e-9 * total.re);
    }

    #[test]
    fn non_uniform_times_fail() {
        let fp = FourierParams {
            frequency_start: 0.0, frequency_stop: 1.0, n_frequencies: 3,
            opposite_frequency: false,
        };
        let uneven = Signal {
            times: nd::array![0.0, 1.0, 3.0],
            values: nd::array![C64::from(1.0), C64::from(1.0), C64::from(1.0)],
        };
        assert!(matches!(
            fourier_transform_signal(&uneven, &fp),
            Err(Error::InvalidParameter { name: "signal", .. }),
        ));
        let repeated = Signal {
            times: nd::array![1.0, 1.0],
            values: nd::array![C64::from(1.0), C64::from(1.0)],
        };
        assert!(fourier_transform_signal(&repeated, &fp).is_err());
        let even = Signal {
            times: nd::array![0.0, 0.5, 1.0],
            values: nd::array![C64::from(1.0), C64::from(1.0), C64::from(1.0)],
        };
        assert!(fourier_transform_signal(&even, &fp).is_ok());
    }

    #[test]
    fn empty_window_fails() {
        let spec = FourierSpectrum {
            frequencies: nd::array![0.0, 1.0],
            values: nd::array![C64::from(1.0), C64::from(1.0)],
            opposite: None,
        };
        assert!(fourier_phase_shift(&spec, 5.0, 0.5).is_err());
        assert_relative_eq!(fourier_phase_shift(&spec, 0.5, 2.0).unwrap(), 0.0);
    }

    #[test]
    fn coil_along_x_sees_same_peak() {
        let (system, h0) = zeeman_system(0.5, 1.0);
        let params = FidParams {
            acquisition_time: 5.0, t2: 10.0, n_points: 50, theta: FRAC_PI_2,
            ..FidParams::default()
        };
        assert!(fid_signal(&system, &h0, &x_state(), &params).is_ok());
        let bad = FidParams { t2: 0.0, ..params };
        assert!(fid_signal(&system, &h0, &x_state(), &bad).is_err());
    }
}
