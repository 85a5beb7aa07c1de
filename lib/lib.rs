#![allow(dead_code, non_snake_case, non_upper_case_globals)]

//! Simulation of nuclear spin dynamics under static, quadrupolar and pulsed
//! radio-frequency interactions, for NMR and NQR spectroscopy.
//!
//! Frequencies are in MHz, times in μs and magnetic fields in T. Time
//! evolution under a Hamiltonian `H` is `exp(-i2πHt)`.

pub mod error;
pub mod constants;
pub mod operator;
pub mod spin;
pub mod hilbert;
pub mod dynamics;
pub mod evolution;
pub mod spectrum;
pub mod system;
pub mod config;

pub use error::{ Error, Result, StateProperty };
pub use operator::{
    DensityMatrix,
    Observable,
    Operator,
    canonical_density_matrix,
    commutator,
};
pub use spin::{ Component, NuclearSpin };
pub use hilbert::SpinSystem;
pub use evolution::{
    EvolutionParams,
    Picture,
    Pulse,
    PulseSequence,
    RrfParams,
    Sampling,
    evolve,
    evolve_sequence,
};
pub use spectrum::{
    FidParams,
    FourierParams,
    fid_signal,
    fourier_phase_shift,
    fourier_transform_signal,
    power_absorption_spectrum,
};
pub use system::{ InitialState, NuclearSystem, SimulationParams, nuclear_system_setup };
