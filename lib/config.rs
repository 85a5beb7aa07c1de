//! Parameter bundles read from TOML.
//!
//! A simulation is described by a mapping of mappings:
//! ```toml
//! [[spin]]
//! "quantum number" = 1.5
//! "gamma/2pi" = 1.0
//!
//! [spin.quadrupole]          # optional, per spin
//! "coupling constant" = 2.0
//! "asymmetry parameter" = 0.0
//! alpha_q = 0.0
//! beta_q = 0.0
//! gamma_q = 0.0
//!
//! [zeeman]
//! "field magnitude" = 10.0
//! theta_z = 0.0
//! phi_z = 0.0
//!
//! [j_coupling]               # optional
//! matrix = [[0.0, 0.1], [0.0, 0.0]]
//! kind = "secular"           # or "isotropic"
//!
//! [initial_state]            # exactly one of the keys below
//! temperature = 300.0
//! # basis_state = 0
//! # matrix = [[0.5, 0.0], [0.0, 0.5]]
//! # pure = [[1.0, 0.0], [0.0, 1.0]]
//! ```
//! and a pulse sequence by
//! ```toml
//! [evolution]
//! picture = "RRF"            # or "IP"
//! nu_RRF = 10.0
//! theta_RRF = 3.141592653589793
//! phi_RRF = 0.0
//! "magnus order" = 2
//! "points per unit time" = 100.0   # or "n_points" = 1000
//!
//! [[pulse]]
//! duration = 20.0
//! [[pulse.mode]]
//! frequency = 10.0
//! amplitude = 1.0
//! phase = 0.0
//! theta_p = 1.5707963267948966
//! phi_p = 0.0
//! ```
//! Integers are accepted wherever a real number is expected.

use ndarray as nd;
use tracing::debug;
use crate::{
    dynamics::{ CouplingKind, JCouplingParams, PulseMode, QuadrupoleParams, ZeemanParams },
    error::{ Error, Result },
    evolution::{ EvolutionParams, MagnusOrder, Picture, Pulse, PulseSequence, RrfParams, Sampling },
    operator::{ Operator, toml_complex, toml_real },
    system::{ InitialState, SimulationParams, SpinParams },
};

/* Lookup ********************************************************************/

fn get<'a>(table: &'a toml::Table, key: &str) -> Result<&'a toml::Value> {
    table.get(key).ok_or_else(|| Error::MissingKey(key.to_string()))
}

fn get_f64(table: &toml::Table, key: &str) -> Result<f64> {
    toml_real(get(table, key)?)
        .ok_or_else(|| Error::WrongType { key: key.to_string(), expected: "a number" })
}

fn get_usize(table: &toml::Table, key: &str) -> Result<usize> {
    get(table, key)?
        .as_integer()
        .and_then(|k| usize::try_from(k).ok())
        .ok_or_else(|| Error::WrongType {
            key: key.to_string(),
            expected: "a non-negative integer",
        })
}

fn get_str<'a>(table: &'a toml::Table, key: &str) -> Result<&'a str> {
    get(table, key)?
        .as_str()
        .ok_or_else(|| Error::WrongType { key: key.to_string(), expected: "a string" })
}

fn get_table<'a>(table: &'a toml::Table, key: &str) -> Result<&'a toml::Table> {
    get(table, key)?
        .as_table()
        .ok_or_else(|| Error::WrongType { key: key.to_string(), expected: "a table" })
}

fn get_tables<'a>(table: &'a toml::Table, key: &str) -> Result<Vec<&'a toml::Table>> {
    let wrong = || Error::WrongType { key: key.to_string(), expected: "an array of tables" };
    get(table, key)?
        .as_array()
        .ok_or_else(wrong)?
        .iter()
        .map(|v| v.as_table().ok_or_else(wrong))
        .collect()
}

/* Interaction parameters ****************************************************/

/// Read the parameters of a single spin.
pub fn spin_params(table: &toml::Table) -> Result<SpinParams> {
    let quadrupole
        = match table.get("quadrupole") {
            Some(_) => Some(quadrupole_params(get_table(table, "quadrupole")?)?),
            None => None,
        };
    Ok(SpinParams {
        quantum_number: get_f64(table, "quantum number")?,
        gyro_ratio: get_f64(table, "gamma/2pi")?,
        quadrupole,
    })
}

/// Read quadrupole interaction parameters.
pub fn quadrupole_params(table: &toml::Table) -> Result<QuadrupoleParams> {
    Ok(QuadrupoleParams {
        coupling: get_f64(table, "coupling constant")?,
        asymmetry: get_f64(table, "asymmetry parameter")?,
        alpha: get_f64(table, "alpha_q")?,
        beta: get_f64(table, "beta_q")?,
        gamma: get_f64(table, "gamma_q")?,
    })
}

/// Read Zeeman interaction parameters.
pub fn zeeman_params(table: &toml::Table) -> Result<ZeemanParams> {
    Ok(ZeemanParams {
        field: get_f64(table, "field magnitude")?,
        theta: get_f64(table, "theta_z")?,
        phi: get_f64(table, "phi_z")?,
    })
}

/// Read J-coupling parameters; `kind` defaults to secular.
pub fn j_coupling_params(table: &toml::Table) -> Result<JCouplingParams> {
    let wrong = || Error::WrongType {
        key: "matrix".to_string(),
        expected: "a square array of numbers",
    };
    let rows = get(table, "matrix")?.as_array().ok_or_else(wrong)?;
    let n = rows.len();
    let mut matrix: nd::Array2<f64> = nd::Array2::zeros((n, n));
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_array().filter(|r| r.len() == n).ok_or_else(wrong)?;
        for (j, x) in row.iter().enumerate() {
            matrix[[i, j]] = toml_real(x).ok_or_else(wrong)?;
        }
    }
    let kind
        = match table.get("kind") {
            None => CouplingKind::default(),
            Some(_) => match get_str(table, "kind")? {
                "secular" => CouplingKind::Secular,
                "isotropic" => CouplingKind::Isotropic,
                other => {
                    return Err(Error::invalid(
                        "kind", format!("expected \"secular\" or \"isotropic\", got {:?}", other)));
                },
            },
        };
    Ok(JCouplingParams { matrix, kind })
}

/// Read a single pulse mode.
pub fn pulse_mode(table: &toml::Table) -> Result<PulseMode> {
    Ok(PulseMode {
        frequency: get_f64(table, "frequency")?,
        amplitude: get_f64(table, "amplitude")?,
        phase: get_f64(table, "phase")?,
        theta: get_f64(table, "theta_p")?,
        phi: get_f64(table, "phi_p")?,
    })
}

/// Read the parameters of a rotating reference frame.
pub fn rrf_params(table: &toml::Table) -> Result<RrfParams> {
    Ok(RrfParams {
        nu: get_f64(table, "nu_RRF")?,
        theta: get_f64(table, "theta_RRF")?,
        phi: get_f64(table, "phi_RRF")?,
    })
}

/* Initial state *************************************************************/

/// Read an initial-state description. Exactly one of `temperature`,
/// `basis_state`, `matrix` and `pure` must be present.
pub fn initial_state(table: &toml::Table) -> Result<InitialState> {
    const KEYS: [&str; 4] = ["temperature", "basis_state", "matrix", "pure"];
    let present: Vec<&str>
        = KEYS.iter().copied().filter(|k| table.contains_key(*k)).collect();
    match present.as_slice() {
        ["temperature"] => Ok(InitialState::Canonical {
            temperature: get_f64(table, "temperature")?,
        }),
        ["basis_state"] => Ok(InitialState::BasisState(get_usize(table, "basis_state")?)),
        ["matrix"] => Ok(InitialState::Matrix(Operator::from_toml(get(table, "matrix")?)?)),
        ["pure"] => {
            let wrong = || Error::WrongType {
                key: "pure".to_string(),
                expected: "an array of complex numbers",
            };
            let psi: nd::Array1<_>
                = get(table, "pure")?
                .as_array()
                .ok_or_else(wrong)?
                .iter()
                .map(|z| toml_complex(z).ok_or_else(wrong))
                .collect::<Result<_>>()?;
            Ok(InitialState::Pure(psi))
        },
        [] => Err(Error::MissingKey("temperature".to_string())),
        _ => Err(Error::invalid(
            "initial state", format!("conflicting descriptions {:?}", present))),
    }
}

/* Bundles *******************************************************************/

/// Read a complete simulation description.
///
/// `[j_coupling]` and per-spin `quadrupole` tables are optional; everything
/// else is required.
pub fn simulation_params(table: &toml::Table) -> Result<SimulationParams> {
    let spins: Vec<SpinParams>
        = get_tables(table, "spin")?
        .into_iter()
        .map(spin_params)
        .collect::<Result<_>>()?;
    let zeeman = zeeman_params(get_table(table, "zeeman")?)?;
    let j_coupling
        = match table.get("j_coupling") {
            Some(_) => Some(j_coupling_params(get_table(table, "j_coupling")?)?),
            None => None,
        };
    let initial_state = initial_state(get_table(table, "initial_state")?)?;
    debug!(spins = spins.len(), "read simulation parameters");
    Ok(SimulationParams { spins, zeeman, j_coupling, initial_state })
}

/// Read shared evolution parameters. All keys are optional except the frame
/// parameters when `picture = "RRF"`.
pub fn evolution_params(table: &toml::Table) -> Result<EvolutionParams> {
    let picture
        = match table.get("picture") {
            None => Picture::default(),
            Some(_) => {
                let name = get_str(table, "picture")?;
                let rrf
                    = if name == "RRF" { Some(rrf_params(table)?) } else { None };
                Picture::from_name(name, rrf)?
            },
        };
    let order
        = match table.get("magnus order") {
            None => MagnusOrder::default(),
            Some(_) => match get_usize(table, "magnus order")? {
                1 => MagnusOrder::First,
                2 => MagnusOrder::Second,
                3 => MagnusOrder::Third,
                k => {
                    return Err(Error::invalid(
                        "magnus order", format!("expected 1, 2 or 3, got {}", k)));
                },
            },
        };
    let sampling
        = match (table.get("n_points"), table.get("points per unit time")) {
            (Some(_), Some(_)) => {
                return Err(Error::invalid(
                    "sampling", "give either `n_points` or `points per unit time`"));
            },
            (Some(_), None) => Sampling::Total(get_usize(table, "n_points")?),
            (None, Some(_)) => {
                let rate = get_f64(table, "points per unit time")?;
                if !(rate > 0.0 && rate.is_finite()) {
                    return Err(Error::invalid(
                        "points per unit time", format!("must be positive, got {}", rate)));
                }
                Sampling::PerUnitTime(rate)
            },
            (None, None) => Sampling::default(),
        };
    Ok(EvolutionParams { picture, order, sampling })
}

/// Read a single pulse. A pulse without modes is free evolution.
pub fn pulse(table: &toml::Table) -> Result<Pulse> {
    let modes: Vec<PulseMode>
        = match table.get("mode") {
            None => Vec::new(),
            Some(_) => get_tables(table, "mode")?
                .into_iter()
                .map(pulse_mode)
                .collect::<Result<_>>()?,
        };
    Ok(Pulse::new(modes, get_f64(table, "duration")?))
}

/// Read a pulse sequence. `[evolution]` is optional.
pub fn pulse_sequence(table: &toml::Table) -> Result<PulseSequence> {
    let params
        = match table.get("evolution") {
            Some(_) => evolution_params(get_table(table, "evolution")?)?,
            None => EvolutionParams::default(),
        };
    let pulses: Vec<Pulse>
        = get_tables(table, "pulse")?
        .into_iter()
        .map(pulse)
        .collect::<Result<_>>()?;
    debug!(pulses = pulses.len(), "read pulse sequence");
    Ok(PulseSequence { pulses, params })
}

impl SimulationParams {
    /// Parse a simulation description from TOML source.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(src)?;
        simulation_params(&table)
    }
}

impl PulseSequence {
    /// Parse a pulse sequence from TOML source.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(src)?;
        pulse_sequence(&table)
    }
}
