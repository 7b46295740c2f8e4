//! Contract with the chemistry-kinetics collaborator.
//!
//! The sweep never computes chemistry itself. It consumes five capabilities,
//! expressed as traits so that a real solver binding or the bundled
//! [`synthetic`] surrogate can be plugged in:
//!
//! 1. construct a gas state from a mechanism identifier ([`ChemistryEngine::solution`]);
//! 2. set composition from equivalence ratio, fuel and oxidizer ([`GasState::set_equivalence_ratio`]);
//! 3. equilibrate at fixed enthalpy and pressure ([`GasState::equilibrate_hp`]);
//! 4. advance a constant-pressure reactor stepwise ([`IgnitionReactor`]);
//! 5. solve a steady 1-D premixed free flame ([`ChemistryEngine::solve_free_flame`]).

pub mod synthetic;
mod traits;

pub use traits::{ChemistryEngine, GasState, IgnitionReactor};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard atmosphere in pascal.
pub const ONE_ATM: f64 = 101_325.0;

/// Failure reported by the chemistry collaborator.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ChemistryError {
    #[error("unknown mechanism '{0}'")]
    UnknownMechanism(String),
    #[error("invalid composition: {0}")]
    Composition(String),
    #[error("equilibrium did not converge: {0}")]
    Equilibrium(String),
    #[error("reactor integration failed: {0}")]
    Integration(String),
    #[error("flame solver failed: {0}")]
    Flame(String),
}

/// Fuel description handed to the collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelSpec {
    pub name: String,
    /// Mechanism identifier understood by the chemistry engine (e.g. `gri30.yaml`).
    pub mechanism: String,
    /// Fuel composition string, e.g. `CH4:1.0`.
    pub formula: String,
    /// Carbon-bearing fuels also report CO and CO2.
    pub has_carbon: bool,
}

impl FuelSpec {
    pub fn new(
        name: impl Into<String>,
        mechanism: impl Into<String>,
        formula: impl Into<String>,
        has_carbon: bool,
    ) -> Self {
        Self {
            name: name.into(),
            mechanism: mechanism.into(),
            formula: formula.into(),
            has_carbon,
        }
    }
}

/// Numerical settings forwarded to the free-flame solver.
#[derive(Clone, Debug, PartialEq)]
pub struct FlameSolveOptions {
    /// Initial domain width (m).
    pub width_m: f64,
    /// Grid refinement criteria.
    pub refine_ratio: f64,
    pub refine_slope: f64,
    pub refine_curve: f64,
    /// Jacobian re-evaluation age for steady and transient iterations.
    pub max_jac_age_steady: usize,
    pub max_jac_age_transient: usize,
    /// Initial pseudo-time step (s).
    pub initial_time_step_s: f64,
}

impl Default for FlameSolveOptions {
    fn default() -> Self {
        Self {
            width_m: 0.05,
            refine_ratio: 3.0,
            refine_slope: 0.1,
            refine_curve: 0.1,
            max_jac_age_steady: 50,
            max_jac_age_transient: 50,
            initial_time_step_s: 1e-6,
        }
    }
}

/// Parses `A:1.0,B:0.5` composition strings into `(species, amount)` pairs.
pub fn parse_composition(spec: &str) -> Result<Vec<(String, f64)>, ChemistryError> {
    let mut out = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, amount) = part
            .split_once(':')
            .ok_or_else(|| ChemistryError::Composition(format!("missing ':' in '{part}'")))?;
        let amount: f64 = amount
            .trim()
            .parse()
            .map_err(|e| ChemistryError::Composition(format!("bad amount in '{part}': {e}")))?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ChemistryError::Composition(format!(
                "amount must be finite and non-negative in '{part}'"
            )));
        }
        out.push((name.trim().to_string(), amount));
    }
    if out.is_empty() {
        return Err(ChemistryError::Composition(format!(
            "empty composition '{spec}'"
        )));
    }
    Ok(out)
}
