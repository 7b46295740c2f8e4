//! Parameter types configuring a sweep.
//!
//! [`SweepParams`] is the settings object a [`SweepDriver`](super::SweepDriver)
//! owns for the duration of a sweep. [`SweepRequest`] describes the operating
//! point a centred grid is built around.

use super::progress::RemainingEstimate;
use crate::chemistry::{FlameSolveOptions, FuelSpec};
use crate::compensation::ThresholdRules;
use crate::ignition::IgnitionParams;
use crate::types::GridAxis;
use serde::{Deserialize, Serialize};

/// Accepted initial temperature range (K).
pub const TEMPERATURE_RANGE: (f64, f64) = (300.0, 1500.0);
/// Accepted pressure range (atm).
pub const PRESSURE_RANGE: (f64, f64) = (0.5, 50.0);
/// Accepted equivalence ratio range.
pub const PHI_RANGE: (f64, f64) = (0.3, 4.0);
/// Accepted points per axis.
pub const GRID_SIZE_RANGE: (usize, usize) = (1, 10);
pub const DEFAULT_GRID_SIZE: usize = 5;

/// Half-width of the temperature window around the requested point (K).
const TEMPERATURE_SPAN: f64 = 100.0;
/// Half-width of the pressure window around the requested point (atm).
const PRESSURE_SPAN: f64 = 5.0;

/// Settings shared by every point of a sweep.
#[derive(Clone, Debug)]
pub struct SweepParams {
    pub fuel: FuelSpec,
    /// Oxidizer composition, e.g. `O2:0.21,N2:0.79`.
    pub oxidizer: String,
    pub thresholds: ThresholdRules,
    pub ignition: IgnitionParams,
    pub flame: FlameSolveOptions,
    pub remaining_estimate: RemainingEstimate,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            fuel: FuelSpec::new("Hydrogen", "h2o2.yaml", "H2:1.0", false),
            oxidizer: "O2:0.21,N2:0.79".to_string(),
            thresholds: ThresholdRules::default(),
            ignition: IgnitionParams::default(),
            flame: FlameSolveOptions::default(),
            remaining_estimate: RemainingEstimate::default(),
        }
    }
}

/// Operating point and grid resolution of a centred sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepRequest {
    /// Initial temperature (K).
    pub temperature: f64,
    /// Initial pressure (atm).
    pub pressure: f64,
    pub phi: f64,
    /// Points per axis.
    pub grid_size: usize,
}

impl Default for SweepRequest {
    fn default() -> Self {
        Self {
            temperature: 900.0,
            pressure: 10.0,
            phi: 1.0,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

impl SweepRequest {
    /// Checks every input against its accepted range.
    pub fn validate(&self) -> Result<(), String> {
        check_range("temperature", self.temperature, TEMPERATURE_RANGE)?;
        check_range("pressure", self.pressure, PRESSURE_RANGE)?;
        check_range("phi", self.phi, PHI_RANGE)?;
        let (lo, hi) = GRID_SIZE_RANGE;
        if !(lo..=hi).contains(&self.grid_size) {
            return Err(format!(
                "grid size {} outside [{lo}, {hi}]",
                self.grid_size
            ));
        }
        Ok(())
    }

    /// `grid_size` samples over `[T-100, T+100]`, clipped to the accepted range.
    pub fn temperature_axis(&self) -> GridAxis {
        let (lo, hi) = TEMPERATURE_RANGE;
        GridAxis::linspace(
            (self.temperature - TEMPERATURE_SPAN).max(lo),
            (self.temperature + TEMPERATURE_SPAN).min(hi),
            self.grid_size,
        )
    }

    /// `grid_size` samples over `[P-5, P+5]`, clipped to the accepted range.
    pub fn pressure_axis(&self) -> GridAxis {
        let (lo, hi) = PRESSURE_RANGE;
        GridAxis::linspace(
            (self.pressure - PRESSURE_SPAN).max(lo),
            (self.pressure + PRESSURE_SPAN).min(hi),
            self.grid_size,
        )
    }
}

fn check_range(name: &str, value: f64, (lo, hi): (f64, f64)) -> Result<(), String> {
    if value.is_finite() && value >= lo && value <= hi {
        Ok(())
    } else {
        Err(format!("{name} {value} outside [{lo}, {hi}]"))
    }
}
