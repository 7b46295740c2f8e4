//! Ignition-delay extraction from constant-pressure reactor traces.
//!
//! The detector reads a trace of `(time, temperature, tracked species)`
//! samples and returns the time of the steepest rise, either of temperature
//! (`max_dTdt`) or of the tracked species mole fraction (`max_species`).
//!
//! Detection only runs when the trace holds more than three samples and the
//! temperature rose by more than the configured threshold; otherwise the point
//! did not ignite within the integration window and the delay is zero.
//!
//! Switching from `max_species` to `max_dTdt` is one-way: once the tracked
//! species turns out to be unavailable (absent from the mechanism, or missing
//! from part of a trace) the detector keeps using the temperature gradient for
//! every remaining point. The switch is an atomic flag so parallel workers all
//! observe it.

pub mod gradient;

use gradient::{argmax_first, gradient};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Signal used to locate ignition in a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Maximum temperature rise rate.
    #[serde(rename = "max_dTdt")]
    MaxTemperatureGradient,
    /// Maximum rise rate of a tracked intermediate species.
    #[serde(rename = "max_species")]
    MaxSpeciesGradient,
}

impl DetectionMethod {
    pub fn name(self) -> &'static str {
        match self {
            DetectionMethod::MaxTemperatureGradient => "max_dTdt",
            DetectionMethod::MaxSpeciesGradient => "max_species",
        }
    }
}

/// Ignition stage settings.
#[derive(Clone, Debug, PartialEq)]
pub struct IgnitionParams {
    /// Integration ceiling (s).
    pub end_time_s: f64,
    /// Minimum temperature rise above the initial temperature (K).
    pub temp_rise_threshold_k: f64,
    pub method: DetectionMethod,
    /// Species followed by `max_species` (e.g. OH, H, O, CO, CH2O).
    pub species: String,
    /// Upper bound on reactor steps per point.
    pub max_steps: usize,
}

impl Default for IgnitionParams {
    fn default() -> Self {
        Self {
            end_time_s: 0.1,
            temp_rise_threshold_k: 100.0,
            method: DetectionMethod::MaxTemperatureGradient,
            species: "OH".to_string(),
            max_steps: 100_000,
        }
    }
}

/// One reactor sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceSample {
    pub time: f64,
    pub temperature: f64,
    pub species: Option<f64>,
}

/// Transient reactor history for one grid point.
#[derive(Clone, Debug, PartialEq)]
pub struct IgnitionTrace {
    pub initial_temperature: f64,
    pub samples: Vec<TraceSample>,
}

impl IgnitionTrace {
    pub fn new(initial_temperature: f64) -> Self {
        Self {
            initial_temperature,
            samples: Vec::new(),
        }
    }

    pub fn push(&mut self, time: f64, temperature: f64, species: Option<f64>) {
        self.samples.push(TraceSample {
            time,
            temperature,
            species,
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.temperature).collect()
    }

    /// Species series, available only when every sample carries a value.
    pub fn species_series(&self) -> Option<Vec<f64>> {
        self.samples.iter().map(|s| s.species).collect()
    }

    /// Peak temperature minus the initial temperature.
    pub fn temperature_rise(&self) -> f64 {
        let peak = self
            .samples
            .iter()
            .map(|s| s.temperature)
            .fold(f64::NEG_INFINITY, f64::max);
        peak - self.initial_temperature
    }
}

/// Extracts ignition delays and owns the detection-method policy of a sweep.
#[derive(Debug)]
pub struct IgnitionDetector {
    requested: DetectionMethod,
    species: String,
    temp_rise_threshold_k: f64,
    fell_back: AtomicBool,
}

impl IgnitionDetector {
    pub fn new(params: &IgnitionParams) -> Self {
        Self {
            requested: params.method,
            species: params.species.clone(),
            temp_rise_threshold_k: params.temp_rise_threshold_k,
            fell_back: AtomicBool::new(false),
        }
    }

    /// Method currently in effect.
    pub fn active_method(&self) -> DetectionMethod {
        if self.fell_back.load(Ordering::Acquire) {
            DetectionMethod::MaxTemperatureGradient
        } else {
            self.requested
        }
    }

    pub fn has_fallen_back(&self) -> bool {
        self.fell_back.load(Ordering::Acquire)
    }

    /// Species to record while integrating, if the active method needs one.
    pub fn tracked_species(&self) -> Option<&str> {
        match self.active_method() {
            DetectionMethod::MaxSpeciesGradient => Some(&self.species),
            DetectionMethod::MaxTemperatureGradient => None,
        }
    }

    /// Permanently switches to `max_dTdt`. Only the first call logs.
    pub fn fall_back(&self, reason: &str) {
        if self.requested != DetectionMethod::MaxSpeciesGradient {
            return;
        }
        if self
            .fell_back
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            warn!(
                "Ignition detection: {reason}; switching from {} ('{}') to {} for the rest of the sweep",
                DetectionMethod::MaxSpeciesGradient.name(),
                self.species,
                DetectionMethod::MaxTemperatureGradient.name()
            );
        }
    }

    /// Ignition delay in seconds, or `0.0` when no ignition was observed.
    pub fn detect(&self, trace: &IgnitionTrace) -> f64 {
        let rise = trace.temperature_rise();
        if trace.len() <= 3 || rise.is_nan() || rise <= self.temp_rise_threshold_k {
            debug!(
                "Ignition detection skipped: samples={} rise={:.1}K threshold={:.1}K",
                trace.len(),
                rise,
                self.temp_rise_threshold_k
            );
            return 0.0;
        }

        let times = trace.times();
        let signal = match self.active_method() {
            DetectionMethod::MaxTemperatureGradient => trace.temperatures(),
            DetectionMethod::MaxSpeciesGradient => match trace.species_series() {
                Some(series) => series,
                None => {
                    self.fall_back(&format!("incomplete '{}' trace", self.species));
                    trace.temperatures()
                }
            },
        };

        argmax_first(&gradient(&signal, &times))
            .map(|idx| times[idx])
            .unwrap_or(0.0)
    }
}
