use super::catalog;
use crate::chemistry::{parse_composition, FlameSolveOptions, FuelSpec};
use crate::compensation::{ThresholdRule, ThresholdRules};
use crate::ignition::{DetectionMethod, IgnitionParams};
use crate::sweep::{RemainingEstimate, SweepParams, SweepRequest};
use crate::types::Metric;
use log::warn;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// JSON configuration of a sweep run. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub fuel: Option<FuelSelection>,
    /// Catalog label or explicit composition string.
    pub oxidizer: Option<String>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub phi: Option<f64>,
    pub grid_size: Option<usize>,
    pub ignition: IgnitionConfig,
    pub flame: FlameConfig,
    pub thresholds: BTreeMap<Metric, ThresholdOverride>,
    pub remaining_estimate: Option<RemainingEstimate>,
    pub output: OutputConfig,
}

/// Fuel given by catalog label or spelled out.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FuelSelection {
    Catalog(String),
    Custom {
        name: String,
        mechanism: String,
        formula: String,
        has_carbon: bool,
    },
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct IgnitionConfig {
    pub end_time: Option<f64>,
    pub temp_threshold: Option<f64>,
    pub method: Option<DetectionMethod>,
    pub species: Option<String>,
    pub max_steps: Option<usize>,
}

impl IgnitionConfig {
    pub fn resolve(&self) -> IgnitionParams {
        let defaults = IgnitionParams::default();
        IgnitionParams {
            end_time_s: self.end_time.unwrap_or(defaults.end_time_s),
            temp_rise_threshold_k: self
                .temp_threshold
                .unwrap_or(defaults.temp_rise_threshold_k),
            method: self.method.unwrap_or(defaults.method),
            species: self.species.clone().unwrap_or(defaults.species),
            max_steps: self.max_steps.unwrap_or(defaults.max_steps),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct FlameConfig {
    pub width: Option<f64>,
    pub refine_ratio: Option<f64>,
    pub refine_slope: Option<f64>,
    pub refine_curve: Option<f64>,
    pub max_jac_age: Option<usize>,
    pub time_step: Option<f64>,
}

impl FlameConfig {
    pub fn resolve(&self) -> FlameSolveOptions {
        let defaults = FlameSolveOptions::default();
        FlameSolveOptions {
            width_m: self.width.unwrap_or(defaults.width_m),
            refine_ratio: self.refine_ratio.unwrap_or(defaults.refine_ratio),
            refine_slope: self.refine_slope.unwrap_or(defaults.refine_slope),
            refine_curve: self.refine_curve.unwrap_or(defaults.refine_curve),
            max_jac_age_steady: self.max_jac_age.unwrap_or(defaults.max_jac_age_steady),
            max_jac_age_transient: self
                .max_jac_age
                .unwrap_or(defaults.max_jac_age_transient),
            initial_time_step_s: self.time_step.unwrap_or(defaults.initial_time_step_s),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ThresholdOverride {
    pub threshold: Option<f64>,
    pub multiplier: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_json: Option<PathBuf>,
}

/// Validated settings ready to drive a sweep.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub params: SweepParams,
    pub request: SweepRequest,
}

impl SweepConfig {
    /// Applies overrides on top of the defaults and validates the result.
    pub fn resolve(&self) -> Result<ResolvedConfig, String> {
        let defaults = SweepParams::default();
        let fuel = match &self.fuel {
            None => defaults.fuel,
            Some(FuelSelection::Catalog(name)) => catalog::fuel(name).ok_or_else(|| {
                let known: Vec<&str> = catalog::fuel_names().collect();
                format!("Unknown fuel '{name}' (known: {})", known.join(", "))
            })?,
            Some(FuelSelection::Custom {
                name,
                mechanism,
                formula,
                has_carbon,
            }) => FuelSpec::new(name.as_str(), mechanism.as_str(), formula.as_str(), *has_carbon),
        };
        parse_composition(&fuel.formula)
            .map_err(|e| format!("Invalid fuel formula '{}': {e}", fuel.formula))?;

        let oxidizer = match &self.oxidizer {
            None => defaults.oxidizer,
            Some(value) => catalog::oxidizer(value)
                .map(str::to_string)
                .unwrap_or_else(|| value.clone()),
        };
        parse_composition(&oxidizer)
            .map_err(|e| format!("Invalid oxidizer '{oxidizer}': {e}"))?;

        let mut thresholds = defaults.thresholds;
        for (&metric, overrides) in &self.thresholds {
            let base = thresholds.rule(metric);
            let rule = ThresholdRule::new(
                overrides.threshold.unwrap_or(base.threshold),
                overrides.multiplier.unwrap_or(base.multiplier),
                base.unit,
            );
            if rule.threshold.is_nan() || rule.threshold <= 0.0 {
                return Err(format!("Threshold for {metric} must be positive"));
            }
            if !rule.multiplier.is_finite() || rule.multiplier <= 0.0 {
                return Err(format!("Multiplier for {metric} must be finite and positive"));
            }
            thresholds.set(metric, rule);
        }

        let ignition = self.ignition.resolve();
        validate_ignition(&ignition)?;
        let flame = self.flame.resolve();
        if !flame.width_m.is_finite() || flame.width_m <= 0.0 {
            return Err(format!("Flame width {} must be positive", flame.width_m));
        }

        let remaining_estimate = self.remaining_estimate.unwrap_or(defaults.remaining_estimate);
        if let RemainingEstimate::Exponential { alpha } = remaining_estimate {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(format!("Exponential estimate alpha {alpha} outside (0, 1]"));
            }
        }

        let base_request = SweepRequest::default();
        let request = SweepRequest {
            temperature: self.temperature.unwrap_or(base_request.temperature),
            pressure: self.pressure.unwrap_or(base_request.pressure),
            phi: self.phi.unwrap_or(base_request.phi),
            grid_size: self.grid_size.unwrap_or(base_request.grid_size),
        };
        request.validate()?;

        Ok(ResolvedConfig {
            params: SweepParams {
                fuel,
                oxidizer,
                thresholds,
                ignition,
                flame,
                remaining_estimate,
            },
            request,
        })
    }
}

fn validate_ignition(params: &IgnitionParams) -> Result<(), String> {
    if !params.end_time_s.is_finite() || params.end_time_s <= 0.0 {
        return Err(format!(
            "Ignition end time {} must be positive",
            params.end_time_s
        ));
    }
    if params.temp_rise_threshold_k.is_nan() || params.temp_rise_threshold_k < 0.0 {
        return Err(format!(
            "Ignition temperature threshold {} must be non-negative",
            params.temp_rise_threshold_k
        ));
    }
    if params.max_steps == 0 {
        return Err("Ignition max_steps must be at least 1".to_string());
    }
    if params.species.trim().is_empty() {
        return Err("Ignition species must not be empty".to_string());
    }
    if params.method == DetectionMethod::MaxSpeciesGradient
        && !catalog::IGNITION_SPECIES.contains(&params.species.as_str())
    {
        warn!(
            "Ignition species '{}' is not one of {:?}",
            params.species,
            catalog::IGNITION_SPECIES
        );
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<SweepConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
