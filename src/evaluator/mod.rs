//! Per-point evaluation of combustion metrics.
//!
//! [`PointEvaluator::evaluate`] never fails: the three stages (equilibrium,
//! ignition delay, flame speed) are isolated from one another, each behind its
//! own panic guard, and anything that prevents the point from being set up at
//! all degrades it to the all-zero [`EvaluationResult`] with an error log. [`PointEvaluator::try_evaluate`]
//! exposes the underlying `Result` for callers that want the failure.
//!
//! Stage policy:
//! - composition setting is retried once before the point is abandoned;
//! - an equilibrium failure zeroes T_ad and the emissions only;
//! - a failing reactor step truncates the ignition trace, detection proceeds
//!   on the samples collected so far;
//! - a failing or non-physical flame solve reports a flame speed of zero;
//! - a stage that panics zeroes only its own metrics.

mod result;

pub use result::EvaluationResult;

use crate::chemistry::{ChemistryEngine, ChemistryError, GasState, IgnitionReactor, ONE_ATM};
use crate::error::PointError;
use crate::ignition::{IgnitionDetector, IgnitionTrace};
use crate::sweep::SweepParams;
use crate::types::Metric;
use log::{debug, error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Evaluates grid points for one sweep configuration.
pub struct PointEvaluator<'a, C: ChemistryEngine> {
    engine: &'a C,
    params: &'a SweepParams,
    detector: &'a IgnitionDetector,
}

struct Equilibrium {
    t_ad: f64,
    no_ppm: f64,
    no2_ppm: f64,
    co_ppm: f64,
    co2_ppm: f64,
}

impl<'a, C: ChemistryEngine> PointEvaluator<'a, C> {
    pub fn new(engine: &'a C, params: &'a SweepParams, detector: &'a IgnitionDetector) -> Self {
        Self {
            engine,
            params,
            detector,
        }
    }

    /// Computes every metric at `(temperature K, pressure atm, phi)`.
    pub fn evaluate(&self, temperature: f64, pressure: f64, phi: f64) -> EvaluationResult {
        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.try_evaluate(temperature, pressure, phi)));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                error!(
                    "General calculation error for T={temperature}K, P={pressure}atm, phi={phi}: {err}"
                );
                EvaluationResult::degraded(err)
            }
            Err(payload) => {
                let err = PointError::Panicked(panic_message(payload.as_ref()));
                error!(
                    "General calculation error for T={temperature}K, P={pressure}atm, phi={phi}: {err}"
                );
                EvaluationResult::degraded(err)
            }
        }
    }

    /// Like [`evaluate`](Self::evaluate) but surfaces point-level failures.
    pub fn try_evaluate(
        &self,
        temperature: f64,
        pressure: f64,
        phi: f64,
    ) -> Result<EvaluationResult, PointError> {
        let fuel = &self.params.fuel;
        let mut gas = self
            .engine
            .solution(&fuel.mechanism)
            .map_err(PointError::Composition)?;
        gas.set_tp(temperature, pressure * ONE_ATM);
        self.set_composition(&mut gas, phi)?;

        let mut result = EvaluationResult::zero();

        let equilibrium = guarded(|| self.equilibrium(&gas)).unwrap_or_else(|msg| {
            Err(PointError::Equilibrium(ChemistryError::Equilibrium(format!(
                "panicked: {msg}"
            ))))
        });
        match equilibrium {
            Ok(eq) => {
                result.t_ad = eq.t_ad;
                result.no_ppm = eq.no_ppm;
                result.no2_ppm = eq.no2_ppm;
                result.nox_ppm = eq.no_ppm + eq.no2_ppm;
                result.co_ppm = eq.co_ppm;
                result.co2_ppm = eq.co2_ppm;
            }
            Err(err) => {
                warn!(
                    "Equilibrium failed for T={temperature}K, P={pressure}atm, phi={phi}: {err}"
                );
                result.failures.push(err);
            }
        }

        let ignition = guarded(|| self.ignition_delay(&gas, temperature, &mut result.failures));
        let delay_s = match ignition {
            Ok(delay_s) => delay_s,
            Err(msg) => {
                warn!("Ignition stage panicked at T={temperature}K, P={pressure}atm: {msg}");
                result.failures.push(PointError::IntegrationStep {
                    time_s: 0.0,
                    source: ChemistryError::Integration(format!("panicked: {msg}")),
                });
                0.0
            }
        };
        result.ignition_delay_us = delay_s * 1e6;

        let flame = guarded(|| self.flame_speed(&gas, &mut result.failures));
        result.flame_speed = match flame {
            Ok(velocity) => velocity,
            Err(msg) => {
                warn!("Flame solver panicked: {msg}; setting flame speed to 0");
                result.failures.push(PointError::FlameSolve(format!("panicked: {msg}")));
                0.0
            }
        };

        self.log_zero_metrics(&result, temperature, pressure, phi);
        Ok(result)
    }

    fn set_composition(&self, gas: &mut C::Gas, phi: f64) -> Result<(), PointError> {
        let fuel = &self.params.fuel;
        let oxidizer = &self.params.oxidizer;
        if let Err(first) = gas.set_equivalence_ratio(phi, &fuel.formula, oxidizer) {
            error!("Composition error: {first}; retrying");
            gas.set_equivalence_ratio(phi, &fuel.formula, oxidizer)
                .map_err(PointError::Composition)?;
        }
        Ok(())
    }

    fn equilibrium(&self, gas: &C::Gas) -> Result<Equilibrium, PointError> {
        let mut burnt = gas.clone();
        burnt.equilibrate_hp().map_err(PointError::Equilibrium)?;
        let ppm = |species: &str| burnt.mole_fraction(species).unwrap_or(0.0) * 1e6;
        let (co_ppm, co2_ppm) = if self.params.fuel.has_carbon {
            (ppm("CO"), ppm("CO2"))
        } else {
            (0.0, 0.0)
        };
        Ok(Equilibrium {
            t_ad: burnt.temperature(),
            no_ppm: ppm("NO"),
            no2_ppm: ppm("NO2"),
            co_ppm,
            co2_ppm,
        })
    }

    /// Integrates the reactor and returns the detected delay in seconds.
    fn ignition_delay(
        &self,
        gas: &C::Gas,
        initial_temperature: f64,
        failures: &mut Vec<PointError>,
    ) -> f64 {
        let params = &self.params.ignition;
        if let Some(species) = self.detector.tracked_species() {
            if !gas.has_species(species) {
                self.detector.fall_back(&format!(
                    "species '{species}' not found in mechanism '{}'",
                    self.params.fuel.mechanism
                ));
                failures.push(PointError::SpeciesUnavailable(species.to_string()));
            }
        }
        let tracked = self.detector.tracked_species();

        let mut reactor = match self.engine.const_pressure_reactor(gas) {
            Ok(reactor) => reactor,
            Err(err) => {
                warn!("Reactor setup failed at T={initial_temperature}K: {err}");
                failures.push(PointError::IntegrationStep {
                    time_s: 0.0,
                    source: err,
                });
                return 0.0;
            }
        };

        let mut trace = IgnitionTrace::new(initial_temperature);
        let mut time = 0.0;
        let mut steps = 0usize;
        while time < params.end_time_s && steps < params.max_steps {
            match reactor.step() {
                Ok(t) => time = t,
                Err(err) => {
                    warn!("Reactor step failed at time {time:.2e}s (T0={initial_temperature}K): {err}");
                    failures.push(PointError::IntegrationStep {
                        time_s: time,
                        source: err,
                    });
                    break;
                }
            }
            steps += 1;
            let species = tracked.and_then(|s| reactor.mole_fraction(s));
            trace.push(time, reactor.temperature(), species);
        }
        if steps >= params.max_steps && time < params.end_time_s {
            warn!(
                "Reactor stopped after {steps} steps at t={time:.2e}s before end time {:.2e}s",
                params.end_time_s
            );
        }

        self.detector.detect(&trace)
    }

    fn flame_speed(&self, gas: &C::Gas, failures: &mut Vec<PointError>) -> f64 {
        match self.engine.solve_free_flame(gas, &self.params.flame) {
            Ok(velocity) if velocity.is_finite() && velocity > 0.0 => velocity,
            Ok(velocity) => {
                warn!("Flame speed calculation yielded non-positive velocity {velocity}; setting to 0");
                failures.push(PointError::FlameSolve(format!(
                    "non-positive velocity {velocity}"
                )));
                0.0
            }
            Err(err) => {
                warn!("Flame solver failed: {err}; setting flame speed to 0");
                failures.push(PointError::FlameSolve(err.to_string()));
                0.0
            }
        }
    }

    fn log_zero_metrics(&self, result: &EvaluationResult, t: f64, p: f64, phi: f64) {
        for &metric in Metric::sweep_order(self.params.fuel.has_carbon) {
            // CO2 may legitimately be zero.
            if metric != Metric::Co2 && result.value(metric) == 0.0 {
                debug!(
                    "Parameter '{metric}' is 0 for T={t}K, P={p}atm, phi={phi}; possible solver failure"
                );
            }
        }
    }
}

/// Runs one stage, turning a panic into its message.
fn guarded<T>(stage: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(stage))
        .map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
