//! Scripted chemistry engine with per-point failure injection.
#![allow(dead_code)]

use combustion_sweep::chemistry::{
    ChemistryEngine, ChemistryError, FlameSolveOptions, GasState, IgnitionReactor, ONE_ATM,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reactor time step (s).
pub const DT: f64 = 1e-4;
/// Temperature rise across ignition (K).
pub const RISE: f64 = 1000.0;

/// Behaviour of the engine at one `(T K, P atm)` point.
#[derive(Clone, Debug)]
pub struct PointScript {
    /// Leading `set_equivalence_ratio` calls that fail.
    pub composition_failures: usize,
    pub equilibrium_fails: bool,
    pub t_ad: f64,
    pub no_ppm: f64,
    pub no2_ppm: f64,
    pub co_ppm: f64,
    pub co2_ppm: f64,
    /// Reactor step index at which ignition is centred; `None` never ignites.
    pub ignition_step: Option<usize>,
    pub reactor_fails: bool,
    /// Steps that succeed before every further step fails.
    pub step_fail_after: Option<usize>,
    pub flame: Result<f64, String>,
    /// Panics while setting the composition, aborting the whole point.
    pub panic: bool,
    pub equilibrium_panics: bool,
    pub flame_panics: bool,
}

impl PointScript {
    pub fn healthy(temperature: f64) -> Self {
        Self {
            composition_failures: 0,
            equilibrium_fails: false,
            t_ad: temperature + 1500.0,
            no_ppm: 100.0,
            no2_ppm: 10.0,
            co_ppm: 1000.0,
            co2_ppm: 100_000.0,
            ignition_step: Some(40),
            reactor_fails: false,
            step_fail_after: None,
            flame: Ok(0.5),
            panic: false,
            equilibrium_panics: false,
            flame_panics: false,
        }
    }
}

type Script = dyn Fn(f64, f64) -> PointScript + Send + Sync;

#[derive(Clone)]
pub struct MockChemistry {
    species: Arc<Vec<String>>,
    script: Arc<Script>,
    composition_calls: Arc<AtomicUsize>,
}

impl MockChemistry {
    /// Every point behaves like [`PointScript::healthy`].
    pub fn healthy() -> Self {
        Self::scripted(|t, _p| PointScript::healthy(t))
    }

    pub fn scripted<F>(script: F) -> Self
    where
        F: Fn(f64, f64) -> PointScript + Send + Sync + 'static,
    {
        let species = ["H2", "O2", "N2", "H2O", "OH", "NO", "NO2", "CH4", "CO", "CO2"];
        Self {
            species: Arc::new(species.iter().map(|s| s.to_string()).collect()),
            script: Arc::new(script),
            composition_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Removes a species from the mechanism.
    pub fn without_species(mut self, name: &str) -> Self {
        Arc::make_mut(&mut self.species).retain(|s| s != name);
        self
    }

    pub fn composition_calls(&self) -> usize {
        self.composition_calls.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct MockGas {
    engine: MockChemistry,
    temperature: f64,
    script: PointScript,
    composition_failures_left: usize,
    equilibrated: bool,
}

impl ChemistryEngine for MockChemistry {
    type Gas = MockGas;
    type Reactor = MockReactor;

    fn solution(&self, mechanism: &str) -> Result<MockGas, ChemistryError> {
        if mechanism != "mock.yaml" {
            return Err(ChemistryError::UnknownMechanism(mechanism.to_string()));
        }
        Ok(MockGas {
            engine: self.clone(),
            temperature: 300.0,
            script: PointScript::healthy(300.0),
            composition_failures_left: 0,
            equilibrated: false,
        })
    }

    fn const_pressure_reactor(&self, gas: &MockGas) -> Result<MockReactor, ChemistryError> {
        if gas.script.reactor_fails {
            return Err(ChemistryError::Integration("reactor setup".into()));
        }
        Ok(MockReactor {
            species: self.species.clone(),
            initial_temperature: gas.temperature,
            script: gas.script.clone(),
            steps: 0,
        })
    }

    fn solve_free_flame(
        &self,
        gas: &MockGas,
        _options: &FlameSolveOptions,
    ) -> Result<f64, ChemistryError> {
        if gas.script.flame_panics {
            let grid: Vec<f64> = Vec::new();
            return Ok(grid[0]);
        }
        gas.script.flame.clone().map_err(ChemistryError::Flame)
    }
}

impl GasState for MockGas {
    fn set_tp(&mut self, temperature: f64, pressure_pa: f64) {
        self.temperature = temperature;
        self.script = (self.engine.script)(temperature, pressure_pa / ONE_ATM);
        self.composition_failures_left = self.script.composition_failures;
        self.equilibrated = false;
    }

    fn set_equivalence_ratio(
        &mut self,
        _phi: f64,
        _fuel: &str,
        _oxidizer: &str,
    ) -> Result<(), ChemistryError> {
        self.engine.composition_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.panic {
            panic!("scripted collaborator panic");
        }
        if self.composition_failures_left > 0 {
            self.composition_failures_left -= 1;
            return Err(ChemistryError::Composition("scripted failure".into()));
        }
        Ok(())
    }

    fn equilibrate_hp(&mut self) -> Result<(), ChemistryError> {
        if self.script.equilibrium_panics {
            panic!("scripted equilibrium panic");
        }
        if self.script.equilibrium_fails {
            return Err(ChemistryError::Equilibrium("scripted failure".into()));
        }
        self.temperature = self.script.t_ad;
        self.equilibrated = true;
        Ok(())
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn mole_fraction(&self, species: &str) -> Option<f64> {
        if !self.engine.species.iter().any(|s| s == species) {
            return None;
        }
        if !self.equilibrated {
            return Some(0.0);
        }
        let ppm = match species {
            "NO" => self.script.no_ppm,
            "NO2" => self.script.no2_ppm,
            "CO" => self.script.co_ppm,
            "CO2" => self.script.co2_ppm,
            _ => 0.0,
        };
        Some(ppm * 1e-6)
    }
}

pub struct MockReactor {
    species: Arc<Vec<String>>,
    initial_temperature: f64,
    script: PointScript,
    steps: usize,
}

impl MockReactor {
    fn progress(&self) -> f64 {
        match self.script.ignition_step {
            Some(center) => {
                let x = self.steps as f64 - center as f64;
                1.0 / (1.0 + (-x).exp())
            }
            None => 0.0,
        }
    }
}

impl IgnitionReactor for MockReactor {
    fn step(&mut self) -> Result<f64, ChemistryError> {
        if let Some(limit) = self.script.step_fail_after {
            if self.steps >= limit {
                return Err(ChemistryError::Integration("scripted step failure".into()));
            }
        }
        self.steps += 1;
        Ok(self.steps as f64 * DT)
    }

    fn temperature(&self) -> f64 {
        self.initial_temperature + RISE * self.progress()
    }

    fn mole_fraction(&self, species: &str) -> Option<f64> {
        if !self.species.iter().any(|s| s == species) {
            return None;
        }
        Some(1e-3 * self.progress())
    }
}
