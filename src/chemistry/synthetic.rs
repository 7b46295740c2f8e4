//! Correlation-based surrogate chemistry backend.
//!
//! `SyntheticChemistry` implements the collaborator traits with closed-form
//! empirical correlations so that sweeps can run without a kinetics library:
//!
//! - adiabatic temperature from a per-fuel stoichiometric rise, shaped by the
//!   equivalence ratio and softly saturated to mimic dissociation;
//! - ignition delay `tau = A * P^-n * phi^-0.3 * exp(Ta / T0)`, with the reactor
//!   temperature following a logistic rise centred on `tau`;
//! - laminar flame speed `S = S0 * (T0/298)^a * P^-b * exp(-(phi-phi_pk)^2 / 2w^2)`,
//!   failing outside the flammable band.
//!
//! The numbers are plausible, not predictive.
use super::{
    parse_composition, ChemistryEngine, ChemistryError, FlameSolveOptions, GasState,
    IgnitionReactor, ONE_ATM,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const H2O2_SPECIES: &[&str] = &["H2", "H", "O", "O2", "OH", "H2O", "HO2", "H2O2", "AR", "N2"];

const GRI30_SPECIES: &[&str] = &[
    "H2", "H", "O", "O2", "OH", "H2O", "HO2", "H2O2", "C", "CH", "CH2", "CH2(S)", "CH3", "CH4",
    "CO", "CO2", "HCO", "CH2O", "CH2OH", "CH3O", "CH3OH", "C2H", "C2H2", "C2H3", "C2H4", "C2H5",
    "C2H6", "HCCO", "CH2CO", "HCCOH", "N", "NH", "NH2", "NH3", "NNH", "NO", "NO2", "N2O", "HNO",
    "CN", "HCN", "H2CN", "HCNN", "HCNO", "HOCN", "HNCO", "NCO", "N2", "AR", "C3H7", "C3H8",
    "CH2CHO", "CH3CHO",
];

/// Empirical constants describing one fuel species.
#[derive(Clone, Debug, PartialEq)]
pub struct FuelProperties {
    pub carbon_atoms: u32,
    /// Moles of O2 per mole of fuel at stoichiometry.
    pub o2_per_fuel: f64,
    /// Temperature rise at stoichiometry in air (K).
    pub heat_release_k: f64,
    pub activation_temperature_k: f64,
    pub pre_exponential_s: f64,
    pub pressure_exponent: f64,
    /// Laminar flame speed at 298 K, 1 atm, peak equivalence ratio (m/s).
    pub flame_speed_ref: f64,
    pub flame_temperature_exponent: f64,
    pub flame_pressure_exponent: f64,
    pub phi_peak: f64,
    pub phi_width: f64,
}

#[allow(clippy::too_many_arguments)]
fn props(
    carbon_atoms: u32,
    o2_per_fuel: f64,
    heat_release_k: f64,
    activation_temperature_k: f64,
    pre_exponential_s: f64,
    pressure_exponent: f64,
    flame: [f64; 5],
) -> FuelProperties {
    FuelProperties {
        carbon_atoms,
        o2_per_fuel,
        heat_release_k,
        activation_temperature_k,
        pre_exponential_s,
        pressure_exponent,
        flame_speed_ref: flame[0],
        flame_temperature_exponent: flame[1],
        flame_pressure_exponent: flame[2],
        phi_peak: flame[3],
        phi_width: flame[4],
    }
}

/// Surrogate backend with the `h2o2.yaml` and `gri30.yaml` species sets.
#[derive(Clone, Debug)]
pub struct SyntheticChemistry {
    mechanisms: HashMap<String, Arc<Vec<String>>>,
    fuels: Arc<HashMap<String, FuelProperties>>,
}

impl Default for SyntheticChemistry {
    fn default() -> Self {
        let mut engine = Self {
            mechanisms: HashMap::new(),
            fuels: Arc::new(HashMap::new()),
        };
        engine.add_mechanism("h2o2.yaml", H2O2_SPECIES);
        engine.add_mechanism("gri30.yaml", GRI30_SPECIES);

        let table = [
            ("H2", props(0, 0.5, 2100.0, 9_500.0, 7.5e-8, 1.0, [2.1, 1.5, 0.1, 1.8, 0.8])),
            ("CH4", props(1, 2.0, 1930.0, 23_000.0, 1.3e-11, 0.8, [0.37, 1.8, 0.5, 1.05, 0.3])),
            ("CO", props(1, 0.5, 2100.0, 20_000.0, 5e-10, 0.8, [0.2, 1.7, 0.3, 2.0, 0.6])),
            ("CH3OH", props(1, 1.5, 1950.0, 19_000.0, 6e-10, 0.9, [0.45, 1.8, 0.35, 1.1, 0.3])),
            ("C2H2", props(2, 2.5, 2300.0, 15_000.0, 2e-9, 0.8, [1.5, 1.6, 0.3, 1.3, 0.45])),
            ("C2H4", props(2, 3.0, 2100.0, 17_000.0, 1e-9, 0.8, [0.7, 1.7, 0.35, 1.1, 0.4])),
            ("C2H6", props(2, 3.5, 1960.0, 20_000.0, 1.5e-10, 0.8, [0.43, 1.8, 0.4, 1.1, 0.33])),
            ("NH3", props(0, 0.75, 1500.0, 26_000.0, 3e-12, 0.9, [0.07, 2.0, 0.4, 1.1, 0.2])),
            ("C3H8", props(3, 5.0, 1980.0, 21_000.0, 8e-11, 0.8, [0.43, 1.8, 0.4, 1.1, 0.33])),
        ];
        for (species, p) in table {
            engine.add_fuel(species, p);
        }
        engine
    }
}

impl SyntheticChemistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a mechanism species set.
    pub fn add_mechanism(&mut self, name: &str, species: &[&str]) {
        let list = species.iter().map(|s| s.to_string()).collect();
        self.mechanisms.insert(name.to_string(), Arc::new(list));
    }

    /// Registers (or replaces) the correlation constants of a fuel species.
    pub fn add_fuel(&mut self, species: &str, properties: FuelProperties) {
        Arc::make_mut(&mut self.fuels).insert(species.to_string(), properties);
    }
}

#[derive(Clone, Debug)]
struct Mixture {
    fuel: FuelProperties,
    phi: f64,
    o2_fraction: f64,
    n2_fraction: f64,
    fuel_fraction: f64,
}

/// Gas state produced by [`SyntheticChemistry`].
#[derive(Clone, Debug)]
pub struct SyntheticGas {
    species: Arc<Vec<String>>,
    fuels: Arc<HashMap<String, FuelProperties>>,
    temperature: f64,
    pressure_pa: f64,
    mixture: Option<Mixture>,
    mole_fractions: BTreeMap<String, f64>,
}

impl SyntheticGas {
    fn knows(&self, species: &str) -> bool {
        self.species.iter().any(|s| s == species)
    }
}

impl GasState for SyntheticGas {
    fn set_tp(&mut self, temperature: f64, pressure_pa: f64) {
        self.temperature = temperature;
        self.pressure_pa = pressure_pa;
    }

    fn set_equivalence_ratio(
        &mut self,
        phi: f64,
        fuel: &str,
        oxidizer: &str,
    ) -> Result<(), ChemistryError> {
        if !(phi.is_finite() && phi > 0.0) {
            return Err(ChemistryError::Composition(format!(
                "equivalence ratio must be positive, got {phi}"
            )));
        }
        let fuel_parts = parse_composition(fuel)?;
        let oxidizer_parts = parse_composition(oxidizer)?;
        for (name, _) in fuel_parts.iter().chain(oxidizer_parts.iter()) {
            if !self.knows(name) {
                return Err(ChemistryError::Composition(format!(
                    "species '{name}' is not part of the mechanism"
                )));
            }
        }
        let (fuel_name, _) = &fuel_parts[0];
        let props = self.fuels.get(fuel_name).cloned().ok_or_else(|| {
            ChemistryError::Composition(format!("no correlation data for fuel '{fuel_name}'"))
        })?;

        let total: f64 = oxidizer_parts.iter().map(|(_, a)| a).sum();
        if total <= 0.0 {
            return Err(ChemistryError::Composition(format!(
                "oxidizer '{oxidizer}' has no material"
            )));
        }
        let amount = |species: &str| {
            oxidizer_parts
                .iter()
                .filter(|(n, _)| n == species)
                .map(|(_, a)| a / total)
                .sum::<f64>()
        };
        let o2_fraction = amount("O2");
        if o2_fraction <= 0.0 {
            return Err(ChemistryError::Composition(
                "oxidizer contains no O2".to_string(),
            ));
        }
        let n2_fraction = amount("N2");

        // Fuel moles per mole of oxidizer blend.
        let fuel_moles = phi * o2_fraction / props.o2_per_fuel;
        let fuel_fraction = fuel_moles / (1.0 + fuel_moles);

        self.mole_fractions.clear();
        self.mole_fractions.insert(fuel_name.clone(), fuel_fraction);
        for (name, a) in &oxidizer_parts {
            *self.mole_fractions.entry(name.clone()).or_insert(0.0) +=
                a / total * (1.0 - fuel_fraction);
        }
        self.mixture = Some(Mixture {
            fuel: props,
            phi,
            o2_fraction,
            n2_fraction,
            fuel_fraction,
        });
        Ok(())
    }

    fn equilibrate_hp(&mut self) -> Result<(), ChemistryError> {
        let mix = self
            .mixture
            .clone()
            .ok_or_else(|| ChemistryError::Equilibrium("composition not set".to_string()))?;
        let t_ad = adiabatic_temperature(self.temperature, &mix);

        let mut x = BTreeMap::new();
        let lean = (1.0 / mix.phi).min(1.5);
        let no = 0.6 * mix.n2_fraction * (-21_000.0 / t_ad).exp() * lean;
        x.insert("NO".to_string(), no);
        x.insert("NO2".to_string(), 0.03 * no);
        if mix.fuel.carbon_atoms > 0 {
            let carbon = mix.fuel.carbon_atoms as f64 * mix.fuel_fraction;
            let rich = (mix.phi - 1.0).max(0.0) / mix.phi;
            let co_share = (rich + 8.0 * (-15_000.0 / t_ad).exp()).min(1.0);
            x.insert("CO".to_string(), carbon * co_share);
            x.insert("CO2".to_string(), carbon * (1.0 - co_share));
        }
        x.insert("N2".to_string(), mix.n2_fraction * (1.0 - mix.fuel_fraction));
        x.retain(|name, _| self.knows(name));

        self.mole_fractions = x;
        self.temperature = t_ad;
        Ok(())
    }

    fn temperature(&self) -> f64 {
        self.temperature
    }

    fn mole_fraction(&self, species: &str) -> Option<f64> {
        if !self.knows(species) {
            return None;
        }
        Some(self.mole_fractions.get(species).copied().unwrap_or(0.0))
    }
}

fn adiabatic_temperature(t0: f64, mix: &Mixture) -> f64 {
    let shape = if mix.phi <= 1.0 {
        mix.phi
    } else {
        (1.0 - 0.35 * (mix.phi - 1.0)).max(0.1)
    };
    let enrichment = (mix.o2_fraction / 0.21).powf(0.35);
    let raw = t0 + mix.fuel.heat_release_k * shape * enrichment;
    raw / (1.0 + (raw / 3300.0).powi(6)).powf(1.0 / 6.0)
}

/// Reactor produced by [`SyntheticChemistry`].
#[derive(Clone, Debug)]
pub struct SyntheticReactor {
    species: Arc<Vec<String>>,
    t0: f64,
    t_burnt: f64,
    tau: f64,
    width: f64,
    time: f64,
}

impl SyntheticReactor {
    fn progress(&self) -> f64 {
        let z = (self.time - self.tau) / self.width;
        1.0 / (1.0 + (-z).exp())
    }

    /// Gaussian radical pulse centred `offset` widths after `tau`.
    fn pulse(&self, peak: f64, offset: f64) -> f64 {
        let z = (self.time - self.tau - offset * self.width) / (2.0 * self.width);
        peak * (-z * z).exp()
    }
}

impl IgnitionReactor for SyntheticReactor {
    fn step(&mut self) -> Result<f64, ChemistryError> {
        let near = (self.time - self.tau).abs() < 5.0 * self.width;
        let dt = if near {
            0.2 * self.width
        } else if self.time > self.tau {
            (0.01 * self.tau).max(0.1 * (self.time - self.tau))
        } else {
            0.01 * self.tau
        };
        self.time += dt;
        Ok(self.time)
    }

    fn temperature(&self) -> f64 {
        self.t0 + (self.t_burnt - self.t0) * self.progress()
    }

    fn mole_fraction(&self, species: &str) -> Option<f64> {
        if !self.species.iter().any(|s| s == species) {
            return None;
        }
        let x = match species {
            "OH" => self.pulse(5e-3, 1.0),
            "H" => self.pulse(3e-3, 0.5),
            "O" => self.pulse(2e-3, 1.0),
            "CH2O" => self.pulse(1e-3, -2.0),
            "CO" => self.pulse(2e-2, 0.0),
            _ => 0.0,
        };
        Some(x)
    }
}

impl ChemistryEngine for SyntheticChemistry {
    type Gas = SyntheticGas;
    type Reactor = SyntheticReactor;

    fn solution(&self, mechanism: &str) -> Result<SyntheticGas, ChemistryError> {
        let species = self
            .mechanisms
            .get(mechanism)
            .cloned()
            .ok_or_else(|| ChemistryError::UnknownMechanism(mechanism.to_string()))?;
        Ok(SyntheticGas {
            species,
            fuels: Arc::clone(&self.fuels),
            temperature: 300.0,
            pressure_pa: ONE_ATM,
            mixture: None,
            mole_fractions: BTreeMap::new(),
        })
    }

    fn const_pressure_reactor(&self, gas: &SyntheticGas) -> Result<SyntheticReactor, ChemistryError> {
        let mix = gas
            .mixture
            .as_ref()
            .ok_or_else(|| ChemistryError::Integration("composition not set".to_string()))?;
        let p_atm = gas.pressure_pa / ONE_ATM;
        let fuel = &mix.fuel;
        let tau = fuel.pre_exponential_s
            * p_atm.powf(-fuel.pressure_exponent)
            * mix.phi.powf(-0.3)
            * (fuel.activation_temperature_k / gas.temperature).exp();
        if !tau.is_finite() || tau <= 0.0 {
            return Err(ChemistryError::Integration(format!(
                "degenerate ignition time scale {tau}"
            )));
        }
        Ok(SyntheticReactor {
            species: Arc::clone(&gas.species),
            t0: gas.temperature,
            t_burnt: adiabatic_temperature(gas.temperature, mix),
            tau,
            width: 0.01 * tau,
            time: 0.0,
        })
    }

    fn solve_free_flame(
        &self,
        gas: &SyntheticGas,
        options: &FlameSolveOptions,
    ) -> Result<f64, ChemistryError> {
        if options.width_m.is_nan() || options.width_m <= 0.0 {
            return Err(ChemistryError::Flame(format!(
                "domain width must be positive, got {}",
                options.width_m
            )));
        }
        let mix = gas
            .mixture
            .as_ref()
            .ok_or_else(|| ChemistryError::Flame("composition not set".to_string()))?;
        let fuel = &mix.fuel;
        let d = mix.phi - fuel.phi_peak;
        let shape = (-(d * d) / (2.0 * fuel.phi_width * fuel.phi_width)).exp();
        if shape < 0.05 {
            return Err(ChemistryError::Flame(format!(
                "no converged flame at phi={:.2} (outside flammable band)",
                mix.phi
            )));
        }
        let p_atm = gas.pressure_pa / ONE_ATM;
        let enrichment = (mix.o2_fraction / 0.21).powf(1.5);
        Ok(fuel.flame_speed_ref
            * (gas.temperature / 298.0).powf(fuel.flame_temperature_exponent)
            * p_atm.powf(-fuel.flame_pressure_exponent)
            * shape
            * enrichment)
    }
}
