use super::{ChemistryError, FlameSolveOptions};

/// Entry point of a chemistry-kinetics backend.
pub trait ChemistryEngine {
    type Gas: GasState;
    type Reactor: IgnitionReactor;

    /// Fresh gas-phase state for `mechanism`.
    fn solution(&self, mechanism: &str) -> Result<Self::Gas, ChemistryError>;

    /// Wraps a copy of `gas` in an adiabatic constant-pressure well-stirred reactor.
    fn const_pressure_reactor(&self, gas: &Self::Gas) -> Result<Self::Reactor, ChemistryError>;

    /// Solves a steady premixed free flame for the unburned state `gas` and
    /// returns the inlet velocity (m/s).
    fn solve_free_flame(
        &self,
        gas: &Self::Gas,
        options: &FlameSolveOptions,
    ) -> Result<f64, ChemistryError>;
}

/// Thermodynamic state of a gas mixture.
pub trait GasState: Clone {
    /// Sets temperature (K) and pressure (Pa), keeping composition.
    fn set_tp(&mut self, temperature: f64, pressure_pa: f64);

    /// Sets the composition of a fuel/oxidizer blend at equivalence ratio `phi`.
    fn set_equivalence_ratio(
        &mut self,
        phi: f64,
        fuel: &str,
        oxidizer: &str,
    ) -> Result<(), ChemistryError>;

    /// Equilibrates at fixed enthalpy and pressure.
    fn equilibrate_hp(&mut self) -> Result<(), ChemistryError>;

    fn temperature(&self) -> f64;

    /// Mole fraction of `species`, or `None` when the mechanism lacks it.
    fn mole_fraction(&self, species: &str) -> Option<f64>;

    fn has_species(&self, species: &str) -> bool {
        self.mole_fraction(species).is_some()
    }
}

/// Constant-pressure reactor advanced one adaptive step at a time.
pub trait IgnitionReactor {
    /// Takes one internal step and returns the new reactor time (s).
    fn step(&mut self) -> Result<f64, ChemistryError>;

    fn temperature(&self) -> f64;

    fn mole_fraction(&self, species: &str) -> Option<f64>;
}
