#![doc = include_str!("../README.md")]

// Public modules
pub mod chemistry;
pub mod compensation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod ignition;
pub mod io;
pub mod sweep;
pub mod types;

// --- High-level re-exports -------------------------------------------------

// Main entry points: driver, settings and results.
pub use crate::sweep::{SweepDriver, SweepParams, SweepRequest, SweepResult};
pub use crate::types::{GridAxis, Metric, MetricGrid};

// Report returned to tools.
pub use crate::diagnostics::SweepReport;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use combustion_sweep::prelude::*;
///
/// # fn main() -> Result<(), SweepError> {
/// let engine = SyntheticChemistry::default();
/// let driver = SweepDriver::new(SweepParams::default());
/// let result = driver.run_centered(&engine, &SweepRequest::default(), NoProgress)?;
/// let report = SweepReport::from_result(&result);
/// println!("repairs={} total_ms={:.3}", report.records.len(), report.timings.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::chemistry::synthetic::SyntheticChemistry;
    pub use crate::chemistry::{ChemistryEngine, FuelSpec};
    pub use crate::error::SweepError;
    pub use crate::sweep::{LogProgress, NoProgress, ProgressSink};
    pub use crate::{GridAxis, Metric, SweepDriver, SweepParams, SweepReport, SweepRequest};
}
