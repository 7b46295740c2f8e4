//! Failure taxonomy for point evaluation and sweeps.
//!
//! Point-level errors never escape the evaluator's public entry point; they
//! are logged and folded into the degraded all-zero result. They are kept as
//! typed values so stage outcomes can be counted and tested.
use crate::chemistry::ChemistryError;
use thiserror::Error;

/// Failure observed while evaluating a single grid point.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PointError {
    /// The mixture composition could not be set, even after one retry.
    #[error("composition could not be set: {0}")]
    Composition(ChemistryError),
    /// HP equilibrium failed; equilibrium metrics fall back to zero.
    #[error("equilibrium failed: {0}")]
    Equilibrium(ChemistryError),
    /// A reactor step failed and truncated the ignition trace.
    #[error("reactor step failed at t={time_s:.3e}s: {source}")]
    IntegrationStep {
        time_s: f64,
        source: ChemistryError,
    },
    /// The free-flame solve failed or produced a non-physical velocity.
    #[error("flame solve failed: {0}")]
    FlameSolve(String),
    /// The tracked ignition species is not part of the active mechanism.
    #[error("species '{0}' is not available in the active mechanism")]
    SpeciesUnavailable(String),
    /// The chemistry collaborator panicked.
    #[error("chemistry collaborator panicked: {0}")]
    Panicked(String),
}

impl PointError {
    /// Whether the failure aborted the whole point rather than one stage.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PointError::Composition(_) | PointError::Panicked(_))
    }
}

/// Failure that stops a sweep before complete grids can be returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SweepError {
    #[error("invalid sweep request: {0}")]
    InvalidRequest(String),
    #[error("{0} axis has no samples")]
    EmptyAxis(&'static str),
    #[error("sweep cancelled after {completed}/{total} points")]
    Cancelled { completed: usize, total: usize },
}
