//! Diagnostics data model for completed sweeps.
//!
//! [`SweepReport`] flattens a [`SweepResult`](crate::sweep::SweepResult) into
//! per-metric surfaces, the compensation audit trail and the timing trace, in
//! a shape that serializes to camelCase JSON.

pub mod report;
pub mod timing;

pub use report::{DetectionSummary, InputDescriptor, MetricSurface, SweepReport};
pub use timing::{StageTiming, TimingBreakdown};
