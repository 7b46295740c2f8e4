//! Two-dimensional `(T, P)` parameter sweep.
//!
//! Modules
//! - [`params`] – settings object and centred-grid request.
//! - [`progress`] – progress sinks and time-remaining estimation.
//! - `pipeline` – the [`SweepDriver`].
//! - `result` – the [`SweepResult`] returned by a completed sweep.

pub mod params;
pub mod progress;
mod pipeline;
mod result;

pub use params::{SweepParams, SweepRequest, DEFAULT_GRID_SIZE};
pub use pipeline::SweepDriver;
pub use progress::{
    LogProgress, NoProgress, ProgressSink, ProgressTracker, RemainingEstimate, SweepProgress,
};
pub use result::SweepResult;
