//! Progress reporting and time-remaining estimation.
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// How the time remaining is extrapolated from per-point durations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainingEstimate {
    /// Mean duration of all completed points.
    #[default]
    SimpleAverage,
    /// Exponential moving average; `alpha` weights the most recent point.
    Exponential { alpha: f64 },
}

/// Snapshot emitted after every evaluated point.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepProgress {
    pub completed: usize,
    pub total: usize,
    pub elapsed_s: f64,
    pub remaining_s: f64,
    /// Coordinates of the point just finished.
    pub temperature: f64,
    pub pressure: f64,
}

impl SweepProgress {
    /// Completed share in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl fmt::Display for SweepProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calculation: {}/{} points ({:.0}%) | Remaining: {:.0}s",
            self.completed,
            self.total,
            self.fraction() * 100.0,
            self.remaining_s
        )
    }
}

/// Receives progress from the sweep driver.
pub trait ProgressSink {
    fn report(&mut self, progress: &SweepProgress);

    /// Polled between points; returning `true` stops the sweep.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Discards progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: &SweepProgress) {}
}

/// Logs every progress snapshot at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, progress: &SweepProgress) {
        info!("{progress}");
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn report(&mut self, progress: &SweepProgress) {
        (**self).report(progress);
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// Counts completed points and extrapolates the remaining time.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: usize,
    estimate: RemainingEstimate,
    started: Instant,
    last: Instant,
    average_s: Option<f64>,
}

impl ProgressTracker {
    pub fn new(total: usize, estimate: RemainingEstimate) -> Self {
        let now = Instant::now();
        Self {
            total,
            completed: 0,
            estimate,
            started: now,
            last: now,
            average_s: None,
        }
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Marks one point done, timing it against the previous call.
    pub fn record(&mut self, temperature: f64, pressure: f64) -> SweepProgress {
        let now = Instant::now();
        let duration = now.duration_since(self.last).as_secs_f64();
        self.last = now;
        let elapsed = now.duration_since(self.started).as_secs_f64();
        self.record_duration(duration, elapsed, temperature, pressure)
    }

    fn record_duration(
        &mut self,
        duration_s: f64,
        elapsed_s: f64,
        temperature: f64,
        pressure: f64,
    ) -> SweepProgress {
        self.completed = (self.completed + 1).min(self.total);
        let average = match (self.estimate, self.average_s) {
            (_, None) => duration_s,
            (RemainingEstimate::SimpleAverage, Some(_)) => elapsed_s / self.completed as f64,
            (RemainingEstimate::Exponential { alpha }, Some(prev)) => {
                let alpha = alpha.clamp(0.0, 1.0);
                alpha * duration_s + (1.0 - alpha) * prev
            }
        };
        self.average_s = Some(average);
        let remaining_points = self.total - self.completed;
        SweepProgress {
            completed: self.completed,
            total: self.total,
            elapsed_s,
            remaining_s: average * remaining_points as f64,
            temperature,
            pressure,
        }
    }
}
