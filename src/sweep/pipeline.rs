//! Sweep driver evaluating a `(T, P)` grid end-to-end.
//!
//! The [`SweepDriver`] walks the grid row-major (pressure rows, temperature
//! columns), evaluates every cell with a [`PointEvaluator`], then runs one
//! compensation pass per metric in a fixed order. A failing point never stops
//! the sweep; [`SweepError`] lists what does.
//!
//! Typical usage:
//! ```no_run
//! use combustion_sweep::chemistry::synthetic::SyntheticChemistry;
//! use combustion_sweep::sweep::{LogProgress, SweepDriver, SweepParams, SweepRequest};
//!
//! # fn example() -> Result<(), combustion_sweep::error::SweepError> {
//! let engine = SyntheticChemistry::default();
//! let driver = SweepDriver::new(SweepParams::default());
//! let result = driver.run_centered(&engine, &SweepRequest::default(), LogProgress)?;
//! println!("records: {}", result.records.len());
//! # Ok(())
//! # }
//! ```
use super::params::{SweepParams, SweepRequest};
use super::progress::{ProgressSink, ProgressTracker};
use super::result::SweepResult;
use crate::chemistry::ChemistryEngine;
use crate::compensation::compensate;
use crate::diagnostics::TimingBreakdown;
use crate::error::SweepError;
use crate::evaluator::{EvaluationResult, PointEvaluator};
use crate::ignition::IgnitionDetector;
use crate::types::{GridAxis, Metric, MetricGrid};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::time::Instant;

/// Drives point evaluation and compensation for one parameter set.
#[derive(Clone, Debug, Default)]
pub struct SweepDriver {
    params: SweepParams,
}

/// Raw grids being filled during evaluation.
struct GridAccumulator {
    grids: BTreeMap<Metric, MetricGrid>,
    failed_points: usize,
    degraded_points: usize,
}

impl GridAccumulator {
    fn new(metrics: &[Metric], rows: usize, cols: usize) -> Self {
        Self {
            grids: metrics
                .iter()
                .map(|&m| (m, MetricGrid::zeros(rows, cols)))
                .collect(),
            failed_points: 0,
            degraded_points: 0,
        }
    }

    fn store(&mut self, row: usize, col: usize, result: &EvaluationResult) {
        for (&metric, grid) in self.grids.iter_mut() {
            grid.set(row, col, result.value(metric));
        }
        if result.is_failed() {
            self.failed_points += 1;
        }
        if result.is_degraded() {
            self.degraded_points += 1;
        }
    }
}

impl SweepDriver {
    pub fn new(params: SweepParams) -> Self {
        Self { params }
    }

    /// Sweeps the grid centred on `request` (see [`SweepRequest::temperature_axis`]).
    ///
    /// The request is checked against the accepted ranges first, so the axes
    /// built from it are always ascending.
    pub fn run_centered<C, P>(
        &self,
        engine: &C,
        request: &SweepRequest,
        progress: P,
    ) -> Result<SweepResult, SweepError>
    where
        C: ChemistryEngine,
        P: ProgressSink,
    {
        request.validate().map_err(SweepError::InvalidRequest)?;
        let t_axis = request.temperature_axis();
        let p_axis = request.pressure_axis();
        self.run(engine, &t_axis, &p_axis, request.phi, progress)
    }

    /// Evaluates every `(T, P)` cell at `phi` and compensates the grids.
    pub fn run<C, P>(
        &self,
        engine: &C,
        t_axis: &GridAxis,
        p_axis: &GridAxis,
        phi: f64,
        mut progress: P,
    ) -> Result<SweepResult, SweepError>
    where
        C: ChemistryEngine,
        P: ProgressSink,
    {
        check_axes(t_axis, p_axis)?;
        let (rows, cols) = (p_axis.len(), t_axis.len());
        let total = rows * cols;
        let metrics = Metric::sweep_order(self.params.fuel.has_carbon);
        info!(
            "Sweep start fuel={} phi={phi} grid={}x{} ({} points)",
            self.params.fuel.name, rows, cols, total
        );
        let total_start = Instant::now();

        let detector = IgnitionDetector::new(&self.params.ignition);
        let evaluator = PointEvaluator::new(engine, &self.params, &detector);
        let mut tracker = ProgressTracker::new(total, self.params.remaining_estimate);
        let mut acc = GridAccumulator::new(metrics, rows, cols);

        let eval_start = Instant::now();
        for (row, &pressure) in p_axis.values().iter().enumerate() {
            for (col, &temperature) in t_axis.values().iter().enumerate() {
                if progress.is_cancelled() {
                    let completed = tracker.completed();
                    warn!("Sweep cancelled after {completed}/{total} points");
                    return Err(SweepError::Cancelled { completed, total });
                }
                let result = evaluator.evaluate(temperature, pressure, phi);
                acc.store(row, col, &result);
                progress.report(&tracker.record(temperature, pressure));
            }
        }
        let eval_ms = eval_start.elapsed().as_secs_f64() * 1000.0;

        Ok(self.finish(acc, &detector, t_axis, p_axis, phi, eval_ms, total_start))
    }

    /// Parallel variant of [`run`](Self::run); results are identical.
    #[cfg(feature = "parallel")]
    pub fn run_parallel<C, P>(
        &self,
        engine: &C,
        t_axis: &GridAxis,
        p_axis: &GridAxis,
        phi: f64,
        progress: P,
    ) -> Result<SweepResult, SweepError>
    where
        C: ChemistryEngine + Sync,
        P: ProgressSink + Send,
    {
        use rayon::prelude::*;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Mutex;

        check_axes(t_axis, p_axis)?;
        let (rows, cols) = (p_axis.len(), t_axis.len());
        let total = rows * cols;
        let metrics = Metric::sweep_order(self.params.fuel.has_carbon);
        info!(
            "Sweep start (parallel) fuel={} phi={phi} grid={}x{} ({} points)",
            self.params.fuel.name, rows, cols, total
        );
        let total_start = Instant::now();

        let detector = IgnitionDetector::new(&self.params.ignition);
        let evaluator = PointEvaluator::new(engine, &self.params, &detector);
        let shared = Mutex::new((
            progress,
            ProgressTracker::new(total, self.params.remaining_estimate),
        ));
        let cancelled = AtomicBool::new(false);

        let eval_start = Instant::now();
        let results: Vec<Option<EvaluationResult>> = (0..total)
            .into_par_iter()
            .map(|idx| {
                if cancelled.load(Ordering::Acquire) {
                    return None;
                }
                {
                    let guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                    if guard.0.is_cancelled() {
                        cancelled.store(true, Ordering::Release);
                        return None;
                    }
                }
                let (row, col) = (idx / cols, idx % cols);
                let (temperature, pressure) = (t_axis.values()[col], p_axis.values()[row]);
                let result = evaluator.evaluate(temperature, pressure, phi);
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                let (sink, tracker) = &mut *guard;
                let snapshot = tracker.record(temperature, pressure);
                sink.report(&snapshot);
                Some(result)
            })
            .collect();
        let eval_ms = eval_start.elapsed().as_secs_f64() * 1000.0;

        if cancelled.load(Ordering::Acquire) {
            let completed = results.iter().filter(|r| r.is_some()).count();
            warn!("Sweep cancelled after {completed}/{total} points");
            return Err(SweepError::Cancelled { completed, total });
        }

        let mut acc = GridAccumulator::new(metrics, rows, cols);
        for (idx, result) in results.iter().enumerate() {
            if let Some(result) = result {
                acc.store(idx / cols, idx % cols, result);
            }
        }
        Ok(self.finish(acc, &detector, t_axis, p_axis, phi, eval_ms, total_start))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        acc: GridAccumulator,
        detector: &IgnitionDetector,
        t_axis: &GridAxis,
        p_axis: &GridAxis,
        phi: f64,
        eval_ms: f64,
        total_start: Instant,
    ) -> SweepResult {
        let mut timings = TimingBreakdown::default();
        timings.push("evaluation", eval_ms);

        let mut grids = BTreeMap::new();
        let mut records = Vec::new();
        let mut compensation = BTreeMap::new();
        for &metric in Metric::sweep_order(self.params.fuel.has_carbon) {
            let Some(raw) = acc.grids.get(&metric) else {
                continue;
            };
            let start = Instant::now();
            let rule = self.params.thresholds.rule(metric);
            let pass = compensate(raw, metric, &rule, t_axis, p_axis);
            debug!(
                "Compensation {metric}: flagged={} repaired={} kept_zero={} undefined={}",
                pass.diagnostics.flagged,
                pass.diagnostics.repaired,
                pass.diagnostics.kept_zero,
                pass.diagnostics.undefined
            );
            timings.push(
                format!("compensate.{metric}"),
                start.elapsed().as_secs_f64() * 1000.0,
            );
            records.extend(pass.records);
            grids.insert(metric, pass.grid);
            compensation.insert(metric, pass.diagnostics);
        }
        timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;

        info!(
            "Sweep done in {:.1} ms: {} repairs, {} failed points, {} degraded points, method={}",
            timings.total_ms,
            records.len(),
            acc.failed_points,
            acc.degraded_points,
            detector.active_method().name()
        );

        SweepResult {
            temperature_axis: t_axis.clone(),
            pressure_axis: p_axis.clone(),
            phi,
            fuel: self.params.fuel.clone(),
            raw_grids: acc.grids,
            grids,
            records,
            compensation,
            timings,
            final_method: detector.active_method(),
            detection_fallback: detector.has_fallen_back(),
            failed_points: acc.failed_points,
            degraded_points: acc.degraded_points,
        }
    }
}

fn check_axes(t_axis: &GridAxis, p_axis: &GridAxis) -> Result<(), SweepError> {
    if t_axis.is_empty() {
        return Err(SweepError::EmptyAxis("temperature"));
    }
    if p_axis.is_empty() {
        return Err(SweepError::EmptyAxis("pressure"));
    }
    Ok(())
}
