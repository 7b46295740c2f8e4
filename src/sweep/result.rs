use crate::chemistry::FuelSpec;
use crate::compensation::{CompensationDiagnostics, CompensationRecord};
use crate::diagnostics::TimingBreakdown;
use crate::ignition::DetectionMethod;
use crate::types::{GridAxis, GridPoint, Metric, MetricGrid};
use std::collections::BTreeMap;

/// Compensated grids and everything observed while producing them.
#[derive(Clone, Debug)]
pub struct SweepResult {
    pub temperature_axis: GridAxis,
    pub pressure_axis: GridAxis,
    pub phi: f64,
    pub fuel: FuelSpec,
    /// Grids as evaluated, before compensation.
    pub raw_grids: BTreeMap<Metric, MetricGrid>,
    /// Compensated grids, one per metric produced for the fuel.
    pub grids: BTreeMap<Metric, MetricGrid>,
    /// Repairs in compensation order.
    pub records: Vec<CompensationRecord>,
    pub compensation: BTreeMap<Metric, CompensationDiagnostics>,
    pub timings: TimingBreakdown,
    /// Detection method in effect when the sweep finished.
    pub final_method: DetectionMethod,
    /// Whether `max_species` fell back to `max_dTdt` during the sweep.
    pub detection_fallback: bool,
    /// Points abandoned entirely and reported as all-zero.
    pub failed_points: usize,
    /// Points where at least one stage failed.
    pub degraded_points: usize,
}

impl SweepResult {
    /// `(len(P-axis), len(T-axis))`.
    pub fn shape(&self) -> (usize, usize) {
        (self.pressure_axis.len(), self.temperature_axis.len())
    }

    pub fn grid(&self, metric: Metric) -> Option<&MetricGrid> {
        self.grids.get(&metric)
    }

    /// Metrics produced by the sweep, in compensation order.
    pub fn metrics(&self) -> impl Iterator<Item = Metric> + '_ {
        self.grids.keys().copied()
    }

    /// Compensated `(T, P, value)` triples of one metric.
    pub fn surface(&self, metric: Metric) -> Option<Vec<GridPoint>> {
        self.grids
            .get(&metric)
            .map(|grid| grid.surface(&self.temperature_axis, &self.pressure_axis))
    }

    pub fn records_for(&self, metric: Metric) -> impl Iterator<Item = &CompensationRecord> {
        self.records.iter().filter(move |r| r.metric == metric)
    }
}
