use super::TimingBreakdown;
use crate::chemistry::FuelSpec;
use crate::compensation::{CompensationDiagnostics, CompensationRecord};
use crate::sweep::SweepResult;
use crate::types::{GridPoint, Metric};
use serde::Serialize;

/// Serializable summary of a completed sweep.
///
/// Undefined cells (NaN) serialize as `null`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub input: InputDescriptor,
    pub detection: DetectionSummary,
    pub surfaces: Vec<MetricSurface>,
    pub records: Vec<CompensationRecord>,
    pub timings: TimingBreakdown,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub fuel: FuelSpec,
    pub phi: f64,
    pub temperatures: Vec<f64>,
    pub pressures: Vec<f64>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub final_method: &'static str,
    pub fallback: bool,
    pub failed_points: usize,
    pub degraded_points: usize,
}

/// Compensated surface of one metric.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSurface {
    pub metric: Metric,
    pub unit: &'static str,
    pub points: Vec<GridPoint>,
    pub compensation: CompensationDiagnostics,
}

impl SweepReport {
    pub fn from_result(result: &SweepResult) -> Self {
        let surfaces = result
            .grids
            .iter()
            .map(|(&metric, grid)| MetricSurface {
                metric,
                unit: metric.unit(),
                points: grid.surface(&result.temperature_axis, &result.pressure_axis),
                compensation: result
                    .compensation
                    .get(&metric)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect();
        Self {
            input: InputDescriptor {
                fuel: result.fuel.clone(),
                phi: result.phi,
                temperatures: result.temperature_axis.values().to_vec(),
                pressures: result.pressure_axis.values().to_vec(),
            },
            detection: DetectionSummary {
                final_method: result.final_method.name(),
                fallback: result.detection_fallback,
                failed_points: result.failed_points,
                degraded_points: result.degraded_points,
            },
            surfaces,
            records: result.records.clone(),
            timings: result.timings.clone(),
        }
    }

    pub fn surface(&self, metric: Metric) -> Option<&MetricSurface> {
        self.surfaces.iter().find(|s| s.metric == metric)
    }

    pub fn print_text_summary(&self) {
        let input = &self.input;
        println!("Sweep summary");
        println!(
            "  fuel: {} ({}, {})",
            input.fuel.name, input.fuel.formula, input.fuel.mechanism
        );
        println!("  phi: {:.2}", input.phi);
        println!(
            "  grid: {} pressures x {} temperatures",
            input.pressures.len(),
            input.temperatures.len()
        );
        println!(
            "  detection: {}{}",
            self.detection.final_method,
            if self.detection.fallback {
                " (fallback)"
            } else {
                ""
            }
        );
        println!(
            "  failed points: {} degraded points: {}",
            self.detection.failed_points, self.detection.degraded_points
        );

        println!("\nSurfaces");
        for surface in &self.surfaces {
            let finite: Vec<f64> = surface
                .points
                .iter()
                .map(|p| p.value)
                .filter(|v| v.is_finite())
                .collect();
            let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let c = &surface.compensation;
            if finite.is_empty() {
                println!("  {:<15} no finite values", surface.metric.name());
            } else {
                println!(
                    "  {:<15} [{:.4e}, {:.4e}] {:<4} flagged={} repaired={} kept_zero={} undefined={}",
                    surface.metric.name(),
                    min,
                    max,
                    surface.unit,
                    c.flagged,
                    c.repaired,
                    c.kept_zero,
                    c.undefined
                );
            }
        }

        if !self.records.is_empty() {
            println!("\nCompensated values");
            for r in &self.records {
                println!(
                    "  {} at T={:.1}K P={:.2}atm: {:.4e} -> {:.4e} ({})",
                    r.metric, r.temperature, r.pressure, r.original, r.replacement, r.reason
                );
            }
        }

        let stages = self
            .timings
            .stages
            .iter()
            .map(|s| format!("{}={:.3}", s.label, s.elapsed_ms))
            .collect::<Vec<_>>()
            .join(" ");
        println!("\nTimings (ms): {stages} total={:.3}", self.timings.total_ms);
    }
}
