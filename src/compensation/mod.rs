//! Neighbour-median outlier compensation for completed metric grids.
//!
//! A cell is an outlier when it is non-finite, negative (ignition delay and
//! flame speed only), or larger in magnitude than the metric threshold. For
//! the rate-like metrics a zero is also treated as an outlier when any of its
//! up-to-eight neighbours holds a valid non-zero value: an isolated zero next
//! to active combustion is presumed to be a solver failure rather than a true
//! non-ignition.
//!
//! Outliers are replaced by `median(valid neighbours) * multiplier`, clamped
//! to the threshold (and to `>= 0` for rate-like metrics). Cells without valid
//! neighbours are left at zero (rate-like metrics) or marked [`UNDEFINED`]; no
//! record is emitted for them.
//!
//! The pass reads only from the input grid and writes into a separate output,
//! so a repaired value never serves as evidence for another cell.
//!
//! Note: the isolated-zero rule fires on *any* non-zero neighbour, so a single
//! ignited cell can pull repairs into a genuinely non-igniting region next to
//! it. The rule is kept as is for compatibility with existing result sets.
//! It also means a second pass is a no-op only for non-rate metrics, or when
//! no zero borders a cell the first pass repaired: such a zero now has a
//! non-zero neighbour and is repaired in turn.

mod rules;

pub use rules::{ThresholdRule, ThresholdRules};

use crate::types::{GridAxis, Metric, MetricGrid, UNDEFINED};
use log::{info, warn};
use serde::Serialize;
use std::fmt;

/// Absolute tolerance under which a rate-like value counts as zero.
pub const ZERO_TOLERANCE: f64 = 1e-9;

/// Why a cell was flagged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierReason {
    NonFinite,
    Negative,
    AboveThreshold,
    IsolatedZero,
}

impl fmt::Display for OutlierReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            OutlierReason::NonFinite => "non-finite value",
            OutlierReason::Negative => "negative value",
            OutlierReason::AboveThreshold => "extreme value",
            OutlierReason::IsolatedZero => "zero beside non-zero neighbours",
        };
        f.write_str(text)
    }
}

/// Audit entry for one repaired cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationRecord {
    pub metric: Metric,
    pub temperature: f64,
    pub pressure: f64,
    pub original: f64,
    pub replacement: f64,
    pub reason: OutlierReason,
}

/// Counters describing one compensation pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationDiagnostics {
    pub total: usize,
    pub flagged: usize,
    pub repaired: usize,
    /// Rate-like outliers without evidence, left at zero.
    pub kept_zero: usize,
    /// Outliers without evidence set to the undefined sentinel.
    pub undefined: usize,
    pub threshold: f64,
    pub multiplier: f64,
}

/// Output of [`compensate`].
#[derive(Clone, Debug)]
pub struct Compensation {
    pub grid: MetricGrid,
    pub records: Vec<CompensationRecord>,
    pub diagnostics: CompensationDiagnostics,
}

fn is_near_zero(value: f64) -> bool {
    value.abs() <= ZERO_TOLERANCE
}

fn classify(
    snapshot: &MetricGrid,
    row: usize,
    col: usize,
    metric: Metric,
    rule: &ThresholdRule,
) -> Option<OutlierReason> {
    let value = snapshot.get(row, col);
    if !value.is_finite() {
        return Some(OutlierReason::NonFinite);
    }
    if metric.is_rate_like() && value < 0.0 {
        return Some(OutlierReason::Negative);
    }
    if value.abs() > rule.threshold {
        return Some(OutlierReason::AboveThreshold);
    }
    if metric.is_rate_like()
        && is_near_zero(value)
        && snapshot
            .neighbors(row, col)
            .any(|n| !is_near_zero(n) && rule.accepts(metric, n))
    {
        return Some(OutlierReason::IsolatedZero);
    }
    None
}

fn repair_evidence(
    snapshot: &MetricGrid,
    row: usize,
    col: usize,
    metric: Metric,
    rule: &ThresholdRule,
) -> Vec<f64> {
    snapshot
        .neighbors(row, col)
        .filter(|&n| rule.accepts(metric, n))
        .filter(|&n| !(metric.is_rate_like() && is_near_zero(n)))
        .collect()
}

/// Median of a non-empty sample; the mean of the two middle values for even counts.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        0.5 * (values[mid - 1] + values[mid])
    } else {
        values[mid]
    })
}

/// Repairs outliers in `grid` (rows = pressure, columns = temperature).
pub fn compensate(
    grid: &MetricGrid,
    metric: Metric,
    rule: &ThresholdRule,
    t_axis: &GridAxis,
    p_axis: &GridAxis,
) -> Compensation {
    debug_assert_eq!(grid.shape(), (p_axis.len(), t_axis.len()));
    let (rows, cols) = grid.shape();
    let mut out = grid.clone();
    let mut records = Vec::new();
    let mut diag = CompensationDiagnostics {
        total: rows * cols,
        threshold: rule.threshold,
        multiplier: rule.multiplier,
        ..Default::default()
    };

    for row in 0..rows {
        for col in 0..cols {
            let Some(reason) = classify(grid, row, col, metric, rule) else {
                continue;
            };
            diag.flagged += 1;
            let original = grid.get(row, col);
            let temperature = t_axis.get(col).unwrap_or(f64::NAN);
            let pressure = p_axis.get(row).unwrap_or(f64::NAN);
            if reason == OutlierReason::IsolatedZero {
                info!(
                    "Zero {metric} at T={temperature}K, P={pressure}atm flagged: non-zero neighbours present"
                );
            }

            let mut evidence = repair_evidence(grid, row, col, metric, rule);
            match median(&mut evidence) {
                Some(med) => {
                    let mut replacement = med * rule.multiplier;
                    if rule.threshold.is_finite() && replacement > rule.threshold {
                        replacement = rule.threshold;
                    }
                    if metric.is_rate_like() && replacement < 0.0 {
                        replacement = 0.0;
                    }
                    out.set(row, col, replacement);
                    diag.repaired += 1;
                    info!(
                        "Compensated {metric} at T={temperature}K, P={pressure}atm: {original:.2e} -> {replacement:.2e} ({reason}, multiplier={}, threshold={})",
                        rule.multiplier, rule.threshold
                    );
                    records.push(CompensationRecord {
                        metric,
                        temperature,
                        pressure,
                        original,
                        replacement,
                        reason,
                    });
                }
                None if metric.is_rate_like() => {
                    out.set(row, col, 0.0);
                    diag.kept_zero += 1;
                    warn!(
                        "Could not compensate {metric} at [{row},{col}] (T={temperature}K, P={pressure}atm): no valid neighbours, original {original:.2e}, keeping 0"
                    );
                }
                None => {
                    out.set(row, col, UNDEFINED);
                    diag.undefined += 1;
                    warn!(
                        "Could not compensate {metric} at [{row},{col}] (T={temperature}K, P={pressure}atm): no valid neighbours, original {original:.2e}, marked undefined"
                    );
                }
            }
        }
    }

    Compensation {
        grid: out,
        records,
        diagnostics: diag,
    }
}
