//! Per-metric thresholds and replacement multipliers.
use crate::types::Metric;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outlier threshold and repair multiplier for one metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    /// Cells with `|value| > threshold` are outliers. `+inf` disables the check.
    pub threshold: f64,
    /// Applied to the neighbour median when repairing.
    pub multiplier: f64,
    pub unit: String,
}

impl ThresholdRule {
    pub fn new(threshold: f64, multiplier: f64, unit: impl Into<String>) -> Self {
        Self {
            threshold,
            multiplier,
            unit: unit.into(),
        }
    }

    /// Rule used for a metric without configured thresholds.
    pub fn unbounded(metric: Metric) -> Self {
        Self::new(f64::INFINITY, 3.0, metric.unit())
    }

    /// Whether `value` passes the per-metric validity test (ignoring the zero rule).
    pub fn accepts(&self, metric: Metric, value: f64) -> bool {
        value.is_finite()
            && !(metric.is_rate_like() && value < 0.0)
            && value.abs() <= self.threshold
    }
}

/// Rule set for a sweep; immutable while the sweep runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdRules {
    rules: BTreeMap<Metric, ThresholdRule>,
}

impl Default for ThresholdRules {
    fn default() -> Self {
        let mut rules = BTreeMap::new();
        let defaults = [
            (Metric::AdiabaticTemperature, 3500.0),
            (Metric::IgnitionDelay, 100_000.0),
            (Metric::FlameSpeed, 100.0),
            (Metric::Nox, 5000.0),
            (Metric::Co, 50_000.0),
            (Metric::Co2, 200_000.0),
        ];
        for (metric, threshold) in defaults {
            rules.insert(metric, ThresholdRule::new(threshold, 3.0, metric.unit()));
        }
        Self { rules }
    }
}

impl ThresholdRules {
    /// Empty rule set; every metric falls back to [`ThresholdRule::unbounded`].
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn rule(&self, metric: Metric) -> ThresholdRule {
        self.rules
            .get(&metric)
            .cloned()
            .unwrap_or_else(|| ThresholdRule::unbounded(metric))
    }

    pub fn set(&mut self, metric: Metric, rule: ThresholdRule) {
        self.rules.insert(metric, rule);
    }
}
