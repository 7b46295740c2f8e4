use crate::error::PointError;
use crate::types::Metric;
use serde::Serialize;

/// Metrics computed for one `(T, P, phi)` point.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Adiabatic flame temperature (K).
    pub t_ad: f64,
    /// Ignition delay (μs); zero when no ignition was observed.
    pub ignition_delay_us: f64,
    /// Laminar flame speed (m/s); zero when the flame solve failed.
    pub flame_speed: f64,
    pub no_ppm: f64,
    pub no2_ppm: f64,
    pub nox_ppm: f64,
    pub co_ppm: f64,
    pub co2_ppm: f64,
    /// Stage failures observed while evaluating the point.
    #[serde(skip)]
    pub failures: Vec<PointError>,
}

impl EvaluationResult {
    /// All-zero result used when the point could not be evaluated.
    pub fn zero() -> Self {
        Self::default()
    }

    pub(crate) fn degraded(error: PointError) -> Self {
        Self {
            failures: vec![error],
            ..Self::default()
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AdiabaticTemperature => self.t_ad,
            Metric::IgnitionDelay => self.ignition_delay_us,
            Metric::FlameSpeed => self.flame_speed,
            Metric::Nox => self.nox_ppm,
            Metric::Co => self.co_ppm,
            Metric::Co2 => self.co2_ppm,
        }
    }

    /// Whether any stage failed.
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether the point was abandoned and every metric is the zero fallback.
    pub fn is_failed(&self) -> bool {
        self.failures.iter().any(PointError::is_fatal)
    }
}
