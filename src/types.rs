//! Core grid types shared by the evaluator, the compensator and the sweep.
//!
//! Grids are stored as `nalgebra::DMatrix<f64>` indexed `[pressure row][temperature column]`,
//! so a sweep over `n_t` temperatures and `n_p` pressures produces `n_p x n_t` matrices.
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value written to a cell that could not be repaired and has no physical fallback.
pub const UNDEFINED: f64 = f64::NAN;

/// Combustion metric computed for every grid point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "T_ad")]
    AdiabaticTemperature,
    #[serde(rename = "ignition_delay")]
    IgnitionDelay,
    #[serde(rename = "flame_speed")]
    FlameSpeed,
    #[serde(rename = "NOx")]
    Nox,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "CO2")]
    Co2,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::AdiabaticTemperature,
        Metric::IgnitionDelay,
        Metric::FlameSpeed,
        Metric::Nox,
        Metric::Co,
        Metric::Co2,
    ];

    /// Metrics produced by a sweep, in compensation order.
    pub fn sweep_order(has_carbon: bool) -> &'static [Metric] {
        if has_carbon {
            &Self::ALL
        } else {
            &Self::ALL[..4]
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::AdiabaticTemperature => "T_ad",
            Metric::IgnitionDelay => "ignition_delay",
            Metric::FlameSpeed => "flame_speed",
            Metric::Nox => "NOx",
            Metric::Co => "CO",
            Metric::Co2 => "CO2",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::AdiabaticTemperature => "K",
            Metric::IgnitionDelay => "μs",
            Metric::FlameSpeed => "m/s",
            Metric::Nox | Metric::Co | Metric::Co2 => "ppm",
        }
    }

    /// Rate-like metrics are physically non-negative and use 0 for "did not happen".
    pub fn is_rate_like(self) -> bool {
        matches!(self, Metric::IgnitionDelay | Metric::FlameSpeed)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ascending sample positions along one sweep dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridAxis {
    values: Vec<f64>,
}

impl GridAxis {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// `n` evenly spaced samples over `[lo, hi]`; `n == 1` yields `[lo]`.
    pub fn linspace(lo: f64, hi: f64, n: usize) -> Self {
        let values = match n {
            0 => Vec::new(),
            1 => vec![lo],
            _ => {
                let step = (hi - lo) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                    .collect()
            }
        };
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied()
    }
}

/// One cell of a metric surface expressed in axis coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPoint {
    pub temperature: f64,
    pub pressure: f64,
    pub value: f64,
}

/// 2-D metric values indexed `[pressure row][temperature column]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricGrid {
    values: DMatrix<f64>,
}

impl MetricGrid {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            values: DMatrix::zeros(rows, cols),
        }
    }

    /// Builds a grid from row-major data (`rows` pressures by `cols` temperatures).
    pub fn from_row_slice(rows: usize, cols: usize, data: &[f64]) -> Self {
        Self {
            values: DMatrix::from_row_slice(rows, cols, data),
        }
    }

    /// `(rows, cols)` == `(len(P-axis), len(T-axis))`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.shape()
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[(row, col)] = value;
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Up to eight in-bounds neighbours of `(row, col)`, excluding the cell itself.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = f64> + '_ {
        let (rows, cols) = self.shape();
        let r0 = row.saturating_sub(1);
        let c0 = col.saturating_sub(1);
        let r1 = (row + 1).min(rows.saturating_sub(1));
        let c1 = (col + 1).min(cols.saturating_sub(1));
        (r0..=r1)
            .flat_map(move |r| (c0..=c1).map(move |c| (r, c)))
            .filter(move |&(r, c)| r != row || c != col)
            .map(move |(r, c)| self.values[(r, c)])
    }

    /// Flattens the grid into `(T, P, value)` triples, rows first.
    pub fn surface(&self, t_axis: &GridAxis, p_axis: &GridAxis) -> Vec<GridPoint> {
        let mut points = Vec::with_capacity(self.rows() * self.cols());
        for (row, &pressure) in p_axis.values().iter().enumerate().take(self.rows()) {
            for (col, &temperature) in t_axis.values().iter().enumerate().take(self.cols()) {
                points.push(GridPoint {
                    temperature,
                    pressure,
                    value: self.get(row, col),
                });
            }
        }
        points
    }
}
