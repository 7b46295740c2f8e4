//! Finite-difference derivatives over non-uniformly spaced samples.

/// Derivative of `values` with respect to `coords`.
///
/// Interior points use the second-order central difference for uneven
/// spacing; the two end points use first-order one-sided differences. Returns
/// an empty vector when fewer than two samples are available or the slices
/// differ in length.
pub fn gradient(values: &[f64], coords: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 || coords.len() != n {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (coords[1] - coords[0]));
    for i in 1..n - 1 {
        let hs = coords[i] - coords[i - 1];
        let hd = coords[i + 1] - coords[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((values[n - 1] - values[n - 2]) / (coords[n - 1] - coords[n - 2]));
    out
}

/// Index of the largest finite element; the earliest index wins ties.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, _)| idx)
}
