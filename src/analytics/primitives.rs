//! Stateless numeric primitives shared by the analysis functions.
//!
//! Missing values are `NaN` throughout; every primitive here ignores them
//! unless stated otherwise.

use ordered_float::OrderedFloat;

/// Copies the non-missing values out of `values`.
pub fn valid_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean of available values, `NaN` if there are none.
pub fn mean(values: &[f64]) -> f64 {
    let valid = valid_values(values);
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Mean of a window that must be complete: any missing value yields `NaN`.
pub fn strict_mean(window: &[f64]) -> f64 {
    if window.is_empty() || window.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (divide by N-1) of available values.
///
/// Returns `NaN` with fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let valid = valid_values(values);
    if valid.len() < 2 {
        return f64::NAN;
    }

    let n = valid.len() as f64;
    let mean = valid.iter().sum::<f64>() / n;
    let sum_squared_diff: f64 = valid.iter().map(|&value| (value - mean).powi(2)).sum();

    (sum_squared_diff / (n - 1.0)).sqrt()
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `NaN` if no values are available.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = valid_values(values);
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by_key(|&v| OrderedFloat(v));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Pearson correlation over rows where both series are present.
///
/// Returns `NaN` with fewer than two complete pairs or when either side has
/// zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x == 0.0 || variance_y == 0.0 {
        return f64::NAN;
    }
    (covariance / (variance_x.sqrt() * variance_y.sqrt())).clamp(-1.0, 1.0)
}
