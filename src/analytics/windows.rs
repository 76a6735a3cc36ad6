//! Windowing strategies that supply slices to primitives.
//!
//! Each strategy reports its burn-in: how many leading (and, for centred
//! windows, trailing) positions cannot produce a value.

/// Common behavior shared by every windowing strategy.
pub trait WindowStrategy {
    /// The number of data points required before meaningful output can be produced.
    fn burn_in(&self) -> usize;
}

/// Trailing window over the `size` most recent rows, by position.
#[derive(Debug, Clone, Copy)]
pub struct FixedWindow {
    size: usize,
}

impl FixedWindow {
    /// Returns `None` for a zero-sized window.
    pub fn new(size: usize) -> Option<Self> {
        (size > 0).then_some(FixedWindow { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Applies the primitive to every full window ending at each index.
    ///
    /// The first `size - 1` outputs are `NaN`.
    pub fn apply<F>(&self, data: &[f64], mut primitive: F) -> Vec<f64>
    where
        F: FnMut(&[f64]) -> f64,
    {
        let mut result = Vec::with_capacity(data.len());
        for index in 0..data.len() {
            if index + 1 < self.size {
                result.push(f64::NAN);
            } else {
                result.push(primitive(&data[index + 1 - self.size..=index]));
            }
        }
        result
    }
}

impl WindowStrategy for FixedWindow {
    fn burn_in(&self) -> usize {
        self.size - 1
    }
}

/// Centred weighted window used for trend extraction.
///
/// An odd period averages `period` values with equal weight. An even period
/// uses `period + 1` values with half weight on both ends.
#[derive(Debug, Clone)]
pub struct CenteredWindow {
    weights: Vec<f64>,
}

impl CenteredWindow {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        let p = period as f64;
        let weights = if period % 2 == 0 {
            let mut weights = vec![1.0 / p; period + 1];
            weights[0] = 0.5 / p;
            weights[period] = 0.5 / p;
            weights
        } else {
            vec![1.0 / p; period]
        };
        CenteredWindow { weights }
    }

    /// Weighted sum centred on each index; `NaN` where the window does not fit.
    pub fn apply(&self, data: &[f64]) -> Vec<f64> {
        let half = self.burn_in();
        (0..data.len())
            .map(|index| {
                if index < half || index + half >= data.len() {
                    return f64::NAN;
                }
                data[index - half..=index + half]
                    .iter()
                    .zip(&self.weights)
                    .map(|(value, weight)| value * weight)
                    .sum()
            })
            .collect()
    }
}

impl WindowStrategy for CenteredWindow {
    /// Positions lost at each end of the series.
    fn burn_in(&self) -> usize {
        self.weights.len() / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::primitives::strict_mean;

    #[test]
    fn fixed_window_applies_primitive_to_full_windows() {
        let window = FixedWindow::new(3).unwrap();
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let result = window.apply(&data, |slice| slice.iter().sum());
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_eq!(&result[2..], &[6.0, 9.0]);
        assert_eq!(window.burn_in(), 2);
    }

    #[test]
    fn fixed_window_rejects_zero() {
        assert!(FixedWindow::new(0).is_none());
    }

    #[test]
    fn fixed_window_longer_than_data_is_all_nan() {
        let window = FixedWindow::new(5).unwrap();
        let result = window.apply(&[1.0, 2.0], strict_mean);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn centered_window_odd_period() {
        let window = CenteredWindow::new(3);
        let result = window.apply(&[3.0, 6.0, 9.0, 12.0]);
        assert!(result[0].is_nan());
        assert!((result[1] - 6.0).abs() < 1e-12);
        assert!((result[2] - 9.0).abs() < 1e-12);
        assert!(result[3].is_nan());
    }

    #[test]
    fn centered_window_even_period_uses_half_weights() {
        let window = CenteredWindow::new(4);
        assert_eq!(window.burn_in(), 2);
        let result = window.apply(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        // 0.125*1 + 0.25*(2+3+4) + 0.125*5
        assert!((result[2] - 3.0).abs() < 1e-12);
        assert!(result[1].is_nan());
        assert!(result[3].is_nan());
    }
}
