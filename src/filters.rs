//! The two fixed-window filters chained together in [`crate::gain_history`]
//! to smooth the raw per-frame gain sequence into something that won't pump
//! audibly from frame to frame.

use std::collections::VecDeque;

/// Sliding-window minimum. Holds no state of its own — every call considers
/// exactly the window handed to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MinimumFilter;

impl MinimumFilter {
    #[must_use]
    pub fn apply(&self, values: &VecDeque<f64>) -> f64 {
        values.iter().copied().fold(f64::MAX, f64::min)
    }
}

/// Gaussian-weighted moving average over a fixed window.
#[derive(Debug, Clone)]
pub struct GaussianFilter {
    filter_size: usize,
    weights: Vec<f64>,
}

impl GaussianFilter {
    /// `filter_size` must be odd and at least 1; `sigma` is the standard
    /// deviation derived from the filter size (see
    /// [`crate::config::Config::sigma`]). Both are already validated by the
    /// time `Config` hands them here, so violations are a programming error
    /// rather than user input and only get a debug assertion.
    #[must_use]
    pub fn new(filter_size: usize, sigma: f64) -> Self {
        debug_assert!(filter_size >= 1 && filter_size % 2 == 1);

        let offset = (filter_size / 2) as i64;
        let c1 = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
        let c2 = 2.0 * sigma.powi(2);

        let mut weights: Vec<f64> = (0..filter_size)
            .map(|i| {
                let x = (i as i64 - offset) as f64;
                c1 * (-(x * x) / c2).exp()
            })
            .collect();

        let total_weight: f64 = weights.iter().sum();
        let adjust = 1.0 / total_weight;
        for w in &mut weights {
            *w *= adjust;
        }

        Self { filter_size, weights }
    }

    /// # Panics
    ///
    /// Panics if `values.len() != filter_size`. The gain history only ever
    /// calls this with exactly `filter_size` entries, so a mismatch means a
    /// bug in this crate.
    #[must_use]
    pub fn apply(&self, values: &VecDeque<f64>) -> f64 {
        debug_assert_eq!(values.len(), self.filter_size);
        values
            .iter()
            .zip(self.weights.iter())
            .map(|(v, w)| v * w)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_filter_finds_smallest_value() {
        let filter = MinimumFilter;
        let values: VecDeque<f64> = VecDeque::from([3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(filter.apply(&values), 1.0);
    }

    #[test]
    fn gaussian_weights_sum_to_one() {
        let filter = GaussianFilter::new(31, 6.0);
        let sum: f64 = filter.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gaussian_filter_is_symmetric_for_symmetric_input() {
        let filter = GaussianFilter::new(5, 2.0);
        let values: VecDeque<f64> = VecDeque::from([1.0, 1.0, 1.0, 1.0, 1.0]);
        assert!((filter.apply(&values) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn gaussian_filter_weights_peak_at_center() {
        let filter = GaussianFilter::new(5, 2.0);
        let center = filter.weights[2];
        assert!(filter.weights.iter().all(|&w| w <= center));
    }
}
