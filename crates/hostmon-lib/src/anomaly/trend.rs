//! Trend-residual anomaly detection
//!
//! Fits a linear trend (`predicted = w * index + b`) to the series by
//! full-batch gradient descent on mean-squared error, then flags points
//! whose residual from the fitted trend is large relative to the mean
//! residual. A short window of near-linear drift approximates "normal";
//! spikes and drops break from it and get flagged.
//!
//! The fit is a heuristic, not an exact statistic: the hyperparameters are
//! fixed and the weights are zero-initialized, so results are reproducible,
//! but the flag is approximate by nature.

use super::MIN_SERIES_LEN;

/// Fixed gradient-descent step size
const DEFAULT_LEARNING_RATE: f64 = 0.05;

/// Fixed number of full-batch iterations
const DEFAULT_ITERATIONS: usize = 500;

/// Residuals exceeding this multiple of the mean residual are anomalous
const DEFAULT_RESIDUAL_RATIO: f64 = 1.2;

/// A mean residual below this fits the series essentially exactly; in that
/// case no point is flagged (floating-point noise is not an anomaly)
const EXACT_FIT_EPSILON: f64 = 1e-9;

/// Flags points that deviate sharply from an iteratively fitted linear trend
#[derive(Debug, Clone)]
pub struct TrendDetector {
    pub learning_rate: f64,
    pub iterations: usize,
    /// Multiple of the mean residual beyond which a point is flagged
    pub residual_ratio: f64,
}

/// Fitted trend parameters over the standardized index feature
#[derive(Debug, Clone, Copy)]
pub struct TrendFit {
    pub weight: f64,
    pub intercept: f64,
}

impl TrendDetector {
    pub fn new(learning_rate: f64, iterations: usize, residual_ratio: f64) -> Self {
        Self {
            learning_rate,
            iterations,
            residual_ratio,
        }
    }

    /// Return the indices of points that break from the fitted trend
    ///
    /// A series shorter than two points has no defined trend and yields no
    /// anomalies.
    pub fn detect(&self, series: &[f64]) -> Vec<usize> {
        if series.len() < MIN_SERIES_LEN {
            return Vec::new();
        }

        let features = standardized_index(series.len());
        let fit = self.fit(&features, series);

        let residuals: Vec<f64> = features
            .iter()
            .zip(series)
            .map(|(x, y)| (y - (fit.weight * x + fit.intercept)).abs())
            .collect();

        let mean_residual = residuals.iter().sum::<f64>() / residuals.len() as f64;
        if mean_residual < EXACT_FIT_EPSILON {
            return Vec::new();
        }

        let cutoff = mean_residual * self.residual_ratio;
        residuals
            .iter()
            .enumerate()
            .filter(|(_, r)| **r > cutoff)
            .map(|(i, _)| i)
            .collect()
    }

    /// Gradient descent on MSE, zero-initialized weight and intercept
    ///
    /// The index feature is standardized, which keeps the fixed step size
    /// stable regardless of series length.
    fn fit(&self, features: &[f64], series: &[f64]) -> TrendFit {
        let n = series.len() as f64;
        let mut weight = 0.0;
        let mut intercept = 0.0;

        for _ in 0..self.iterations {
            let mut grad_w = 0.0;
            let mut grad_b = 0.0;

            for (x, y) in features.iter().zip(series) {
                let error = (weight * x + intercept) - y;
                grad_w += error * x;
                grad_b += error;
            }
            grad_w *= 2.0 / n;
            grad_b *= 2.0 / n;

            weight -= self.learning_rate * grad_w;
            intercept -= self.learning_rate * grad_b;
        }

        TrendFit { weight, intercept }
    }
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            iterations: DEFAULT_ITERATIONS,
            residual_ratio: DEFAULT_RESIDUAL_RATIO,
        }
    }
}

/// Series indices centered and scaled to unit variance
fn standardized_index(len: usize) -> Vec<f64> {
    let n = len as f64;
    let mean = (n - 1.0) / 2.0;
    let variance = (0..len).map(|i| (i as f64 - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt().max(f64::EPSILON);

    (0..len).map(|i| (i as f64 - mean) / std_dev).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_single_point_series() {
        let detector = TrendDetector::default();
        assert!(detector.detect(&[]).is_empty());
        assert!(detector.detect(&[42.0]).is_empty());
    }

    #[test]
    fn test_perfectly_linear_series_has_no_anomalies() {
        let detector = TrendDetector::default();
        let series: Vec<f64> = (0..20).map(|i| i as f64).collect();

        assert!(detector.detect(&series).is_empty());
    }

    #[test]
    fn test_constant_series_has_no_anomalies() {
        let detector = TrendDetector::default();
        let series = vec![50.0; 12];

        assert!(detector.detect(&series).is_empty());
    }

    #[test]
    fn test_flags_spike_off_the_trend() {
        let detector = TrendDetector::default();
        // Gentle upward drift with one sharp spike
        let mut series: Vec<f64> = (0..20).map(|i| 20.0 + 0.5 * i as f64).collect();
        series[12] = 95.0;

        let anomalies = detector.detect(&series);
        assert!(anomalies.contains(&12));
    }

    #[test]
    fn test_detection_is_deterministic() {
        let detector = TrendDetector::default();
        let series = vec![30.0, 31.0, 29.5, 33.0, 70.0, 32.0, 30.5, 31.5, 29.0, 30.0];

        assert_eq!(detector.detect(&series), detector.detect(&series));
    }

    #[test]
    fn test_indices_are_in_range() {
        let detector = TrendDetector::default();
        let series = vec![5.0, 80.0, 6.0, 7.0, 5.5, 90.0, 6.5];

        for index in detector.detect(&series) {
            assert!(index < series.len());
        }
    }

    #[test]
    fn test_fit_recovers_linear_slope() {
        let detector = TrendDetector::default();
        let series: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.0).collect();
        let features = standardized_index(series.len());

        let fit = detector.fit(&features, &series);

        // Intercept converges to the series mean over a centered feature
        let mean = series.iter().sum::<f64>() / series.len() as f64;
        assert!((fit.intercept - mean).abs() < 1e-6);
        assert!(fit.weight > 0.0);
    }

    #[test]
    fn test_two_point_series_fits_exactly() {
        let detector = TrendDetector::default();
        assert!(detector.detect(&[10.0, 20.0]).is_empty());
    }
}
