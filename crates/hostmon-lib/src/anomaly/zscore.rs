//! Statistical outlier detection
//!
//! Flags points whose standardized deviation from the series mean exceeds
//! a configurable threshold. Single pass, stateless, deterministic.

use super::MIN_SERIES_LEN;

/// Default number of standard deviations to consider an outlier
const DEFAULT_Z_THRESHOLD: f64 = 2.0;

/// Detects outliers by z-score against the whole-series distribution
#[derive(Debug, Clone)]
pub struct ZScoreDetector {
    /// Number of standard deviations beyond which a point is flagged
    pub threshold: f64,
}

impl ZScoreDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Return the indices of outlying points
    ///
    /// A series shorter than two points has no defined spread and yields
    /// no anomalies. A constant series (zero standard deviation) defines
    /// every z-score as zero, so it also yields none.
    pub fn detect(&self, series: &[f64]) -> Vec<usize> {
        if series.len() < MIN_SERIES_LEN {
            return Vec::new();
        }

        let n = series.len() as f64;
        let mean = series.iter().sum::<f64>() / n;
        let variance = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev < f64::EPSILON {
            return Vec::new();
        }

        series
            .iter()
            .enumerate()
            .filter(|(_, v)| ((*v - mean).abs() / std_dev) > self.threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_Z_THRESHOLD,
        }
    }
}
