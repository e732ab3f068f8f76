//! Threshold alerting
//!
//! Maps a single sample against configured percentage ceilings. Alerts are
//! plain values handed back to the caller for display; nothing is thrown
//! and nothing is delivered anywhere.

use serde::{Deserialize, Serialize};

use crate::models::{MetricKind, MetricSample, ThresholdConfig};

/// One threshold breach: which metric, what was observed, what the ceiling was
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric: MetricKind,
    pub observed: f64,
    pub threshold: f64,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "High {} usage: {:.1}% (threshold {:.1}%)",
            self.metric, self.observed, self.threshold
        )
    }
}

/// Evaluate one sample against the configured ceilings
///
/// Pure function. Strict greater-than comparison: an observation exactly at
/// the ceiling emits nothing. Emission order follows metric order
/// (cpu, mem, disk). Any finite value is accepted, including readings
/// outside [0, 100].
pub fn evaluate(sample: &MetricSample, cfg: &ThresholdConfig) -> Vec<Alert> {
    let checks = [
        (MetricKind::Cpu, sample.cpu_percent, cfg.cpu),
        (MetricKind::Mem, sample.mem_percent, cfg.mem),
        (MetricKind::Disk, sample.disk_percent, cfg.disk),
    ];

    checks
        .into_iter()
        .filter(|(_, observed, threshold)| observed > threshold)
        .map(|(metric, observed, threshold)| Alert {
            metric,
            observed,
            threshold,
        })
        .collect()
}
