//! Core data models for the host monitor

use serde::{Deserialize, Serialize};

/// Raw percentages as returned by a collector, before timestamping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub disk_percent: f64,
}

/// A single point-in-time measurement of host resource usage
///
/// Immutable once created; the sampling loop builds one per tick from a
/// collector reading plus the current wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub disk_percent: f64,
}

impl MetricSample {
    /// Build a sample from a raw reading and a timestamp
    pub fn from_reading(timestamp: f64, reading: RawReading) -> Self {
        Self {
            timestamp,
            cpu_percent: reading.cpu_percent,
            mem_percent: reading.mem_percent,
            disk_percent: reading.disk_percent,
        }
    }

    /// Report metrics whose value lies outside the valid [0, 100] range
    ///
    /// Out-of-range values are a data-quality signal, not an error: the
    /// value is kept as-is and flows through alerting and detection.
    pub fn range_notes(&self) -> Vec<RangeNote> {
        let mut notes = Vec::new();
        for (metric, value) in [
            (MetricKind::Cpu, self.cpu_percent),
            (MetricKind::Mem, self.mem_percent),
            (MetricKind::Disk, self.disk_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                notes.push(RangeNote { metric, value });
            }
        }
        notes
    }
}

/// The three monitored resource metrics, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Mem,
    Disk,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricKind::Cpu => write!(f, "CPU"),
            MetricKind::Mem => write!(f, "Memory"),
            MetricKind::Disk => write!(f, "Disk"),
        }
    }
}

/// A metric value observed outside the [0, 100] range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeNote {
    pub metric: MetricKind,
    pub value: f64,
}

/// Percentage ceilings for threshold alerting
///
/// Supplied once at run start and immutable for the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub cpu: f64,
    pub mem: f64,
    pub disk: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            mem: 80.0,
            disk: 90.0,
        }
    }
}

/// Append-only, time-ordered collection of samples for one run
///
/// Single writer (the sampling loop); read-only views are handed to the
/// threshold evaluator per tick and to the detectors and dashboard
/// renderer at end of run. Entries are never removed or mutated.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuffer {
    samples: Vec<MetricSample>,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample; insertion order is temporal order
    pub fn push(&mut self, sample: MetricSample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// An empty buffer is valid and means "no data collected"
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    /// CPU percentage projection, in sample order
    pub fn cpu_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.cpu_percent).collect()
    }

    /// Memory percentage projection, in sample order
    pub fn mem_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.mem_percent).collect()
    }

    /// Disk percentage projection, in sample order
    pub fn disk_series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.disk_percent).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: f64, cpu: f64, mem: f64, disk: f64) -> MetricSample {
        MetricSample {
            timestamp: ts,
            cpu_percent: cpu,
            mem_percent: mem,
            disk_percent: disk,
        }
    }

    #[test]
    fn test_buffer_append_preserves_order() {
        let mut buffer = SeriesBuffer::new();
        assert!(buffer.is_empty());

        for i in 0..5 {
            buffer.push(sample(i as f64, 10.0 * i as f64, 50.0, 60.0));
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.cpu_series(), vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(buffer.samples()[2].timestamp, 2.0);
    }

    #[test]
    fn test_projections_cover_all_metrics() {
        let mut buffer = SeriesBuffer::new();
        buffer.push(sample(0.0, 11.0, 22.0, 33.0));
        buffer.push(sample(1.0, 44.0, 55.0, 66.0));

        assert_eq!(buffer.cpu_series(), vec![11.0, 44.0]);
        assert_eq!(buffer.mem_series(), vec![22.0, 55.0]);
        assert_eq!(buffer.disk_series(), vec![33.0, 66.0]);
    }

    #[test]
    fn test_range_notes_in_range_sample() {
        let s = sample(0.0, 0.0, 100.0, 55.5);
        assert!(s.range_notes().is_empty());
    }

    #[test]
    fn test_range_notes_flag_out_of_range_values() {
        let s = sample(0.0, 120.0, -3.0, 55.5);
        let notes = s.range_notes();

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].metric, MetricKind::Cpu);
        assert_eq!(notes[0].value, 120.0);
        assert_eq!(notes[1].metric, MetricKind::Mem);
    }

    #[test]
    fn test_default_thresholds() {
        let cfg = ThresholdConfig::default();
        assert_eq!(cfg.cpu, 80.0);
        assert_eq!(cfg.mem, 80.0);
        assert_eq!(cfg.disk, 90.0);
    }
}
