//! Host resource collection
//!
//! The sampling loop reads CPU, memory, and disk usage through the
//! [`Collector`] trait so the core can be tested with fakes. Two
//! implementations ship with the library: one backed by `sysinfo`, and a
//! synthetic one used for demos and as the loop's degraded-mode fallback
//! when the real collector is unavailable.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;
use sysinfo::{Disks, System};

use crate::error::CollectorError;
use crate::models::RawReading;

/// Source of raw host resource percentages
#[async_trait]
pub trait Collector: Send + Sync {
    /// Read current CPU, memory, and disk usage percentages
    async fn read(&self) -> Result<RawReading, CollectorError>;
}

/// Collector backed by the `sysinfo` crate
///
/// CPU usage is the average across logical CPUs between consecutive
/// refreshes, so the first reading of a run may report near zero.
pub struct SysinfoCollector {
    system: Mutex<System>,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Collector for SysinfoCollector {
    async fn read(&self) -> Result<RawReading, CollectorError> {
        let (cpu_percent, mem_percent) = {
            let mut system = self
                .system
                .lock()
                .map_err(|_| CollectorError::Unavailable("metrics state poisoned".to_string()))?;

            system.refresh_cpu_usage();
            system.refresh_memory();

            let cpus = system.cpus();
            if cpus.is_empty() {
                return Err(CollectorError::Unavailable("no CPUs reported".to_string()));
            }
            let cpu_total: f32 = cpus.iter().map(|cpu| cpu.cpu_usage()).sum();
            let cpu_percent = (cpu_total / cpus.len() as f32) as f64;

            let total_mem = system.total_memory();
            if total_mem == 0 {
                return Err(CollectorError::Unavailable(
                    "total memory reported as zero".to_string(),
                ));
            }
            let mem_percent = (system.used_memory() as f64 / total_mem as f64) * 100.0;

            (cpu_percent, mem_percent)
        };

        let disks = Disks::new_with_refreshed_list();
        let total: u64 = disks.list().iter().map(|d| d.total_space()).sum();
        let available: u64 = disks.list().iter().map(|d| d.available_space()).sum();
        if total == 0 {
            return Err(CollectorError::Unavailable(
                "no disk capacity reported".to_string(),
            ));
        }
        let disk_percent = (total.saturating_sub(available) as f64 / total as f64) * 100.0;

        Ok(RawReading {
            cpu_percent,
            mem_percent,
            disk_percent,
        })
    }
}

/// Synthetic readings drawn uniformly from plausible per-metric ranges
///
/// Used both as a standalone demo collector and as the degraded-mode
/// substitute when the real collector fails mid-run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedCollector;

impl SimulatedCollector {
    pub fn new() -> Self {
        Self
    }

    /// Produce one synthetic reading; never fails
    pub fn synthesize(&self) -> RawReading {
        let mut rng = rand::thread_rng();
        RawReading {
            cpu_percent: rng.gen_range(10.0..90.0),
            mem_percent: rng.gen_range(20.0..80.0),
            disk_percent: rng.gen_range(30.0..70.0),
        }
    }
}

#[async_trait]
impl Collector for SimulatedCollector {
    async fn read(&self) -> Result<RawReading, CollectorError> {
        Ok(self.synthesize())
    }
}
