//! Run configuration for the hostmon binary

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use hostmon_lib::ThresholdConfig;

/// Host metrics monitor with threshold alerting and anomaly detection
#[derive(Debug, Parser)]
#[command(name = "hostmon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Total monitoring duration in seconds
    #[arg(long, env = "HOSTMON_DURATION", default_value_t = 300)]
    pub duration: u64,

    /// Sampling interval in seconds
    #[arg(long, env = "HOSTMON_INTERVAL", default_value_t = 5)]
    pub interval: u64,

    /// Log file to tail each tick (defaults to the OS system log)
    #[arg(long, env = "HOSTMON_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable log tailing entirely
    #[arg(long, conflicts_with = "log_file")]
    pub no_log_file: bool,

    /// CPU usage alert threshold (percent)
    #[arg(long, env = "HOSTMON_CPU_THRESHOLD", default_value_t = 80.0)]
    pub cpu_threshold: f64,

    /// Memory usage alert threshold (percent)
    #[arg(long, env = "HOSTMON_MEM_THRESHOLD", default_value_t = 80.0)]
    pub mem_threshold: f64,

    /// Disk usage alert threshold (percent)
    #[arg(long, env = "HOSTMON_DISK_THRESHOLD", default_value_t = 90.0)]
    pub disk_threshold: f64,

    /// Output path for the end-of-run dashboard image
    #[arg(long, env = "HOSTMON_OUTPUT", default_value = "dashboard.png")]
    pub output: PathBuf,

    /// Use simulated readings instead of real host metrics
    #[arg(long)]
    pub simulate: bool,
}

impl Cli {
    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        ThresholdConfig {
            cpu: self.cpu_threshold,
            mem: self.mem_threshold,
            disk: self.disk_threshold,
        }
    }

    /// The log file to tail, if log monitoring is enabled
    ///
    /// Explicit `--log-file` wins; otherwise the per-OS system log is used
    /// when one is known. `--no-log-file` disables tailing.
    pub fn effective_log_file(&self) -> Option<PathBuf> {
        if self.no_log_file {
            return None;
        }
        self.log_file.clone().or_else(default_log_path)
    }
}

/// Default system log location for the current OS, if any
fn default_log_path() -> Option<PathBuf> {
    if cfg!(target_os = "linux") {
        Some(PathBuf::from("/var/log/syslog"))
    } else if cfg!(target_os = "macos") {
        Some(PathBuf::from("/var/log/system.log"))
    } else if cfg!(target_os = "windows") {
        Some(PathBuf::from(r"C:\Windows\Logs\CBS\CBS.log"))
    } else {
        None
    }
}
