//! Host monitor library
//!
//! This crate provides the core functionality for:
//! - Periodic sampling of host CPU/memory/disk usage
//! - Threshold-based alerting per sample
//! - Statistical and trend-model anomaly detection over the run
//! - End-of-run dashboard rendering

pub mod alerts;
pub mod anomaly;
pub mod collector;
pub mod dashboard;
pub mod error;
pub mod logtail;
pub mod models;
pub mod sampler;

pub use alerts::Alert;
pub use anomaly::{TrendDetector, ZScoreDetector};
pub use collector::{Collector, SimulatedCollector, SysinfoCollector};
pub use dashboard::{DashboardRenderer, PlottersRenderer};
pub use error::{CollectorError, LogError, RenderError};
pub use logtail::{FileLogSource, LogSource};
pub use models::*;
pub use sampler::{
    DashboardStatus, MonitorEvent, RunOutcome, RunReport, RunState, SamplerConfig, SamplingLoop,
    SamplingLoopBuilder,
};
