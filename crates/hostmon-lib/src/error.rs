//! Error types for the monitor's external collaborators
//!
//! Every per-tick failure is isolated to its tick: collector failures
//! degrade to simulated readings, log failures collapse to a single
//! informational line, and only a render failure at end of run reaches
//! the caller as the run's final status.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read host resource counters
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("host metrics unavailable: {0}")]
    Unavailable(String),
}

/// Failure to read recent lines from the configured log source
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read log file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to write the end-of-run dashboard image
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no samples to render")]
    EmptySeries,

    #[error("failed to draw dashboard: {0}")]
    Backend(String),
}
