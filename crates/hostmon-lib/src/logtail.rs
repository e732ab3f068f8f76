//! Log tailing
//!
//! When log monitoring is enabled, the sampling loop surfaces the last few
//! lines of a configured log file each tick. A missing or unreadable file
//! degrades to a single informational line rather than failing the tick.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::LogError;

/// Number of lines surfaced per tick
pub const DEFAULT_TAIL_LINES: usize = 10;

/// Source of recent log lines
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Return up to the last `n` lines of the log
    async fn tail(&self, n: usize) -> Result<Vec<String>, LogError>;
}

/// Tails a plain-text log file on the local filesystem
pub struct FileLogSource {
    path: PathBuf,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn tail(&self, n: usize) -> Result<Vec<String>, LogError> {
        if !self.path.exists() {
            return Err(LogError::NotFound(self.path.clone()));
        }

        // Whole-file read; system logs rotate, so this stays bounded
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        let start = lines.len().saturating_sub(n);

        Ok(lines[start..].to_vec())
    }
}
