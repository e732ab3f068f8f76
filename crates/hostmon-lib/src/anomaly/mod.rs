//! Anomaly detection over one metric's series
//!
//! Two independent batch detectors run over the accumulated CPU series at
//! end of run:
//! - A z-score test against the series mean and standard deviation
//! - A residual test against an iteratively fitted linear trend model
//!
//! Their outputs are index sets into the analyzed series; the algorithms
//! are independent and may disagree.

mod trend;
mod zscore;

pub use trend::{TrendDetector, TrendFit};
pub use zscore::ZScoreDetector;

/// A series shorter than this has no defined spread or trend
pub(crate) const MIN_SERIES_LEN: usize = 2;
