//! The sampling loop
//!
//! Drives one monitoring run: on a fixed cadence it reads the collector,
//! appends a timestamped sample to the series buffer, evaluates thresholds,
//! and optionally surfaces recent log lines. The loop terminates when the
//! configured duration expires or the shutdown channel signals, then runs
//! both anomaly detectors over the accumulated CPU series and hands the
//! buffer to the dashboard renderer.
//!
//! Single logical thread of control: one writer to the buffer, all reads
//! happen either within the same tick or after the loop has stopped
//! appending, so no locking is needed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::alerts::{self, Alert};
use crate::anomaly::{TrendDetector, ZScoreDetector};
use crate::collector::{Collector, SimulatedCollector};
use crate::dashboard::DashboardRenderer;
use crate::logtail::{LogSource, DEFAULT_TAIL_LINES};
use crate::models::{MetricSample, RangeNote, SeriesBuffer, ThresholdConfig};

/// Configuration for one monitoring run
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Total run duration (default: 300 seconds)
    pub duration: Duration,
    /// Tick cadence, fixed for the run (default: 5 seconds)
    pub interval: Duration,
    /// Percentage ceilings for per-tick alerting
    pub thresholds: ThresholdConfig,
    /// Where the end-of-run dashboard is written
    pub dashboard_path: PathBuf,
    /// Event channel capacity
    pub event_buffer: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(300),
            interval: Duration::from_secs(5),
            thresholds: ThresholdConfig::default(),
            dashboard_path: PathBuf::from("dashboard.png"),
            event_buffer: 64,
        }
    }
}

/// Run lifecycle; terminal states never resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    Completed,
    CancelledByUser,
}

/// How the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    CancelledByUser,
}

/// Per-tick observations surfaced to the caller while the loop runs
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A sample was appended to the buffer
    Sample(MetricSample),
    /// The collector failed; a simulated reading was substituted
    DegradedSample { reason: String },
    /// One or more metric values lay outside [0, 100]
    OutOfRange(Vec<RangeNote>),
    /// Threshold breaches for this tick
    Alerts(Vec<Alert>),
    /// The tail of the configured log source
    RecentLogs {
        at: DateTime<Utc>,
        lines: Vec<String>,
    },
    /// The log source could not be read this tick
    LogUnavailable(String),
}

/// Outcome of the single end-of-run render call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardStatus {
    /// Empty buffer; the renderer was never invoked
    Skipped,
    Written(PathBuf),
    Failed(String),
}

/// Final report for one run
///
/// A render failure shows up in `dashboard` but never erases the
/// already-computed anomaly results.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub samples_collected: usize,
    /// Ticks where the collector failed and a simulated reading was used
    pub degraded_ticks: usize,
    /// Indices into the CPU series flagged by the z-score detector
    pub statistical_anomalies: Vec<usize>,
    /// Indices into the CPU series flagged by the trend detector
    pub trend_anomalies: Vec<usize>,
    pub dashboard: DashboardStatus,
}

impl RunReport {
    pub fn no_data(&self) -> bool {
        self.samples_collected == 0
    }
}

/// The sampling loop for one monitoring run
pub struct SamplingLoop {
    collector: Arc<dyn Collector>,
    /// Substitute source when the real collector fails mid-run
    fallback: SimulatedCollector,
    log_source: Option<Arc<dyn LogSource>>,
    renderer: Arc<dyn DashboardRenderer>,
    zscore: ZScoreDetector,
    trend: TrendDetector,
    config: SamplerConfig,
    state: RunState,
    buffer: SeriesBuffer,
    degraded_ticks: usize,
    events_tx: mpsc::Sender<MonitorEvent>,
}

impl SamplingLoop {
    /// Create a loop and the receiving end of its event stream
    pub fn new(
        collector: Arc<dyn Collector>,
        renderer: Arc<dyn DashboardRenderer>,
        log_source: Option<Arc<dyn LogSource>>,
        config: SamplerConfig,
    ) -> (Self, mpsc::Receiver<MonitorEvent>) {
        let (events_tx, events_rx) = mpsc::channel(config.event_buffer);

        let loop_instance = Self {
            collector,
            fallback: SimulatedCollector::new(),
            log_source,
            renderer,
            zscore: ZScoreDetector::default(),
            trend: TrendDetector::default(),
            config,
            state: RunState::NotStarted,
            buffer: SeriesBuffer::new(),
            degraded_ticks: 0,
            events_tx,
        };

        (loop_instance, events_rx)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run to completion or cancellation and produce the final report
    ///
    /// Cancellation is cooperative: the shutdown channel is observed while
    /// sleeping between ticks, so any fully-appended sample is retained and
    /// included in end-of-run analysis.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> RunReport {
        info!(
            duration_secs = self.config.duration.as_secs(),
            interval_secs = self.config.interval.as_secs(),
            "Starting sampling loop"
        );
        self.state = RunState::Running;

        let deadline = Instant::now() + self.config.duration;
        let mut ticker = interval(self.config.interval);

        let outcome = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // The first tick fires immediately; a zero-duration run
                    // must still collect nothing
                    if Instant::now() >= deadline {
                        break RunOutcome::Completed;
                    }
                    self.sample_tick().await;
                }
                _ = sleep_until(deadline) => {
                    break RunOutcome::Completed;
                }
                _ = shutdown.recv() => {
                    info!("Sampling loop cancelled by user");
                    break RunOutcome::CancelledByUser;
                }
            }
        };

        self.state = match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::CancelledByUser => RunState::CancelledByUser,
        };

        self.finish(outcome)
    }

    /// One tick: acquire, append, evaluate, surface
    async fn sample_tick(&mut self) {
        let reading = match self.collector.read().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "Collector unavailable, substituting simulated reading");
                self.degraded_ticks += 1;
                self.emit(MonitorEvent::DegradedSample {
                    reason: e.to_string(),
                })
                .await;
                self.fallback.synthesize()
            }
        };

        let now = Utc::now();
        let sample = MetricSample::from_reading(
            now.timestamp_millis() as f64 / 1000.0,
            reading,
        );

        self.buffer.push(sample);
        debug!(
            cpu = sample.cpu_percent,
            mem = sample.mem_percent,
            disk = sample.disk_percent,
            samples = self.buffer.len(),
            "Sample appended"
        );
        self.emit(MonitorEvent::Sample(sample)).await;

        let notes = sample.range_notes();
        if !notes.is_empty() {
            warn!(count = notes.len(), "Metric value outside [0, 100]");
            self.emit(MonitorEvent::OutOfRange(notes)).await;
        }

        let alerts = alerts::evaluate(&sample, &self.config.thresholds);
        if !alerts.is_empty() {
            self.emit(MonitorEvent::Alerts(alerts)).await;
        }

        if let Some(log_source) = &self.log_source {
            match log_source.tail(DEFAULT_TAIL_LINES).await {
                Ok(lines) => {
                    self.emit(MonitorEvent::RecentLogs { at: now, lines }).await;
                }
                Err(e) => {
                    // Degraded, not fatal: the tick carries on
                    self.emit(MonitorEvent::LogUnavailable(e.to_string())).await;
                }
            }
        }
    }

    /// End-of-run analysis and rendering
    fn finish(self, outcome: RunOutcome) -> RunReport {
        if self.buffer.is_empty() {
            info!("No data collected");
            return RunReport {
                outcome,
                samples_collected: 0,
                degraded_ticks: self.degraded_ticks,
                statistical_anomalies: Vec::new(),
                trend_anomalies: Vec::new(),
                dashboard: DashboardStatus::Skipped,
            };
        }

        let cpu_series = self.buffer.cpu_series();
        let statistical_anomalies = self.zscore.detect(&cpu_series);
        let trend_anomalies = self.trend.detect(&cpu_series);
        info!(
            samples = self.buffer.len(),
            statistical = statistical_anomalies.len(),
            trend = trend_anomalies.len(),
            "Run analysis complete"
        );

        let dashboard = match self
            .renderer
            .render(self.buffer.samples(), &self.config.dashboard_path)
        {
            Ok(()) => DashboardStatus::Written(self.config.dashboard_path.clone()),
            Err(e) => {
                warn!(error = %e, "Dashboard rendering failed");
                DashboardStatus::Failed(e.to_string())
            }
        };

        RunReport {
            outcome,
            samples_collected: self.buffer.len(),
            degraded_ticks: self.degraded_ticks,
            statistical_anomalies,
            trend_anomalies,
            dashboard,
        }
    }

    async fn emit(&self, event: MonitorEvent) {
        if self.events_tx.send(event).await.is_err() {
            debug!("Event receiver dropped, discarding event");
        }
    }
}

/// Builder for wiring a sampling loop's collaborators and configuration
pub struct SamplingLoopBuilder {
    collector: Option<Arc<dyn Collector>>,
    renderer: Option<Arc<dyn DashboardRenderer>>,
    log_source: Option<Arc<dyn LogSource>>,
    config: SamplerConfig,
}

impl SamplingLoopBuilder {
    pub fn new() -> Self {
        Self {
            collector: None,
            renderer: None,
            log_source: None,
            config: SamplerConfig::default(),
        }
    }

    pub fn collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn DashboardRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn log_source(mut self, log_source: Arc<dyn LogSource>) -> Self {
        self.log_source = Some(log_source);
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn dashboard_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dashboard_path = path.into();
        self
    }

    pub fn build(self) -> anyhow::Result<(SamplingLoop, mpsc::Receiver<MonitorEvent>)> {
        let collector = self
            .collector
            .ok_or_else(|| anyhow::anyhow!("Collector is required"))?;
        let renderer = self
            .renderer
            .ok_or_else(|| anyhow::anyhow!("Renderer is required"))?;

        Ok(SamplingLoop::new(
            collector,
            renderer,
            self.log_source,
            self.config,
        ))
    }
}

impl Default for SamplingLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectorError, RenderError};
    use crate::models::RawReading;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedCollector {
        reading: RawReading,
        calls: AtomicUsize,
    }

    impl FixedCollector {
        fn new(cpu: f64, mem: f64, disk: f64) -> Self {
            Self {
                reading: RawReading {
                    cpu_percent: cpu,
                    mem_percent: mem,
                    disk_percent: disk,
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Collector for FixedCollector {
        async fn read(&self) -> Result<RawReading, CollectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reading)
        }
    }

    struct FailingCollector;

    #[async_trait]
    impl Collector for FailingCollector {
        async fn read(&self) -> Result<RawReading, CollectorError> {
            Err(CollectorError::Unavailable("sensor offline".to_string()))
        }
    }

    struct CountingRenderer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    impl DashboardRenderer for CountingRenderer {
        fn render(&self, _samples: &[MetricSample], _output: &Path) -> Result<(), RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(RenderError::Backend("disk full".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn quick_config() -> SamplerConfig {
        SamplerConfig {
            duration: Duration::from_millis(120),
            interval: Duration::from_millis(20),
            ..SamplerConfig::default()
        }
    }

    fn shutdown_pair() -> (broadcast::Sender<()>, broadcast::Receiver<()>) {
        broadcast::channel(1)
    }

    #[tokio::test]
    async fn test_zero_duration_collects_nothing() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, _events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(50.0, 50.0, 50.0)),
            renderer.clone(),
            None,
            SamplerConfig {
                duration: Duration::ZERO,
                ..quick_config()
            },
        );

        let (_tx, rx) = shutdown_pair();
        let report = sampler.run(rx).await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.no_data());
        assert!(report.statistical_anomalies.is_empty());
        assert!(report.trend_anomalies.is_empty());
        assert_eq!(report.dashboard, DashboardStatus::Skipped);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_collects_samples_and_renders_once() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, _events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(30.0, 40.0, 50.0)),
            renderer.clone(),
            None,
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let report = sampler.run(rx).await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert!(report.samples_collected >= 2);
        assert_eq!(report.degraded_ticks, 0);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(report.dashboard, DashboardStatus::Written(_)));
    }

    #[tokio::test]
    async fn test_threshold_breach_surfaces_alerts() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(95.0, 40.0, 50.0)),
            renderer,
            None,
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        let mut saw_alert = false;
        while let Some(event) = events.recv().await {
            if let MonitorEvent::Alerts(alerts) = event {
                assert_eq!(alerts.len(), 1);
                assert_eq!(alerts[0].observed, 95.0);
                saw_alert = true;
            }
        }
        assert!(saw_alert);

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_collector_failure_degrades_to_simulated() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FailingCollector),
            renderer,
            None,
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        let mut degraded_events = 0;
        while let Some(event) = events.recv().await {
            if matches!(event, MonitorEvent::DegradedSample { .. }) {
                degraded_events += 1;
            }
        }
        assert!(degraded_events > 0);

        let report = handle.await.unwrap();
        assert_eq!(report.degraded_ticks, report.samples_collected);
        assert!(report.samples_collected > 0);
    }

    #[tokio::test]
    async fn test_cancellation_keeps_appended_samples() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(30.0, 40.0, 50.0)),
            renderer,
            None,
            SamplerConfig {
                duration: Duration::from_secs(300),
                interval: Duration::from_millis(10),
                ..SamplerConfig::default()
            },
        );

        let (tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        // Cancel after the first sample lands
        let first = events.recv().await;
        assert!(matches!(first, Some(MonitorEvent::Sample(_))));
        tx.send(()).unwrap();

        // Drain so the loop is never blocked on the event channel
        while events.recv().await.is_some() {}

        let report = handle.await.unwrap();
        assert_eq!(report.outcome, RunOutcome::CancelledByUser);
        assert!(report.samples_collected >= 1);
    }

    #[tokio::test]
    async fn test_render_failure_is_final_status_but_keeps_results() {
        let renderer = Arc::new(CountingRenderer::failing());
        let (sampler, _events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(30.0, 40.0, 50.0)),
            renderer.clone(),
            None,
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let report = sampler.run(rx).await;

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(report.dashboard, DashboardStatus::Failed(_)));
        // Anomaly analysis survives the render failure
        assert!(report.samples_collected >= 2);
        assert!(report.statistical_anomalies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_log_source_degrades_to_info_event() {
        use crate::logtail::FileLogSource;

        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(30.0, 40.0, 50.0)),
            renderer,
            Some(Arc::new(FileLogSource::new("/nonexistent/monitor.log"))),
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        let mut saw_log_unavailable = false;
        while let Some(event) = events.recv().await {
            if matches!(event, MonitorEvent::LogUnavailable(_)) {
                saw_log_unavailable = true;
            }
        }
        assert!(saw_log_unavailable);

        let report = handle.await.unwrap();
        // Log failure never aborts the run
        assert!(report.samples_collected > 0);
    }

    #[tokio::test]
    async fn test_log_lines_surfaced_each_tick() {
        use crate::logtail::FileLogSource;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..20 {
            writeln!(file, "syslog entry {i}").unwrap();
        }

        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(30.0, 40.0, 50.0)),
            renderer,
            Some(Arc::new(FileLogSource::new(file.path()))),
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        let mut saw_logs = false;
        while let Some(event) = events.recv().await {
            if let MonitorEvent::RecentLogs { lines, .. } = event {
                assert_eq!(lines.len(), 10);
                assert_eq!(lines.last().unwrap(), "syslog entry 19");
                saw_logs = true;
            }
        }
        assert!(saw_logs);

        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_out_of_range_reading_surfaced_not_rejected() {
        let renderer = Arc::new(CountingRenderer::new());
        let (sampler, mut events) = SamplingLoop::new(
            Arc::new(FixedCollector::new(130.0, 40.0, 50.0)),
            renderer,
            None,
            quick_config(),
        );

        let (_tx, rx) = shutdown_pair();
        let handle = tokio::spawn(sampler.run(rx));

        let mut saw_note = false;
        while let Some(event) = events.recv().await {
            if let MonitorEvent::OutOfRange(notes) = event {
                assert_eq!(notes[0].value, 130.0);
                saw_note = true;
            }
        }
        assert!(saw_note);

        let report = handle.await.unwrap();
        // The out-of-range value is kept in the series
        assert!(report.samples_collected > 0);
    }

    #[tokio::test]
    async fn test_builder_requires_collector_and_renderer() {
        assert!(SamplingLoopBuilder::new().build().is_err());

        let only_collector = SamplingLoopBuilder::new()
            .collector(Arc::new(FixedCollector::new(1.0, 1.0, 1.0)))
            .build();
        assert!(only_collector.is_err());

        let complete = SamplingLoopBuilder::new()
            .collector(Arc::new(FixedCollector::new(1.0, 1.0, 1.0)))
            .renderer(Arc::new(CountingRenderer::new()))
            .duration(Duration::from_secs(1))
            .interval(Duration::from_millis(100))
            .build();
        assert!(complete.is_ok());
    }

    #[test]
    fn test_initial_state_is_not_started() {
        let (sampler, _events) = SamplingLoop::new(
            Arc::new(SimulatedCollector::new()),
            Arc::new(CountingRenderer::new()),
            None,
            SamplerConfig::default(),
        );
        assert_eq!(sampler.state(), RunState::NotStarted);
    }
}
