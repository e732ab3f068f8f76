//! hostmon - host metrics monitor
//!
//! Samples host CPU/memory/disk usage on a fixed cadence, prints threshold
//! alerts and recent log lines as the run progresses, and finishes with
//! anomaly analysis over the CPU series plus a rendered dashboard image.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use hostmon_lib::{
    Collector, DashboardStatus, FileLogSource, MonitorEvent, PlottersRenderer, RunOutcome,
    RunReport, SamplingLoopBuilder, SimulatedCollector, SysinfoCollector,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = config::Cli::parse();

    println!("Starting hostmon monitoring...");
    println!(
        "Sampling every {}s for {}s. Press Ctrl+C to stop early.",
        cli.tick_interval().as_secs(),
        cli.run_duration().as_secs()
    );

    let collector: Arc<dyn Collector> = if cli.simulate {
        info!("Using simulated readings");
        Arc::new(SimulatedCollector::new())
    } else {
        Arc::new(SysinfoCollector::new())
    };

    let mut builder = SamplingLoopBuilder::new()
        .collector(collector)
        .renderer(Arc::new(PlottersRenderer::new()))
        .duration(cli.run_duration())
        .interval(cli.tick_interval())
        .thresholds(cli.thresholds())
        .dashboard_path(cli.output.clone());

    match cli.effective_log_file() {
        Some(path) => {
            println!("Monitoring log file: {}", path.display());
            builder = builder.log_source(Arc::new(FileLogSource::new(path)));
        }
        None => println!("No log file configured. Skipping log monitoring."),
    }

    let (sampler, mut events) = builder.build()?;

    // Ctrl-C cancels cooperatively; samples already appended are kept
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let run = tokio::spawn(sampler.run(shutdown_rx));

    while let Some(event) = events.recv().await {
        print_event(event);
    }

    let report = run.await?;
    print_report(&report);

    if let DashboardStatus::Failed(reason) = &report.dashboard {
        anyhow::bail!("dashboard rendering failed: {reason}");
    }
    Ok(())
}

fn print_event(event: MonitorEvent) {
    match event {
        MonitorEvent::Sample(sample) => {
            println!(
                "cpu {:5.1}%  mem {:5.1}%  disk {:5.1}%",
                sample.cpu_percent, sample.mem_percent, sample.disk_percent
            );
        }
        MonitorEvent::DegradedSample { reason } => {
            println!("Collector unavailable ({reason}); using simulated reading");
        }
        MonitorEvent::OutOfRange(notes) => {
            for note in notes {
                println!(
                    "Data quality: {} reading {:.1}% outside [0, 100]",
                    note.metric, note.value
                );
            }
        }
        MonitorEvent::Alerts(alerts) => {
            println!("ALERTS:");
            for alert in alerts {
                println!("  {alert}");
            }
        }
        MonitorEvent::RecentLogs { at, lines } => {
            println!("Recent logs (as of {}):", at.format("%Y-%m-%d %H:%M:%S"));
            for line in lines {
                println!("  {line}");
            }
        }
        MonitorEvent::LogUnavailable(reason) => {
            println!("Log monitoring skipped this tick: {reason}");
        }
    }
}

fn print_report(report: &RunReport) {
    match report.outcome {
        RunOutcome::Completed => println!("\nMonitoring complete."),
        RunOutcome::CancelledByUser => println!("\nMonitoring stopped by user."),
    }

    if report.no_data() {
        println!("No data collected.");
        return;
    }

    println!("Samples collected: {}", report.samples_collected);
    if report.degraded_ticks > 0 {
        println!(
            "Degraded ticks (simulated readings): {}",
            report.degraded_ticks
        );
    }
    println!(
        "Statistical CPU anomalies (z-score): {:?}",
        report.statistical_anomalies
    );
    println!(
        "Trend CPU anomalies (model residual): {:?}",
        report.trend_anomalies
    );

    match &report.dashboard {
        DashboardStatus::Written(path) => println!("Dashboard saved to {}", path.display()),
        DashboardStatus::Failed(reason) => println!("Dashboard rendering failed: {reason}"),
        DashboardStatus::Skipped => {}
    }
}
