//! End-of-run dashboard rendering
//!
//! Draws the collected series as three stacked line charts (CPU, memory,
//! disk over elapsed seconds) into a PNG file. Called exactly once per run
//! when the buffer is non-empty.

use std::path::Path;

use plotters::prelude::*;

use crate::error::RenderError;
use crate::models::MetricSample;

const WIDTH_PX: u32 = 1200;
const HEIGHT_PX: u32 = 800;

const CPU_LINE: RGBColor = RGBColor(30, 144, 255);
const MEM_LINE: RGBColor = RGBColor(50, 205, 50);
const DISK_LINE: RGBColor = RGBColor(255, 165, 0);

/// Renders a run's samples to some output target
pub trait DashboardRenderer: Send + Sync {
    /// Render the full sample series to `output`
    fn render(&self, samples: &[MetricSample], output: &Path) -> Result<(), RenderError>;
}

/// PNG renderer backed by `plotters`
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl PlottersRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DashboardRenderer for PlottersRenderer {
    fn render(&self, samples: &[MetricSample], output: &Path) -> Result<(), RenderError> {
        if samples.is_empty() {
            return Err(RenderError::EmptySeries);
        }

        let t0 = samples[0].timestamp;
        let x_max = (samples.last().map(|s| s.timestamp - t0).unwrap_or(0.0)).max(1.0);

        let root = BitMapBackend::new(output, (WIDTH_PX, HEIGHT_PX)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| RenderError::Backend(e.to_string()))?;

        let panels = root.split_evenly((3, 1));
        let charts: [(&str, RGBColor, fn(&MetricSample) -> f64); 3] = [
            ("CPU Usage", CPU_LINE, |s| s.cpu_percent),
            ("Memory Usage", MEM_LINE, |s| s.mem_percent),
            ("Disk Usage", DISK_LINE, |s| s.disk_percent),
        ];

        for (panel, (title, color, project)) in panels.iter().zip(charts) {
            let y_max = samples
                .iter()
                .map(project)
                .fold(100.0f64, f64::max)
                .max(1.0);

            let mut chart = ChartBuilder::on(panel)
                .caption(title, ("sans-serif", 22))
                .margin(12)
                .x_label_area_size(28)
                .y_label_area_size(44)
                .build_cartesian_2d(0.0..x_max, 0.0..y_max)
                .map_err(|e| RenderError::Backend(e.to_string()))?;

            chart
                .configure_mesh()
                .x_desc("elapsed (s)")
                .y_desc("%")
                .draw()
                .map_err(|e| RenderError::Backend(e.to_string()))?;

            chart
                .draw_series(LineSeries::new(
                    samples.iter().map(|s| (s.timestamp - t0, project(s))),
                    &color,
                ))
                .map_err(|e| RenderError::Backend(e.to_string()))?;
        }

        root.present()
            .map_err(|e| RenderError::Backend(e.to_string()))?;

        Ok(())
    }
}
