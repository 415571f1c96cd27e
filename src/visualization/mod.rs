//! Trajectory plot generation.
//!
//! Renders the ground-truth and aligned estimated trajectories as 2D
//! polylines (x vs y) with red segments connecting matched poses.
//! A polyline is split into separate strokes wherever the gap between
//! consecutive timestamps exceeds twice the median inter-sample interval,
//! so recording dropouts don't draw spurious straight lines.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

/// Errors that can occur during plot generation.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("plotting error: {0}")]
    PlottingError(String),

    #[error("empty trajectory")]
    EmptyTrajectory,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// A trajectory projected to the x/y plane, with its timestamps.
///
/// Stamps must be sorted ascending and correspond 1:1 with points.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryTrack {
    pub stamps: Vec<f64>,
    pub points: Vec<(f64, f64)>,
}

/// Split a track into polyline strokes at sampling gaps.
///
/// The gap threshold is twice the median interval between consecutive
/// stamps; the sample at a gap boundary is dropped from both strokes.
fn split_at_gaps(track: &TrajectoryTrack) -> Vec<Vec<(f64, f64)>> {
    let n = track.stamps.len();
    if n == 0 {
        return Vec::new();
    }

    let mut intervals: Vec<f64> = track.stamps.windows(2).map(|w| w[1] - w[0]).collect();
    if intervals.is_empty() {
        return vec![track.points.clone()];
    }
    intervals.sort_by(f64::total_cmp);
    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) / 2.0
    } else {
        intervals[mid]
    };
    let threshold = 2.0 * median;

    let mut strokes = Vec::new();
    let mut current = Vec::new();
    let mut last = track.stamps[0];

    for (i, &stamp) in track.stamps.iter().enumerate() {
        if stamp - last < threshold {
            current.push(track.points[i]);
        } else if !current.is_empty() {
            strokes.push(std::mem::take(&mut current));
        }
        last = stamp;
    }
    if !current.is_empty() {
        strokes.push(current);
    }

    strokes
}

/// Compute padded x/y bounds over every drawn point.
fn compute_bounds<'a>(
    point_sets: impl Iterator<Item = &'a (f64, f64)>,
) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in point_sets {
        if x < x_min {
            x_min = x;
        }
        if x > x_max {
            x_max = x;
        }
        if y < y_min {
            y_min = y;
        }
        if y > y_max {
            y_max = y;
        }
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

/// Plot ground truth (black) and aligned estimate (blue) with red
/// per-match difference segments, saved as PNG.
///
/// # Arguments
///
/// * `output_path` - Path to save the PNG image
/// * `ground_truth` - Full ground-truth track (sorted stamps)
/// * `estimate` - Full aligned-estimate track (sorted stamps)
/// * `differences` - Matched (ground truth, aligned estimate) point pairs
/// * `size` - Image (width, height) in pixels
pub fn plot_trajectories(
    output_path: &Path,
    ground_truth: &TrajectoryTrack,
    estimate: &TrajectoryTrack,
    differences: &[((f64, f64), (f64, f64))],
    size: (u32, u32),
) -> Result<()> {
    if ground_truth.points.is_empty() || estimate.points.is_empty() {
        return Err(VisualizationError::EmptyTrajectory);
    }

    let (x_min, x_max, y_min, y_max) = compute_bounds(
        ground_truth
            .points
            .iter()
            .chain(estimate.points.iter()),
    );
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("x [m]")
        .y_desc("y [m]")
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    for (i, stroke) in split_at_gaps(ground_truth).into_iter().enumerate() {
        let series = chart
            .draw_series(LineSeries::new(stroke, &BLACK))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
        if i == 0 {
            series
                .label("ground truth")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK));
        }
    }

    for (i, stroke) in split_at_gaps(estimate).into_iter().enumerate() {
        let series = chart
            .draw_series(LineSeries::new(stroke, &BLUE))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
        if i == 0 {
            series
                .label("estimated")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        }
    }

    for (i, &(gt, est)) in differences.iter().enumerate() {
        let series = chart
            .draw_series(LineSeries::new(vec![gt, est], &RED))
            .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;
        if i == 0 {
            series
                .label("difference")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
        }
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    root.present()
        .map_err(|e| VisualizationError::PlottingError(e.to_string()))?;

    Ok(())
}
