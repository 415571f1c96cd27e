//! Command-line interface for the trajectory evaluation tool.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders::{self, TimeSeries};
use crate::core::writers;
use crate::processors::association;
use crate::processors::evaluation::{self, EvaluationParams, EvaluationReport};
use crate::visualization::{self, TrajectoryTrack};
use crate::EvalConfig;

#[derive(Parser)]
#[command(name = "traj-eval")]
#[command(about = "Trajectory association and absolute trajectory error evaluation", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match two timestamped files by nearest timestamp
    Associate {
        /// First timestamped file
        first_file: PathBuf,
        /// Second timestamped file
        second_file: PathBuf,
        /// Print only the first file's entries for matched pairs
        #[arg(long)]
        first_only: bool,
        /// Time offset added to the second file's timestamps
        #[arg(long)]
        offset: Option<f64>,
        /// Maximum allowed time difference for matching (seconds)
        #[arg(long)]
        max_difference: Option<f64>,
        /// Drop the first and last 100 lines of each input file
        #[arg(long)]
        remove_bounds: bool,
    },

    /// Compute absolute trajectory error against a ground truth
    Evaluate {
        /// Ground-truth trajectory file (timestamp tx ty tz ...)
        ground_truth: PathBuf,
        /// Estimated trajectory file (timestamp tx ty tz ...)
        estimated: PathBuf,
        /// Time offset added to the estimated trajectory's timestamps
        #[arg(long)]
        offset: Option<f64>,
        /// Scaling factor applied to the estimate before alignment
        #[arg(short, long)]
        scale: Option<f64>,
        /// Maximum allowed time difference for matching (seconds)
        #[arg(long)]
        max_difference: Option<f64>,
        /// Save the rigidly aligned estimate (timestamp x y z per line)
        #[arg(long)]
        save: Option<PathBuf>,
        /// Save matched pairs with aligned positions (tsA x y z tsB x y z)
        #[arg(long)]
        save_associations: Option<PathBuf>,
        /// Save a PNG plot of both trajectories
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Print the full error statistics instead of the one-line summary
        #[arg(long)]
        detailed: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.len() > 39 {
            format!("{}...", &value[..36])
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match EvalConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}, using defaults",
                    path.display(),
                    e
                );
                EvalConfig::default()
            }
        },
        None => EvalConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Associate {
            first_file,
            second_file,
            first_only,
            offset,
            max_difference,
            remove_bounds,
        } => {
            cmd_associate(
                &first_file,
                &second_file,
                first_only,
                offset,
                max_difference,
                remove_bounds,
                &config,
            );
        }
        Commands::Evaluate {
            ground_truth,
            estimated,
            offset,
            scale,
            max_difference,
            save,
            save_associations,
            plot,
            detailed,
        } => {
            cmd_evaluate(
                &ground_truth,
                &estimated,
                offset,
                scale,
                max_difference,
                save,
                save_associations,
                plot,
                detailed,
                &config,
            );
        }
    }
}

fn load_series(path: &Path, trim_bounds: bool) -> TimeSeries {
    match loaders::load_time_series(path, trim_bounds) {
        Ok(series) => {
            info!("Loaded {} entries from {}", series.len(), path.display());
            series
        }
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn cmd_associate(
    first_file: &Path,
    second_file: &Path,
    first_only: bool,
    offset: Option<f64>,
    max_difference: Option<f64>,
    remove_bounds: bool,
    config: &EvalConfig,
) {
    // CLI flags override config values
    let offset = offset.unwrap_or(config.association.offset);
    let max_difference = max_difference.unwrap_or(config.association.max_difference);
    let remove_bounds = remove_bounds || config.association.remove_bounds;

    let first = load_series(first_file, remove_bounds);
    let second = load_series(second_file, remove_bounds);

    let matches = association::associate(&first, &second, offset, max_difference);
    info!(
        "Matched {} of {} / {} entries",
        matches.len(),
        first.len(),
        second.len()
    );

    for m in &matches {
        println!(
            "{}",
            association::format_match(m, &first, &second, offset, first_only)
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_evaluate(
    ground_truth_file: &Path,
    estimated_file: &Path,
    offset: Option<f64>,
    scale: Option<f64>,
    max_difference: Option<f64>,
    save: Option<PathBuf>,
    save_associations: Option<PathBuf>,
    plot: Option<PathBuf>,
    detailed: bool,
    config: &EvalConfig,
) {
    let start = Instant::now();

    let params = EvaluationParams {
        offset: offset.unwrap_or(config.association.offset),
        max_difference: max_difference.unwrap_or(config.association.max_difference),
        scale: scale.unwrap_or(config.alignment.scale),
    };

    let ground_truth = load_series(ground_truth_file, false);
    let estimated = load_series(estimated_file, false);

    let spinner = create_spinner("Associating and aligning trajectories...");

    let report = match evaluation::evaluate_trajectories(&ground_truth, &estimated, &params) {
        Ok(report) => {
            spinner.finish_and_clear();
            report
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Evaluation failed: {}", e);
            std::process::exit(1);
        }
    };

    if detailed {
        print_detailed_report(&report);
    } else {
        // Compact machine-readable line: rigid RMSE, scale, similarity RMSE
        println!(
            "{:.6},{:.6},{:.6}",
            report.rigid_stats.rmse, report.alignment.scale, report.scaled_stats.rmse
        );
    }

    if let Some(path) = &save {
        save_aligned_estimate(path, &estimated, &params, &report);
    }

    if let Some(path) = &save_associations {
        let aligned = report.alignment.apply_scaled_rigid(&report.matched_estimate);
        if let Err(e) =
            writers::write_associations(path, &report.matches, &report.matched_ground_truth, &aligned)
        {
            error!("Failed to write associations: {}", e);
            std::process::exit(1);
        }
        info!("Wrote matched pairs to {}", path.display());
    }

    if let Some(path) = &plot {
        plot_evaluation(path, &ground_truth, &estimated, &params, &report, config);
    }

    if detailed {
        print_summary(
            "Evaluation Complete",
            &[
                ("Ground truth", ground_truth_file.display().to_string()),
                ("Estimate", estimated_file.display().to_string()),
                ("Matched pairs", report.matches.len().to_string()),
                ("RMSE (rigid)", format!("{:.6} m", report.rigid_stats.rmse)),
                ("RMSE (scaled)", format!("{:.6} m", report.scaled_stats.rmse)),
                ("Scale", format!("{:.6}", report.alignment.scale)),
                ("Duration", format!("{:.2?}", start.elapsed())),
            ],
        );
    }
}

fn print_detailed_report(report: &EvaluationReport) {
    println!("compared_pose_pairs {} pairs", report.matches.len());
    println!(
        "absolute_translational_error.rmse {:.6} m",
        report.rigid_stats.rmse
    );
    println!(
        "absolute_translational_error.mean {:.6} m",
        report.rigid_stats.mean
    );
    println!(
        "absolute_translational_error.median {:.6} m",
        report.rigid_stats.median
    );
    println!(
        "absolute_translational_error.std {:.6} m",
        report.rigid_stats.std
    );
    println!(
        "absolute_translational_error.min {:.6} m",
        report.rigid_stats.min
    );
    println!(
        "absolute_translational_error.max {:.6} m",
        report.rigid_stats.max
    );
    if let Some(idx) = report.worst_pair() {
        println!("max idx: {}", idx);
    }
    println!(
        "absolute_translational_error_scaled.rmse {:.6} m",
        report.scaled_stats.rmse
    );
    println!("scale {:.6}", report.alignment.scale);
}

/// Apply the rigid transform to the full estimate and write it out.
fn save_aligned_estimate(
    path: &Path,
    estimated: &TimeSeries,
    params: &EvaluationParams,
    report: &EvaluationReport,
) {
    let stamps = estimated.stamps();
    let positions = match evaluation::extract_positions(estimated, &stamps, params.scale) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to extract estimated positions: {}", e);
            std::process::exit(1);
        }
    };
    let aligned = report.alignment.apply_rigid(&positions);

    if let Err(e) = writers::write_aligned_trajectory(path, &stamps, &aligned) {
        error!("Failed to write aligned trajectory: {}", e);
        std::process::exit(1);
    }
    info!("Wrote aligned estimate to {}", path.display());
}

/// Render both full trajectories plus matched-pair difference segments.
fn plot_evaluation(
    path: &Path,
    ground_truth: &TimeSeries,
    estimated: &TimeSeries,
    params: &EvaluationParams,
    report: &EvaluationReport,
    config: &EvalConfig,
) {
    let gt_stamps = ground_truth.stamps();
    let est_stamps = estimated.stamps();

    let gt_positions = match evaluation::extract_positions(ground_truth, &gt_stamps, 1.0) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to extract ground-truth positions: {}", e);
            std::process::exit(1);
        }
    };
    let est_positions = match evaluation::extract_positions(estimated, &est_stamps, params.scale) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to extract estimated positions: {}", e);
            std::process::exit(1);
        }
    };
    let est_aligned = report.alignment.apply_scaled_rigid(&est_positions);

    let gt_track = TrajectoryTrack {
        stamps: gt_stamps,
        points: gt_positions
            .column_iter()
            .map(|c| (c[0], c[1]))
            .collect(),
    };
    let est_track = TrajectoryTrack {
        stamps: est_stamps,
        points: est_aligned
            .column_iter()
            .map(|c| (c[0], c[1]))
            .collect(),
    };

    let matched_aligned = report.alignment.apply_scaled_rigid(&report.matched_estimate);
    let differences: Vec<_> = (0..report.matches.len())
        .map(|i| {
            let g = report.matched_ground_truth.column(i);
            let e = matched_aligned.column(i);
            ((g[0], g[1]), (e[0], e[1]))
        })
        .collect();

    let size = (config.plot.width, config.plot.height);
    match visualization::plot_trajectories(path, &gt_track, &est_track, &differences, size) {
        Ok(()) => info!("Wrote trajectory plot to {}", path.display()),
        Err(e) => {
            error!("Failed to render plot: {}", e);
            std::process::exit(1);
        }
    }
}
