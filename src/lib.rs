//! Absolute trajectory error evaluation for visual odometry and SLAM output.
//!
//! This crate provides tools for:
//! - Loading timestamped trajectory files (TUM RGB-D benchmark format)
//! - Associating two timestamp-indexed series by nearest-timestamp matching
//! - Aligning 3D trajectories with Horn's closed-form method (rigid and similarity)
//! - Computing per-point and aggregate translational error statistics
//!
//! # Example
//!
//! ```no_run
//! use traj_eval::core::loaders::load_time_series;
//! use traj_eval::processors::evaluation::{evaluate_trajectories, EvaluationParams};
//!
//! let ground_truth = load_time_series("groundtruth.txt", false).unwrap();
//! let estimated = load_time_series("estimate.txt", false).unwrap();
//! let report = evaluate_trajectories(&ground_truth, &estimated, &EvaluationParams::default()).unwrap();
//! println!("ATE rmse: {:.6} m", report.rigid_stats.rmse);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{AlignmentConfig, AssociationConfig, EvalConfig, PlotConfig};
pub use core::loaders::TimeSeries;
pub use processors::alignment::{align, AlignmentResult, ErrorStats};
pub use processors::association::{associate, Match};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
