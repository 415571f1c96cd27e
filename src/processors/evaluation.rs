//! End-to-end trajectory evaluation: association, extraction, alignment.

use log::debug;
use nalgebra::{Matrix3xX, Vector3};
use thiserror::Error;

use crate::core::loaders::TimeSeries;
use crate::processors::alignment::{align, AlignmentError, AlignmentResult, ErrorStats};
use crate::processors::association::{associate, Match};

/// Errors that can occur during evaluation.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("couldn't find matching timestamp pairs (found {found}, need at least 2); check --offset and --max-difference")]
    InsufficientMatches { found: usize },

    #[error("no entry for timestamp {stamp}")]
    UnknownStamp { stamp: f64 },

    #[error("entry at timestamp {stamp} has {found} fields, expected at least 3 (tx ty tz)")]
    ShortPayload { stamp: f64, found: usize },

    #[error("invalid coordinate '{token}' at timestamp {stamp}")]
    InvalidCoordinate { stamp: f64, token: String },

    #[error(transparent)]
    Alignment(#[from] AlignmentError),
}

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvaluationError>;

/// Parameters for a trajectory evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationParams {
    /// Time offset added to the estimated trajectory's timestamps.
    pub offset: f64,
    /// Maximum allowed time difference for matching entries.
    pub max_difference: f64,
    /// Scaling factor applied to the estimated trajectory before alignment.
    pub scale: f64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            offset: 0.0,
            max_difference: 0.02,
            scale: 1.0,
        }
    }
}

/// Everything produced by one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Accepted timestamp pairs, sorted by ground-truth stamp.
    pub matches: Vec<Match>,
    /// The alignment of the estimate onto the ground truth.
    pub alignment: AlignmentResult,
    /// Statistics of the rigid-fit per-point errors (the classic ATE).
    pub rigid_stats: ErrorStats,
    /// Statistics of the similarity-fit per-point errors.
    pub scaled_stats: ErrorStats,
    /// Ground-truth positions at the matched stamps (3×N).
    pub matched_ground_truth: Matrix3xX<f64>,
    /// Pre-scaled estimated positions at the matched stamps (3×N).
    pub matched_estimate: Matrix3xX<f64>,
}

impl EvaluationReport {
    /// Index of the matched pair with the largest rigid-fit error.
    pub fn worst_pair(&self) -> Option<usize> {
        self.alignment
            .errors_rigid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }
}

/// Extract 3D positions from a series at the given stamps.
///
/// The first three payload fields of each entry are parsed as tx, ty, tz
/// and multiplied by `scale`. Returns a 3×N matrix with column i holding
/// the position at `stamps[i]`.
pub fn extract_positions(
    series: &TimeSeries,
    stamps: &[f64],
    scale: f64,
) -> Result<Matrix3xX<f64>> {
    // from_columns panics on an empty slice
    if stamps.is_empty() {
        return Ok(Matrix3xX::zeros(0));
    }

    let mut columns = Vec::with_capacity(stamps.len());

    for &stamp in stamps {
        let fields = series
            .fields(stamp)
            .ok_or(EvaluationError::UnknownStamp { stamp })?;
        if fields.len() < 3 {
            return Err(EvaluationError::ShortPayload {
                stamp,
                found: fields.len(),
            });
        }

        let mut coords = [0.0f64; 3];
        for (slot, token) in coords.iter_mut().zip(&fields[..3]) {
            *slot = token.parse::<f64>().map_err(|_| EvaluationError::InvalidCoordinate {
                stamp,
                token: token.clone(),
            })? * scale;
        }
        columns.push(Vector3::new(coords[0], coords[1], coords[2]));
    }

    Ok(Matrix3xX::from_columns(&columns))
}

/// Evaluate an estimated trajectory against a ground-truth trajectory.
///
/// Associates the two series by nearest timestamp, extracts the matched
/// 3D positions (the estimate pre-multiplied by `params.scale`), and
/// aligns the estimate onto the ground truth. Fewer than 2 matched pairs
/// is a fatal [`EvaluationError::InsufficientMatches`]; the aligner is
/// never invoked in that case.
pub fn evaluate_trajectories(
    ground_truth: &TimeSeries,
    estimated: &TimeSeries,
    params: &EvaluationParams,
) -> Result<EvaluationReport> {
    let matches = associate(ground_truth, estimated, params.offset, params.max_difference);
    debug!(
        "associated {} pairs (|gt| = {}, |est| = {})",
        matches.len(),
        ground_truth.len(),
        estimated.len()
    );

    if matches.len() < 2 {
        return Err(EvaluationError::InsufficientMatches {
            found: matches.len(),
        });
    }

    let gt_stamps: Vec<f64> = matches.iter().map(|m| m.first).collect();
    let est_stamps: Vec<f64> = matches.iter().map(|m| m.second).collect();

    let matched_ground_truth = extract_positions(ground_truth, &gt_stamps, 1.0)?;
    let matched_estimate = extract_positions(estimated, &est_stamps, params.scale)?;

    let alignment = align(&matched_estimate, &matched_ground_truth)?;
    let rigid_stats = ErrorStats::from_errors(&alignment.errors_rigid);
    let scaled_stats = ErrorStats::from_errors(&alignment.errors_scaled);

    Ok(EvaluationReport {
        matches,
        alignment,
        rigid_stats,
        scaled_stats,
        matched_ground_truth,
        matched_estimate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::parse_time_series;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn series(text: &str) -> TimeSeries {
        parse_time_series(Cursor::new(text), false).unwrap()
    }

    #[test]
    fn test_evaluate_identical_trajectories() {
        let gt = series(
            "1.0 0.0 0.0 0.0 0 0 0 1\n\
             2.0 1.0 0.0 0.0 0 0 0 1\n\
             3.0 1.0 1.0 0.0 0 0 0 1\n\
             4.0 1.0 1.0 1.0 0 0 0 1\n",
        );
        let est = series(
            "1.005 0.0 0.0 0.0 0 0 0 1\n\
             2.005 1.0 0.0 0.0 0 0 0 1\n\
             3.005 1.0 1.0 0.0 0 0 0 1\n\
             4.005 1.0 1.0 1.0 0 0 0 1\n",
        );

        let report = evaluate_trajectories(&gt, &est, &EvaluationParams::default()).unwrap();

        assert_eq!(report.matches.len(), 4);
        assert!(report.rigid_stats.rmse < 1e-10);
        assert!(report.scaled_stats.rmse < 1e-10);
        assert_relative_eq!(report.alignment.scale, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_evaluate_recovers_scale() {
        // Estimate is the ground truth shrunk by 2 (monocular scale
        // ambiguity); the similarity fit recovers it.
        let gt = series(
            "1.0 0.0 0.0 0.0\n\
             2.0 2.0 0.0 0.0\n\
             3.0 2.0 2.0 0.0\n\
             4.0 0.0 2.0 2.0\n",
        );
        let est = series(
            "1.0 0.0 0.0 0.0\n\
             2.0 1.0 0.0 0.0\n\
             3.0 1.0 1.0 0.0\n\
             4.0 0.0 1.0 1.0\n",
        );

        let report = evaluate_trajectories(&gt, &est, &EvaluationParams::default()).unwrap();

        assert_relative_eq!(report.alignment.scale, 2.0, epsilon = 1e-9);
        assert!(report.scaled_stats.rmse < 1e-9);
        assert!(report.rigid_stats.rmse > 0.1);
    }

    #[test]
    fn test_insufficient_matches_halts_before_alignment() {
        let gt = series("1.0 0 0 0\n2.0 1 1 1\n");
        let est = series("100.0 0 0 0\n200.0 1 1 1\n");

        let result = evaluate_trajectories(&gt, &est, &EvaluationParams::default());
        assert!(matches!(
            result,
            Err(EvaluationError::InsufficientMatches { found: 0 })
        ));
    }

    #[test]
    fn test_short_payload_is_error() {
        let gt = series("1.0 0.0 0.0\n2.0 1.0 1.0\n");
        let est = series("1.0 0.0 0.0 0.0\n2.0 1.0 1.0 1.0\n");

        let result = evaluate_trajectories(&gt, &est, &EvaluationParams::default());
        assert!(matches!(
            result,
            Err(EvaluationError::ShortPayload { found: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_coordinate_is_error() {
        let gt = series("1.0 0.0 oops 0.0\n2.0 1.0 1.0 1.0\n");
        let est = series("1.0 0.0 0.0 0.0\n2.0 1.0 1.0 1.0\n");

        let result = evaluate_trajectories(&gt, &est, &EvaluationParams::default());
        assert!(matches!(
            result,
            Err(EvaluationError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_extract_positions_empty_stamps() {
        let gt = series("1.0 0.0 0.0 0.0\n");
        let positions = extract_positions(&gt, &[], 1.0).unwrap();
        assert_eq!(positions.ncols(), 0);
    }

    #[test]
    fn test_worst_pair() {
        let gt = series(
            "1.0 0.0 0.0 0.0\n\
             2.0 1.0 0.0 0.0\n\
             3.0 0.0 1.0 0.0\n\
             4.0 0.0 0.0 1.0\n",
        );
        // One pose pushed off the ground truth.
        let est = series(
            "1.0 0.0 0.0 0.0\n\
             2.0 1.0 0.0 0.0\n\
             3.0 0.0 1.0 0.0\n\
             4.0 0.5 0.5 1.5\n",
        );

        let report = evaluate_trajectories(&gt, &est, &EvaluationParams::default()).unwrap();
        assert_eq!(report.worst_pair(), Some(3));
    }
}
