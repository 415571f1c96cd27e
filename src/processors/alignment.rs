//! Closed-form trajectory alignment using Horn's method.
//!
//! Given two ordered 3D point sets (3×N, column i of the model paired
//! with column i of the data), computes the least-squares rigid transform
//! and, from the same decomposition, the similarity transform with an
//! optimal uniform scale. Both variants and their per-point errors are
//! returned in a single result.

use nalgebra::{Matrix3, Matrix3xX, Vector3};
use thiserror::Error;

/// Errors that can occur during alignment.
#[derive(Error, Debug)]
pub enum AlignmentError {
    #[error("point sets have different sizes: model has {model} columns, data has {data}")]
    LengthMismatch { model: usize, data: usize },

    #[error("empty point sets")]
    Empty,

    #[error("degenerate input: all model points coincide, scale is undefined")]
    DegenerateInput,

    #[error("SVD of the cross-covariance matrix did not converge")]
    SvdFailed,
}

/// Result type for alignment operations.
pub type Result<T> = std::result::Result<T, AlignmentError>;

/// Optimal transform mapping a model point set onto a data point set.
///
/// Holds the shared rotation plus both the rigid (scale fixed at 1) and
/// similarity (optimal uniform scale) fits, each with its translation and
/// per-point translational errors. All fields derive from one SVD.
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Optimal rotation (proper, determinant +1).
    pub rotation: Matrix3<f64>,

    /// Translation for the rigid fit (scale = 1).
    pub translation_rigid: Vector3<f64>,

    /// Translation for the similarity fit.
    pub translation_scaled: Vector3<f64>,

    /// Optimal uniform scale factor.
    pub scale: f64,

    /// Per-point Euclidean error of the rigid fit.
    pub errors_rigid: Vec<f64>,

    /// Per-point Euclidean error of the similarity fit.
    pub errors_scaled: Vec<f64>,
}

impl AlignmentResult {
    /// Apply the rigid transform `R·p + t` to a 3×N point set.
    pub fn apply_rigid(&self, points: &Matrix3xX<f64>) -> Matrix3xX<f64> {
        let mut out = &self.rotation * points;
        for mut col in out.column_iter_mut() {
            col += &self.translation_rigid;
        }
        out
    }

    /// Apply the similarity transform `s·R·p + t` to a 3×N point set.
    pub fn apply_scaled(&self, points: &Matrix3xX<f64>) -> Matrix3xX<f64> {
        let mut out = (&self.rotation * points) * self.scale;
        for mut col in out.column_iter_mut() {
            col += &self.translation_scaled;
        }
        out
    }

    /// Apply `s·R·p + t` with the rigid-fit translation.
    ///
    /// This hybrid is what gets exported and plotted: the recovered
    /// scale combined with the translation of the scale-1 fit.
    pub fn apply_scaled_rigid(&self, points: &Matrix3xX<f64>) -> Matrix3xX<f64> {
        let mut out = (&self.rotation * points) * self.scale;
        for mut col in out.column_iter_mut() {
            col += &self.translation_rigid;
        }
        out
    }
}

/// Align `model` onto `data` with Horn's closed-form method.
///
/// Both inputs are 3×N with matched columns. The rotation comes from the
/// SVD of the transposed cross-covariance of the zero-centered sets, with
/// the standard reflection correction forcing a proper rotation. The
/// scale is the closed-form least-squares factor given that rotation.
///
/// Meaningful alignment needs at least 3 non-degenerate points; with all
/// model points coincident the scale denominator vanishes and
/// [`AlignmentError::DegenerateInput`] is returned instead of NaN.
pub fn align(model: &Matrix3xX<f64>, data: &Matrix3xX<f64>) -> Result<AlignmentResult> {
    if model.ncols() != data.ncols() {
        return Err(AlignmentError::LengthMismatch {
            model: model.ncols(),
            data: data.ncols(),
        });
    }
    let n = model.ncols();
    if n == 0 {
        return Err(AlignmentError::Empty);
    }

    let model_centroid: Vector3<f64> = model.column_mean();
    let data_centroid: Vector3<f64> = data.column_mean();

    let mut model_centered = model.clone();
    for mut col in model_centered.column_iter_mut() {
        col -= &model_centroid;
    }
    let mut data_centered = data.clone();
    for mut col in data_centered.column_iter_mut() {
        col -= &data_centroid;
    }

    // Cross-covariance W = sum_i outer(model_c[:,i], data_c[:,i]).
    let mut w = Matrix3::zeros();
    for i in 0..n {
        w += model_centered.column(i) * data_centered.column(i).transpose();
    }

    let svd = w.transpose().svd(true, true);
    let u = svd.u.ok_or(AlignmentError::SvdFailed)?;
    let v_t = svd.v_t.ok_or(AlignmentError::SvdFailed)?;

    // Reflection correction: without it, ambiguous or near-planar
    // configurations can yield an improper rotation (a mirror).
    let mut s = Matrix3::identity();
    if u.determinant() * v_t.determinant() < 0.0 {
        s[(2, 2)] = -1.0;
    }
    let rotation = u * s * v_t;

    let rotated_model = &rotation * &model_centered;
    let mut dots = 0.0;
    let mut norms = 0.0;
    for i in 0..n {
        dots += data_centered.column(i).dot(&rotated_model.column(i));
        norms += model_centered.column(i).norm_squared();
    }

    if norms <= f64::EPSILON {
        return Err(AlignmentError::DegenerateInput);
    }
    let scale = dots / norms;

    let translation_scaled = data_centroid - scale * (rotation * model_centroid);
    let translation_rigid = data_centroid - rotation * model_centroid;

    let mut errors_rigid = Vec::with_capacity(n);
    let mut errors_scaled = Vec::with_capacity(n);
    for i in 0..n {
        let m = model.column(i);
        let d = data.column(i);
        let rotated = rotation * m;
        errors_rigid.push((rotated + translation_rigid - d).norm());
        errors_scaled.push((rotated * scale + translation_scaled - d).norm());
    }

    Ok(AlignmentResult {
        rotation,
        translation_rigid,
        translation_scaled,
        scale,
        errors_rigid,
        errors_scaled,
    })
}

/// Summary statistics over a per-point error vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorStats {
    /// Root mean square error
    pub rmse: f64,

    /// Mean error
    pub mean: f64,

    /// Median error
    pub median: f64,

    /// Standard deviation
    pub std: f64,

    /// Minimum error
    pub min: f64,

    /// Maximum error
    pub max: f64,

    /// Number of samples
    pub count: usize,
}

impl ErrorStats {
    /// Compute statistics from a list of errors.
    pub fn from_errors(errors: &[f64]) -> Self {
        if errors.is_empty() {
            return Self::default();
        }

        let count = errors.len();
        let n = count as f64;

        let mean = errors.iter().sum::<f64>() / n;
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let std = (errors.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n).sqrt();

        let min = errors.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = errors.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let mut sorted = errors.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Self {
            rmse,
            mean,
            median,
            std,
            min,
            max,
            count,
        }
    }

    /// Format as a single-line summary.
    pub fn summary(&self) -> String {
        format!(
            "rmse: {:.6}, mean: {:.6}, median: {:.6}, std: {:.6}, min: {:.6}, max: {:.6}",
            self.rmse, self.mean, self.median, self.std, self.min, self.max
        )
    }
}
