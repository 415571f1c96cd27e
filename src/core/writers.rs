//! Writers for association and aligned-trajectory output files.
//!
//! Both formats are plain space-separated text:
//! - associations: `tsA x y z tsB x y z` per matched pair
//! - aligned trajectory: `timestamp x y z` per pose, 6-decimal coordinates

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Matrix3xX;
use thiserror::Error;

use crate::processors::association::Match;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Mismatched input lengths.
    #[error("length mismatch: {left} entries on the left, {right} point columns on the right")]
    LengthMismatch { left: usize, right: usize },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Write matched pairs with their ground-truth and aligned-estimate points.
///
/// One line per match: `tsA x y z tsB x y z`, where the first point comes
/// from `first_points` and the second from `second_points` (both 3×N,
/// column i corresponding to match i).
///
/// # Errors
///
/// Returns an error if the column counts disagree with the number of
/// matches or the file cannot be written.
pub fn write_associations(
    path: &Path,
    matches: &[Match],
    first_points: &Matrix3xX<f64>,
    second_points: &Matrix3xX<f64>,
) -> Result<()> {
    if first_points.ncols() != matches.len() {
        return Err(WriteError::LengthMismatch {
            left: matches.len(),
            right: first_points.ncols(),
        });
    }
    if second_points.ncols() != matches.len() {
        return Err(WriteError::LengthMismatch {
            left: matches.len(),
            right: second_points.ncols(),
        });
    }

    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    for (i, m) in matches.iter().enumerate() {
        let p = first_points.column(i);
        let q = second_points.column(i);
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {}",
            m.first, p[0], p[1], p[2], m.second, q[0], q[1], q[2]
        )
        .map_err(|e| WriteError::WriteFile {
            path: path_str.clone(),
            source: e,
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write an aligned trajectory as `timestamp x y z` lines.
///
/// Coordinates use 6-decimal fixed formatting. `points` is 3×N with
/// column i corresponding to `stamps[i]`.
///
/// # Errors
///
/// Returns an error if the column count disagrees with the number of
/// stamps or the file cannot be written.
pub fn write_aligned_trajectory(
    path: &Path,
    stamps: &[f64],
    points: &Matrix3xX<f64>,
) -> Result<()> {
    if points.ncols() != stamps.len() {
        return Err(WriteError::LengthMismatch {
            left: stamps.len(),
            right: points.ncols(),
        });
    }

    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    for (i, stamp) in stamps.iter().enumerate() {
        let p = points.column(i);
        writeln!(writer, "{} {:.6} {:.6} {:.6}", stamp, p[0], p[1], p[2]).map_err(|e| {
            WriteError::WriteFile {
                path: path_str.clone(),
                source: e,
            }
        })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}
