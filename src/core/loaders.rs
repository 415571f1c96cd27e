//! Loader for timestamped trajectory and sensor-data files.
//!
//! The input format is the TUM RGB-D benchmark text format: one record per
//! line, tokens separated by whitespace, commas, or tabs, with the first
//! token being a timestamp and the rest arbitrary string fields. Lines
//! starting with `#` are comments.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

/// Number of raw lines trimmed from each end when bounds removal is requested.
const TRIM_LINES: usize = 100;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid timestamp '{token}' on line {line}")]
    ParseError { line: usize, token: String },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// A sparse time series mapping timestamps to string payload fields.
///
/// Entries are stored sorted by timestamp; duplicate timestamps in the
/// source collapse to the last occurrence. The series is immutable once
/// built.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    entries: Vec<(f64, Vec<String>)>,
}

impl TimeSeries {
    /// Builds a series from raw (timestamp, fields) entries.
    ///
    /// Later entries win on duplicate timestamps; the result is sorted
    /// ascending by timestamp.
    pub fn from_entries(raw: Vec<(f64, Vec<String>)>) -> Self {
        let mut index: HashMap<u64, usize> = HashMap::with_capacity(raw.len());
        let mut entries: Vec<(f64, Vec<String>)> = Vec::with_capacity(raw.len());

        for (stamp, fields) in raw {
            match index.entry(stamp.to_bits()) {
                Entry::Occupied(slot) => entries[*slot.get()] = (stamp, fields),
                Entry::Vacant(slot) => {
                    slot.insert(entries.len());
                    entries.push((stamp, fields));
                }
            }
        }

        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the series has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all timestamps in ascending order.
    pub fn stamps(&self) -> Vec<f64> {
        self.entries.iter().map(|(stamp, _)| *stamp).collect()
    }

    /// Returns the payload fields for an exact timestamp, if present.
    pub fn fields(&self, stamp: f64) -> Option<&[String]> {
        self.entries
            .binary_search_by(|entry| entry.0.total_cmp(&stamp))
            .ok()
            .map(|i| self.entries[i].1.as_slice())
    }

    /// Iterates over (timestamp, fields) pairs in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[String])> + '_ {
        self.entries
            .iter()
            .map(|(stamp, fields)| (*stamp, fields.as_slice()))
    }
}

/// Load a timestamped series from a text file.
///
/// Each non-empty, non-comment line is tokenized on whitespace, commas,
/// and tabs. The first token parses as the timestamp; remaining tokens
/// are kept as string fields. Lines contributing fewer than 2 tokens are
/// discarded.
///
/// When `trim_bounds` is set, the first and last 100 raw lines are
/// dropped before any filtering. The count deliberately includes comment
/// and blank lines, matching the benchmark tooling this format comes
/// from.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a first token fails to
/// parse as a real number.
pub fn load_time_series<P: AsRef<Path>>(path: P, trim_bounds: bool) -> Result<TimeSeries> {
    let file = File::open(path)?;
    parse_time_series(BufReader::new(file), trim_bounds)
}

/// Parse a timestamped series from any buffered reader.
///
/// See [`load_time_series`] for the format rules.
pub fn parse_time_series<R: BufRead>(reader: R, trim_bounds: bool) -> Result<TimeSeries> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }

    // Trimming happens on the raw line list, before comment/length
    // filtering.
    let (skipped, trimmed) = if trim_bounds {
        if lines.len() > 2 * TRIM_LINES {
            (TRIM_LINES, &lines[TRIM_LINES..lines.len() - TRIM_LINES])
        } else {
            (0, &[] as &[String])
        }
    } else {
        (0, &lines[..])
    };

    let mut entries = Vec::with_capacity(trimmed.len());

    for (idx, line) in trimmed.iter().enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line
            .split([' ', ',', '\t'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        if tokens.len() < 2 {
            continue;
        }

        let stamp: f64 = tokens[0].parse().map_err(|_| LoaderError::ParseError {
            line: skipped + idx + 1,
            token: tokens[0].to_string(),
        })?;

        let fields = tokens[1..].iter().map(|t| t.to_string()).collect();
        entries.push((stamp, fields));
    }

    Ok(TimeSeries::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> TimeSeries {
        parse_time_series(Cursor::new(text), false).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let series = parse("1.0 0.1 0.2 0.3\n2.0 0.4 0.5 0.6\n");
        assert_eq!(series.len(), 2);
        assert_eq!(series.stamps(), vec![1.0, 2.0]);
        assert_eq!(
            series.fields(1.0).unwrap(),
            &["0.1".to_string(), "0.2".to_string(), "0.3".to_string()]
        );
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let series = parse("# header comment\n\n1.0 a b\n# another\n2.0 c d\n\n");
        assert_eq!(series.len(), 2);
        assert!(series.fields(1.0).is_some());
    }

    #[test]
    fn test_short_lines_discarded() {
        // A bare timestamp contributes only one token and is dropped.
        let series = parse("1.0\n2.0 x\n");
        assert_eq!(series.len(), 1);
        assert_eq!(series.stamps(), vec![2.0]);
    }

    #[test]
    fn test_comma_and_tab_separators() {
        let series = parse("1.0,a,b\n2.0\tc\td\n3.0 , e\t f\n");
        assert_eq!(series.len(), 3);
        assert_eq!(series.fields(3.0).unwrap(), &["e".to_string(), "f".to_string()]);
    }

    #[test]
    fn test_duplicate_timestamp_last_wins() {
        let series = parse("1.0 first\n1.0 second\n");
        assert_eq!(series.len(), 1);
        assert_eq!(series.fields(1.0).unwrap(), &["second".to_string()]);
    }

    #[test]
    fn test_unsorted_input_sorted_in_storage() {
        let series = parse("3.0 c\n1.0 a\n2.0 b\n");
        assert_eq!(series.stamps(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_invalid_timestamp_is_error() {
        let result = parse_time_series(Cursor::new("not-a-number a b\n"), false);
        assert!(matches!(
            result,
            Err(LoaderError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_trim_bounds_counts_raw_lines() {
        // 100 comment lines, 5 records, 100 comment lines. The trimmed
        // window keeps exactly the 5 records because comments count
        // toward the 100.
        let mut text = String::new();
        for _ in 0..100 {
            text.push_str("# boilerplate\n");
        }
        for i in 0..5 {
            text.push_str(&format!("{}.0 x y z\n", i));
        }
        for _ in 0..100 {
            text.push_str("# boilerplate\n");
        }

        let series = parse_time_series(Cursor::new(&text), true).unwrap();
        assert_eq!(series.len(), 5);

        // Without enough lines, trimming leaves nothing.
        let short = parse_time_series(Cursor::new("1.0 a\n2.0 b\n"), true).unwrap();
        assert!(short.is_empty());
    }

    #[test]
    fn test_trim_bounds_drops_leading_records() {
        // Records in the first 100 raw lines are lost even though they
        // are valid; this mirrors the benchmark tooling exactly.
        let mut text = String::new();
        for i in 0..105 {
            text.push_str(&format!("{}.0 x\n", i));
        }
        for _ in 0..100 {
            text.push_str("# tail\n");
        }

        let series = parse_time_series(Cursor::new(&text), true).unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.stamps()[0], 100.0);
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# trajectory").unwrap();
        writeln!(file, "1.0 0.0 0.0 0.0 0.0 0.0 0.0 1.0").unwrap();
        writeln!(file, "2.0 1.0 1.0 1.0 0.0 0.0 0.0 1.0").unwrap();
        file.flush().unwrap();

        let series = load_time_series(file.path(), false)?;
        assert_eq!(series.len(), 2);
        assert_eq!(series.fields(2.0).unwrap().len(), 7);

        Ok(())
    }
}
