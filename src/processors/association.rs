//! Nearest-timestamp association between two time series.

use std::collections::HashSet;

use crate::core::loaders::TimeSeries;

/// A matched pair of timestamps, one from each series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Timestamp from the first series.
    pub first: f64,
    /// Timestamp from the second series.
    pub second: f64,
}

/// Find the best one-to-one matches between two timestamped series.
///
/// Every candidate pair whose adjusted difference
/// `|a - (b + offset)| < max_difference` is enumerated, sorted by
/// (difference, a, b), and accepted greedily: a pair is taken only if
/// neither timestamp has been used yet. This favors the closest pairs
/// and yields a partial bijection.
///
/// The candidate set is the full cross product; typical trajectory files
/// hold a few thousand entries, so no spatial index is needed.
///
/// Returns accepted pairs sorted ascending by the first-series timestamp.
/// The result is deterministic for a given input.
pub fn associate(
    first: &TimeSeries,
    second: &TimeSeries,
    offset: f64,
    max_difference: f64,
) -> Vec<Match> {
    let mut candidates: Vec<(f64, f64, f64)> = Vec::new();

    for (a, _) in first.iter() {
        for (b, _) in second.iter() {
            let diff = (a - (b + offset)).abs();
            if diff < max_difference {
                candidates.push((diff, a, b));
            }
        }
    }

    candidates.sort_by(|x, y| {
        x.0.total_cmp(&y.0)
            .then(x.1.total_cmp(&y.1))
            .then(x.2.total_cmp(&y.2))
    });

    let mut used_first: HashSet<u64> = HashSet::new();
    let mut used_second: HashSet<u64> = HashSet::new();
    let mut matches = Vec::new();

    for (_, a, b) in candidates {
        if !used_first.contains(&a.to_bits()) && !used_second.contains(&b.to_bits()) {
            used_first.insert(a.to_bits());
            used_second.insert(b.to_bits());
            matches.push(Match { first: a, second: b });
        }
    }

    matches.sort_by(|x, y| {
        x.first
            .total_cmp(&y.first)
            .then(x.second.total_cmp(&y.second))
    });
    matches
}

/// Format one matched pair as an output line.
///
/// With `first_only` the line holds only the first series' entry:
/// `a fieldsA...`; otherwise both entries are concatenated with the
/// second timestamp shown with the offset removed:
/// `a fieldsA... b-offset fieldsB...`.
pub fn format_match(
    m: &Match,
    first: &TimeSeries,
    second: &TimeSeries,
    offset: f64,
    first_only: bool,
) -> String {
    let first_fields = first.fields(m.first).map(|f| f.join(" ")).unwrap_or_default();

    if first_only {
        format!("{:.6} {}", m.first, first_fields)
    } else {
        let second_fields = second
            .fields(m.second)
            .map(|f| f.join(" "))
            .unwrap_or_default();
        format!(
            "{:.6} {} {:.6} {}",
            m.first,
            first_fields,
            m.second - offset,
            second_fields
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::parse_time_series;
    use std::io::Cursor;

    fn series(text: &str) -> TimeSeries {
        parse_time_series(Cursor::new(text), false).unwrap()
    }

    #[test]
    fn test_associate_basic() {
        let first = series("1.0 0 0 0\n2.0 1 1 1\n");
        let second = series("1.01 0 0 0\n2.01 1 1 1\n");

        let matches = associate(&first, &second, 0.0, 0.02);

        assert_eq!(
            matches,
            vec![
                Match {
                    first: 1.0,
                    second: 1.01
                },
                Match {
                    first: 2.0,
                    second: 2.01
                },
            ]
        );
    }

    #[test]
    fn test_tolerance_is_strict() {
        let first = series("1.0 a\n");
        let second = series("1.02 b\n");

        // |1.0 - 1.02| == 0.02 is not strictly less than 0.02.
        assert!(associate(&first, &second, 0.0, 0.02).is_empty());
        assert_eq!(associate(&first, &second, 0.0, 0.021).len(), 1);
    }

    #[test]
    fn test_offset_applied_to_second() {
        let first = series("10.0 a\n");
        let second = series("9.5 b\n");

        assert!(associate(&first, &second, 0.0, 0.02).is_empty());
        let matches = associate(&first, &second, 0.5, 0.02);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].second, 9.5);
    }

    #[test]
    fn test_partial_bijection() {
        // Two first-series stamps compete for one second-series stamp;
        // only the closer one wins, the other pairs with nothing.
        let first = series("1.0 a\n1.004 b\n");
        let second = series("1.005 c\n");

        let matches = associate(&first, &second, 0.0, 0.02);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].first, 1.004);

        let mut seen_first = Vec::new();
        let mut seen_second = Vec::new();
        for m in &matches {
            assert!(!seen_first.contains(&m.first.to_bits()));
            assert!(!seen_second.contains(&m.second.to_bits()));
            seen_first.push(m.first.to_bits());
            seen_second.push(m.second.to_bits());
        }
    }

    #[test]
    fn test_greedy_prefers_closest() {
        // 2.0 could match either side; the closer candidate (2.001) must
        // win even though 1.99 appears first in the file.
        let first = series("2.0 a\n");
        let second = series("1.99 b\n2.001 c\n");

        let matches = associate(&first, &second, 0.0, 0.05);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].second, 2.001);
    }

    #[test]
    fn test_deterministic() {
        let first = series("1.0 a\n1.01 b\n1.02 c\n");
        let second = series("1.005 d\n1.015 e\n1.025 f\n");

        let run1 = associate(&first, &second, 0.0, 0.1);
        let run2 = associate(&first, &second, 0.0, 0.1);
        assert_eq!(run1, run2);
    }

    #[test]
    fn test_disjoint_series_no_matches() {
        let first = series("1.0 a\n2.0 b\n");
        let second = series("100.0 c\n200.0 d\n");

        assert!(associate(&first, &second, 0.0, 0.02).is_empty());
    }

    #[test]
    fn test_format_match() {
        let first = series("1.0 0.1 0.2\n");
        let second = series("1.51 0.3 0.4\n");
        let m = Match {
            first: 1.0,
            second: 1.51,
        };

        let line = format_match(&m, &first, &second, 0.5, false);
        assert_eq!(line, "1.000000 0.1 0.2 1.010000 0.3 0.4");

        let line = format_match(&m, &first, &second, 0.5, true);
        assert_eq!(line, "1.000000 0.1 0.2");
    }
}
