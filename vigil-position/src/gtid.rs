//! Set-based replication positions.
//!
//! A [`GtidSet`] names every transaction a node has executed as a set of
//! (source id, interval) pairs: `src1:1-5:8-9,src2:1-30`. Sets form a
//! partial order under the superset relation; disjoint histories are
//! incomparable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PositionError;

/// Opaque identity of the server that originated a run of transactions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a source id.
    ///
    /// # Errors
    /// Returns an error if the id is empty or contains the set syntax
    /// characters `:` or `,`.
    pub fn new(id: impl Into<String>) -> Result<Self, PositionError> {
        let id = id.into();
        if id.is_empty() || id.contains(':') || id.contains(',') {
            return Err(PositionError::InvalidSourceId { input: id });
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An inclusive run of transaction sequence numbers, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    /// First sequence number in the run.
    pub start: u64,
    /// Last sequence number in the run (inclusive).
    pub end: u64,
}

impl Interval {
    /// Creates an interval.
    ///
    /// # Panics
    /// Panics if `start` is zero or the interval runs backwards.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start >= 1, "intervals are 1-based");
        assert!(start <= end, "interval runs backwards");
        Self { start, end }
    }

    fn parse(text: &str) -> Result<Self, PositionError> {
        let (start, end) = match text.split_once('-') {
            Some((s, e)) => {
                let start = s.parse::<u64>().map_err(|_| PositionError::MalformedInterval {
                    input: text.to_string(),
                })?;
                let end = e.parse::<u64>().map_err(|_| PositionError::MalformedInterval {
                    input: text.to_string(),
                })?;
                (start, end)
            }
            None => {
                let point = text.parse::<u64>().map_err(|_| PositionError::MalformedInterval {
                    input: text.to_string(),
                })?;
                (point, point)
            }
        };

        if start < 1 || start > end {
            return Err(PositionError::InvalidIntervalBounds {
                input: text.to_string(),
            });
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// An unordered set of executed transactions, keyed by source.
///
/// Intervals are normalized on construction: sorted by start, with
/// overlapping and adjacent runs merged. Equal sets are therefore
/// structurally equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GtidSet {
    sources: BTreeMap<SourceId, Vec<Interval>>,
}

impl GtidSet {
    /// Creates the empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
        }
    }

    /// Returns true if the set names no transactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Adds an interval for a source, renormalizing that source's runs.
    pub fn add_interval(&mut self, source: SourceId, interval: Interval) {
        let runs = self.sources.entry(source).or_default();
        runs.push(interval);
        *runs = normalize(std::mem::take(runs));
    }

    /// Returns true if `self` is a superset of `other`: every transaction
    /// named by `other` is also named by `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.sources.iter().all(|(source, intervals)| {
            intervals.iter().all(|interval| self.covers(source, *interval))
        })
    }

    /// Returns true if every sequence number in `interval` for `source` is
    /// in the set. Runs are merged, so one run must cover the whole span.
    fn covers(&self, source: &SourceId, interval: Interval) -> bool {
        self.sources.get(source).is_some_and(|runs| {
            runs.iter()
                .any(|run| run.start <= interval.start && interval.end <= run.end)
        })
    }
}

/// Sorts runs and merges overlapping or adjacent ones.
fn normalize(mut runs: Vec<Interval>) -> Vec<Interval> {
    runs.sort_unstable();
    let mut merged: Vec<Interval> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if run.start <= last.end.saturating_add(1) => {
                last.end = last.end.max(run.end);
            }
            _ => merged.push(run),
        }
    }
    merged
}

impl FromStr for GtidSet {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::new();
        if s.is_empty() {
            return Ok(set);
        }

        for source_text in s.split(',') {
            let mut parts = source_text.split(':');
            let id = parts.next().unwrap_or_default();
            if id.is_empty() {
                return Err(PositionError::InvalidSourceId {
                    input: source_text.to_string(),
                });
            }
            let source = SourceId::new(id)?;

            let mut intervals = Vec::new();
            for interval_text in parts {
                intervals.push(Interval::parse(interval_text)?);
            }
            if intervals.is_empty() {
                return Err(PositionError::MalformedInterval {
                    input: source_text.to_string(),
                });
            }

            for interval in intervals {
                set.add_interval(source.clone(), interval);
            }
        }

        Ok(set)
    }
}

impl fmt::Display for GtidSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first_source = true;
        for (source, runs) in &self.sources {
            if !first_source {
                write!(f, ",")?;
            }
            first_source = false;
            write!(f, "{source}")?;
            for run in runs {
                write!(f, ":{run}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(text: &str) -> GtidSet {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_display_roundtrip() {
        for text in ["src1:1-5", "src1:1-5:8-9,src2:1-30", "src1:7"] {
            assert_eq!(format!("{}", set(text)), text);
        }
    }

    #[test]
    fn test_parse_merges_adjacent_and_overlapping() {
        assert_eq!(set("src1:1-5:6-9"), set("src1:1-9"));
        assert_eq!(set("src1:1-5:3-9"), set("src1:1-9"));
        assert_eq!(set("src1:8-9:1-5"), set("src1:1-5:8-9"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "src1".parse::<GtidSet>(),
            Err(PositionError::MalformedInterval { .. })
        ));
        assert!(matches!(
            ":1-5".parse::<GtidSet>(),
            Err(PositionError::InvalidSourceId { .. })
        ));
        assert!(matches!(
            "src1:5-1".parse::<GtidSet>(),
            Err(PositionError::InvalidIntervalBounds { .. })
        ));
        assert!(matches!(
            "src1:0-3".parse::<GtidSet>(),
            Err(PositionError::InvalidIntervalBounds { .. })
        ));
        assert!(matches!(
            "src1:x-3".parse::<GtidSet>(),
            Err(PositionError::MalformedInterval { .. })
        ));
    }

    #[test]
    fn test_superset() {
        assert!(set("src1:1-9").contains(&set("src1:1-5")));
        assert!(set("src1:1-9").contains(&set("src1:3-7")));
        assert!(set("src1:1-9,src2:1-4").contains(&set("src2:2-3")));
        assert!(!set("src1:1-5").contains(&set("src1:1-9")));
        assert!(!set("src1:1-5").contains(&set("src2:1")));
        // A hole in the runs breaks coverage.
        assert!(!set("src1:1-5:8-9").contains(&set("src1:1-9")));
    }

    #[test]
    fn test_empty_set_is_subset_of_everything() {
        assert!(set("src1:1-5").contains(&GtidSet::new()));
        assert!(GtidSet::new().contains(&GtidSet::new()));
        assert!(!GtidSet::new().contains(&set("src1:1")));
    }

    #[test]
    fn test_source_id_rejects_syntax_characters() {
        assert!(SourceId::new("src:1").is_err());
        assert!(SourceId::new("a,b").is_err());
        assert!(SourceId::new("").is_err());
        assert!(SourceId::new("6fa7bf4e").is_ok());
    }
}
