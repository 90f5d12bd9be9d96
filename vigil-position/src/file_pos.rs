//! Offset-based replication positions.

use std::fmt;
use std::str::FromStr;

use crate::error::PositionError;

/// A (log file, byte offset) position with lexicographic order: file name
/// first, offset second. Log files sort by name in rotation order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilePos {
    /// Log file name.
    pub file: String,
    /// Byte offset within the file.
    pub offset: u64,
}

impl FilePos {
    /// Creates a position.
    #[must_use]
    pub fn new(file: impl Into<String>, offset: u64) -> Self {
        Self {
            file: file.into(),
            offset,
        }
    }

    /// The zero position: no file, offset zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            file: String::new(),
            offset: 0,
        }
    }

    /// Returns true if this is the zero position.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.file.is_empty() && self.offset == 0
    }
}

impl fmt::Display for FilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.offset)
    }
}

impl FromStr for FilePos {
    type Err = PositionError;

    /// Parses the `file:offset` form. The offset is the part after the last
    /// `:`, so file names may themselves contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (file, offset) = s.rsplit_once(':').ok_or_else(|| PositionError::MalformedFilePos {
            input: s.to_string(),
        })?;
        let offset = offset.parse::<u64>().map_err(|_| PositionError::MalformedFilePos {
            input: s.to_string(),
        })?;
        if file.is_empty() {
            return Err(PositionError::MalformedFilePos {
                input: s.to_string(),
            });
        }
        Ok(Self::new(file, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_roundtrip() {
        let pos = "binlog.000003:1847".parse::<FilePos>().unwrap();
        assert_eq!(pos, FilePos::new("binlog.000003", 1847));
        assert_eq!(format!("{pos}"), "binlog.000003:1847");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("binlog.000003".parse::<FilePos>().is_err());
        assert!(":1847".parse::<FilePos>().is_err());
        assert!("binlog.000003:x".parse::<FilePos>().is_err());
    }

    #[test]
    fn test_lexicographic_order() {
        let a = FilePos::new("binlog.000001", 900);
        let b = FilePos::new("binlog.000002", 4);
        let c = FilePos::new("binlog.000002", 100);

        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.cmp(&b.clone()), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_zero() {
        assert!(FilePos::zero().is_zero());
        assert!(!FilePos::new("binlog.000001", 0).is_zero());
    }
}
