//! The tagged-union position type and its wire form.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::PositionError;
use crate::file_pos::FilePos;
use crate::gtid::GtidSet;

/// Wire-form flavor tag for set-based positions.
const FLAVOR_GTID: &str = "gtid";

/// Wire-form flavor tag for offset-based positions.
const FLAVOR_FILEPOS: &str = "filepos";

/// Outcome of comparing two positions of the same representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOrdering {
    /// The left position names strictly fewer transactions.
    Less,
    /// Both positions name the same transactions.
    Equal,
    /// The left position names strictly more transactions.
    Greater,
    /// Divergent set-based histories; neither contains the other.
    ///
    /// Callers ranking candidates must treat this as an error, never as
    /// `Equal`.
    Incomparable,
}

/// A replication position in one of two representations.
///
/// Positions of different representations are never compared directly;
/// mixing them across nodes in one decision is a fatal inconsistency that
/// the resolver detects before any comparison happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Set-based: every executed transaction, as source/interval pairs.
    Gtid(GtidSet),
    /// Offset-based: a (log file, byte offset) pair.
    FilePos(FilePos),
}

impl Position {
    /// The zero position: no executed transactions recorded.
    #[must_use]
    pub const fn zero() -> Self {
        Self::Gtid(GtidSet::new())
    }

    /// Decodes a position from its `flavor/value` wire form.
    ///
    /// The empty string decodes to the zero position.
    ///
    /// # Errors
    /// Returns an error if the flavor prefix is missing or unknown, or the
    /// value is malformed for its flavor.
    pub fn decode(wire: &str) -> Result<Self, PositionError> {
        if wire.is_empty() {
            return Ok(Self::zero());
        }

        let (flavor, value) = wire.split_once('/').ok_or_else(|| PositionError::MissingFlavor {
            wire: wire.to_string(),
        })?;

        match flavor {
            FLAVOR_GTID => Ok(Self::Gtid(value.parse()?)),
            FLAVOR_FILEPOS => Ok(Self::FilePos(value.parse()?)),
            _ => Err(PositionError::UnknownFlavor {
                flavor: flavor.to_string(),
            }),
        }
    }

    /// Returns true if this position names no executed transactions.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Gtid(set) => set.is_empty(),
            Self::FilePos(pos) => pos.is_zero(),
        }
    }

    /// Returns true for the set-based representation.
    #[must_use]
    pub const fn is_set_based(&self) -> bool {
        matches!(self, Self::Gtid(_))
    }

    /// Compares two positions of the same representation.
    ///
    /// # Errors
    /// Returns an error if the representations differ; cross-tag comparison
    /// is rejected explicitly, never coerced.
    pub fn compare(&self, other: &Self) -> Result<PositionOrdering, PositionError> {
        match (self, other) {
            (Self::Gtid(a), Self::Gtid(b)) => {
                Ok(match (a.contains(b), b.contains(a)) {
                    (true, true) => PositionOrdering::Equal,
                    (true, false) => PositionOrdering::Greater,
                    (false, true) => PositionOrdering::Less,
                    (false, false) => PositionOrdering::Incomparable,
                })
            }
            (Self::FilePos(a), Self::FilePos(b)) => Ok(match a.cmp(b) {
                Ordering::Less => PositionOrdering::Less,
                Ordering::Equal => PositionOrdering::Equal,
                Ordering::Greater => PositionOrdering::Greater,
            }),
            _ => Err(PositionError::IncompatibleVariants),
        }
    }
}

impl fmt::Display for Position {
    /// Re-encodes to the wire form. The zero position encodes to the empty
    /// string, whichever representation carries it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return Ok(());
        }
        match self {
            Self::Gtid(set) => write!(f, "{FLAVOR_GTID}/{set}"),
            Self::FilePos(pos) => write!(f, "{FLAVOR_FILEPOS}/{pos}"),
        }
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
