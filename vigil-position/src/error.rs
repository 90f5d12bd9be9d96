//! Position decoding and comparison errors.

use thiserror::Error;

/// Errors produced while decoding or comparing replication positions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The wire form carries no `flavor/` prefix.
    #[error("position '{wire}' has no flavor prefix")]
    MissingFlavor {
        /// The rejected wire form.
        wire: String,
    },

    /// The flavor prefix names no known representation.
    #[error("unknown position flavor '{flavor}'")]
    UnknownFlavor {
        /// The rejected flavor.
        flavor: String,
    },

    /// A source id in a set-based position is empty or carries set syntax.
    #[error("invalid source id in gtid set '{input}'")]
    InvalidSourceId {
        /// The rejected text.
        input: String,
    },

    /// An interval in a set-based position is not `start` or `start-end`.
    #[error("malformed gtid interval '{input}'")]
    MalformedInterval {
        /// The rejected interval text.
        input: String,
    },

    /// An interval runs backwards or starts at zero.
    #[error("invalid gtid interval bounds '{input}'")]
    InvalidIntervalBounds {
        /// The rejected interval text.
        input: String,
    },

    /// An offset-based position is not `file:offset`.
    #[error("malformed file position '{input}'")]
    MalformedFilePos {
        /// The rejected position text.
        input: String,
    },

    /// A set-based position was compared with an offset-based one.
    #[error("cannot compare a set-based position with an offset-based position")]
    IncompatibleVariants,
}
