//! Node identity and role types.
//!
//! Following `TigerStyle`: explicit types prevent bugs from mixing up a node
//! key with any other string. A `NodeKey` is globally unique, never reused
//! while the node exists, and stable across restarts of the same node.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when parsing a [`NodeKey`] from its string form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeKeyParseError {
    /// The input is not of the `cell-uid` form.
    #[error("node key '{input}' is not of the form cell-uid")]
    Malformed {
        /// The rejected input.
        input: String,
    },

    /// The uid part is not a number.
    #[error("node key '{input}' has a non-numeric uid")]
    InvalidUid {
        /// The rejected input.
        input: String,
    },
}

/// Globally unique identity of a database node.
///
/// A key is a cell (failure domain) name plus a numeric id, displayed as
/// `cell-uid`. Keys are the map key throughout the fencing pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    cell: String,
    uid: u64,
}

impl NodeKey {
    /// Creates a key from a cell name and numeric id.
    #[must_use]
    pub fn new(cell: impl Into<String>, uid: u64) -> Self {
        Self {
            cell: cell.into(),
            uid,
        }
    }

    /// Returns the cell (failure domain) name.
    #[must_use]
    pub fn cell(&self) -> &str {
        &self.cell
    }

    /// Returns the numeric id within the cell.
    #[must_use]
    pub const fn uid(&self) -> u64 {
        self.uid
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.cell, self.uid)
    }
}

impl FromStr for NodeKey {
    type Err = NodeKeyParseError;

    /// Parses the `cell-uid` form. The uid is the part after the last `-`,
    /// so cell names may themselves contain dashes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cell, uid) = s.rsplit_once('-').ok_or_else(|| NodeKeyParseError::Malformed {
            input: s.to_string(),
        })?;
        if cell.is_empty() {
            return Err(NodeKeyParseError::Malformed {
                input: s.to_string(),
            });
        }
        let uid = uid.parse::<u64>().map_err(|_| NodeKeyParseError::InvalidUid {
            input: s.to_string(),
        })?;
        Ok(Self::new(cell, uid))
    }
}

/// Role a node currently serves in its shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// The single node accepting writes.
    Primary,
    /// A replica eligible for promotion.
    Replica,
    /// A read-only replica serving batch traffic.
    Rdonly,
    /// A node currently taking a backup.
    Backup,
    /// A node restoring from a backup.
    Restore,
    /// A node drained of traffic for maintenance.
    Drained,
    /// An unassigned spare.
    Spare,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primary => "primary",
            Self::Replica => "replica",
            Self::Rdonly => "rdonly",
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::Drained => "drained",
            Self::Spare => "spare",
        };
        write!(f, "{name}")
    }
}

/// A node record as enumerated by the topology collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// The node's globally unique key.
    pub key: NodeKey,
    /// The role the node currently serves.
    pub role: NodeRole,
}

impl Node {
    /// Creates a node record.
    #[must_use]
    pub const fn new(key: NodeKey, role: NodeRole) -> Self {
        Self { key, role }
    }
}
