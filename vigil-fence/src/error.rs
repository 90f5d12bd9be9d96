//! Fencing error taxonomy.
//!
//! Per-node transient errors are recorded, never fatal alone; only aggregate
//! conditions escalate. A driver receives exactly one of: a snapshot, a
//! fatal precondition, a fencing failure, or a cancellation - never a
//! partial snapshot.

use thiserror::Error;
use vigil_core::NodeKey;
use vigil_position::PositionError;

use crate::client::ClientError;
use crate::topology::TopologyError;

/// Errors produced by fencing passes and position resolution.
#[derive(Debug, Error)]
pub enum FenceError {
    /// A node RPC failed; recorded per node, fatal only in aggregate.
    #[error("error when getting replication status for node {node}: {source}")]
    Client {
        /// The node the call targeted.
        node: NodeKey,
        /// The underlying RPC error.
        #[source]
        source: ClientError,
    },

    /// A node thinks it is primary and the demotion fallback failed. A
    /// strong signal that write-safety cannot be proven for this node.
    #[error("node {node} thinks it's primary but we failed to demote it: {source}")]
    DemoteFailed {
        /// The node that refused demotion.
        node: NodeKey,
        /// The underlying RPC error.
        #[source]
        source: ClientError,
    },

    /// The pass deadline expired before the operation completed.
    #[error("{operation} cancelled: deadline exceeded")]
    Cancelled {
        /// The operation that was abandoned.
        operation: &'static str,
    },

    /// Fencing failure: too many nodes unreached and the durability policy
    /// cannot prove the unreached nodes are unable to accept writes.
    #[error("could not reach sufficient nodes to guarantee safety: {first}")]
    NotEnoughNodes {
        /// The first per-node error recorded during the pass.
        #[source]
        first: Box<FenceError>,
    },

    /// Every node in the pass was ignored; there is nothing to fence.
    #[error("no candidate nodes to stop replication on")]
    NoCandidateNodes,

    /// Fatal precondition: a node has no relay position while another node
    /// in the same decision has set-based relay positions.
    #[error("node {node} has no relay log position, but another node has set-based relay log positions")]
    EmptyRelayPosition {
        /// The node with the empty relay position.
        node: NodeKey,
    },

    /// Fatal precondition: set-based and offset-based relay positions mixed
    /// across nodes in the same decision.
    #[error("encountered mix of set-based and offset-based relay log positions")]
    MixedPositionRepresentations,

    /// A node's after-stop status is missing.
    #[error("node {node} has no replication status after stopping")]
    MissingStatus {
        /// The node with the missing status.
        node: NodeKey,
    },

    /// A stop status carries no before-state.
    #[error("replication status has no before-state")]
    MissingBeforeState,

    /// A demoted primary's executed position did not decode.
    #[error("could not decode primary executed position for node {node}: {source}")]
    PrimaryPositionDecode {
        /// The node whose position was rejected.
        node: NodeKey,
        /// The decode error.
        #[source]
        source: PositionError,
    },

    /// A replication position did not decode or compare.
    #[error("invalid replication position: {0}")]
    Position(#[from] PositionError),

    /// No durability policy is registered under the requested name.
    #[error("unknown durability policy '{name}'")]
    UnknownDurabilityPolicy {
        /// The requested policy name.
        name: String,
    },

    /// The topology store failed.
    #[error("topology error: {0}")]
    Topology(#[from] TopologyError),
}
