//! The per-node RPC surface consumed during fencing.
//!
//! Vigil owns no transport; a driver supplies an implementation of
//! [`NodeClient`] backed by whatever RPC stack the deployment uses.

use async_trait::async_trait;
use thiserror::Error;
use vigil_core::NodeKey;

use crate::status::{PrimaryStatus, StopReplicationMode, StopReplicationStatus};

/// Errors returned by node RPCs.
///
/// `NotReplica` is a classification, not a failure: it tells the fencing
/// pass that the node is already acting as primary and must be demoted
/// instead of stopped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The node is not currently configured as a replica.
    #[error("node is not a replica")]
    NotReplica,

    /// The remote side answered with an error.
    #[error("rpc failed: {message}")]
    Rpc {
        /// The remote error message.
        message: String,
    },

    /// The node could not be reached.
    #[error("network error: {message}")]
    Network {
        /// The transport error message.
        message: String,
    },

    /// The call did not complete in time.
    #[error("rpc timed out after {waited_us}us")]
    TimedOut {
        /// How long we waited (microseconds).
        waited_us: u64,
    },
}

impl ClientError {
    /// Returns true for the "not currently a replica" classification.
    #[must_use]
    pub const fn is_not_replica(&self) -> bool {
        matches!(self, Self::NotReplica)
    }
}

/// RPC operations against a single node.
///
/// Implementations must be `Send + Sync`; one client instance serves every
/// concurrent task of a fencing pass.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Stops replication on the node and reports status from before and
    /// after the stop.
    ///
    /// # Errors
    /// Returns [`ClientError::NotReplica`] if the node is not replicating,
    /// or a transport/remote error.
    async fn stop_replication_and_get_status(
        &self,
        node: &NodeKey,
        mode: StopReplicationMode,
    ) -> Result<StopReplicationStatus, ClientError>;

    /// Demotes a node acting as primary to read-only and reports its
    /// executed position.
    ///
    /// # Errors
    /// Returns a transport/remote error if the demotion did not take effect.
    async fn demote_primary(&self, node: &NodeKey) -> Result<PrimaryStatus, ClientError>;

    /// Blocks until the node's applied position reaches `target` (wire
    /// form), or the call fails.
    ///
    /// # Errors
    /// Returns a transport/remote error; retry policy belongs to the caller.
    async fn wait_for_position(&self, node: &NodeKey, target: &str) -> Result<(), ClientError>;

    /// Points the node's replication at `source`, with or without
    /// semi-synchronous acknowledgement. Does not start replication.
    ///
    /// # Errors
    /// Returns a transport/remote error.
    async fn set_replication_source(
        &self,
        node: &NodeKey,
        source: &NodeKey,
        semi_sync_ack: bool,
    ) -> Result<(), ClientError>;
}
