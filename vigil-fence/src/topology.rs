//! The topology/membership store consumed during fencing.

use async_trait::async_trait;
use thiserror::Error;
use vigil_core::Node;

/// Errors returned by the topology store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// The shard is not known to the store.
    #[error("shard '{shard}' not found")]
    ShardNotFound {
        /// The shard that was looked up.
        shard: String,
    },

    /// The store itself failed.
    #[error("topology store error: {message}")]
    Store {
        /// The store error message.
        message: String,
    },
}

/// Read-only view of cluster membership.
#[async_trait]
pub trait Topology: Send + Sync {
    /// Enumerates the nodes of a shard with their current roles.
    ///
    /// # Errors
    /// Returns an error if the shard is unknown or the store fails.
    async fn nodes_in_shard(&self, shard: &str) -> Result<Vec<Node>, TopologyError>;

    /// Resolves the shard's current primary. `None` means no primary is
    /// currently recorded, a non-fatal condition for callers that can wait
    /// for a promotion to settle.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    async fn shard_primary(&self, shard: &str) -> Result<Option<Node>, TopologyError>;

    /// Returns the name of the durability policy configured for the shard.
    ///
    /// # Errors
    /// Returns an error if the shard is unknown or the store fails.
    async fn durability_policy_name(&self, shard: &str) -> Result<String, TopologyError>;
}
