//! Pointing a node's replication at its shard's current primary.

use tracing::{debug, info};
use vigil_core::Node;

use crate::client::NodeClient;
use crate::durability::durability_policy;
use crate::error::FenceError;
use crate::topology::Topology;

/// Sets the node's replication source to the shard's current primary,
/// deciding from the shard's durability policy whether the node should
/// send semi-sync acknowledgements. Does not start replication forcefully.
///
/// If the shard has no recorded primary the call is a no-op: promotion has
/// not settled yet and the caller retries later.
///
/// # Errors
/// Returns an error if the topology store fails, the shard's durability
/// policy is unknown, or the RPC fails.
pub async fn set_replication_source(
    client: &dyn NodeClient,
    topology: &dyn Topology,
    shard: &str,
    node: &Node,
) -> Result<(), FenceError> {
    let Some(primary) = topology.shard_primary(shard).await? else {
        debug!(shard, node = %node.key, "no shard primary recorded, skipping");
        return Ok(());
    };

    let policy_name = topology.durability_policy_name(shard).await?;
    info!(policy = %policy_name, shard, "loading durability policy");
    let durability = durability_policy(&policy_name)?;

    let semi_sync = durability.is_replica_semi_sync(&primary, node);
    client
        .set_replication_source(&node.key, &primary.key, semi_sync)
        .await
        .map_err(|source| FenceError::Client {
            node: node.key.clone(),
            source,
        })
}
