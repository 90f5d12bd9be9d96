//! Waiting for a candidate to apply its remaining relay data.

use vigil_core::NodeKey;

use crate::client::NodeClient;
use crate::error::FenceError;
use crate::status::StopReplicationStatus;

/// Blocks until the node has applied everything it received before
/// replication was stopped, as recorded in `status`.
///
/// The target is the after-stop relay position; nodes whose relay
/// coordinates are not directly comparable wait on the source-equivalent
/// position instead. The underlying wait error is surfaced unchanged -
/// retry policy belongs to the driver, typically with a deadline on the
/// client it supplies.
///
/// # Errors
/// Returns an error if the after-stop status is missing or the wait fails.
pub async fn wait_for_relay_logs_to_apply(
    client: &dyn NodeClient,
    node: &NodeKey,
    status: &StopReplicationStatus,
) -> Result<(), FenceError> {
    let after = status
        .after
        .as_ref()
        .ok_or_else(|| FenceError::MissingStatus { node: node.clone() })?;

    let target = if after.relay_log_position.is_empty() {
        &after.relay_log_source_binlog_equivalent_position
    } else {
        &after.relay_log_position
    };

    client
        .wait_for_position(node, target)
        .await
        .map_err(|source| FenceError::Client {
            node: node.clone(),
            source,
        })
}
