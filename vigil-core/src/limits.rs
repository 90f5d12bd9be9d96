//! System limits and configuration bounds.
//!
//! Following `TigerStyle`: put limits on everything. A fencing pass fans out
//! one task per node, so the node count per shard is explicitly bounded.

/// Maximum number of nodes in a single shard.
///
/// Fencing launches one concurrent task per node; shards are small (tens,
/// not thousands), and this cap keeps the fan-out predictable.
pub const NODES_PER_SHARD_MAX: usize = 64;

/// Default deadline for stopping replication across a shard (microseconds).
pub const STOP_REPLICATION_TIMEOUT_US_DEFAULT: u64 = 30_000_000;
