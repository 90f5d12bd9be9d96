//! Stopping replication shard-wide and snapshotting what answered.
//!
//! One fencing pass fans out a stop-replication task per node, classifies
//! every outcome, and decides - with the durability policy as arbiter -
//! whether the nodes that answered are sufficient to prove the rest can no
//! longer accept writes.
//!
//! # Concurrency
//!
//! One task per node, launched eagerly; shards are small enough that no
//! worker pool is needed. All tasks share one cancellation token and one
//! per-pass deadline. The snapshot's maps are guarded by a mutex held only
//! for the brief mutation after each RPC returns; no task holds it across a
//! network call. A task observing cancellation stops waiting on its RPC and
//! reports promptly, but the remote side may well keep processing the stop
//! call - the durability check below is what proves safety, not the fact
//! that we stopped listening.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vigil_core::{Node, NodeKey, NODES_PER_SHARD_MAX, STOP_REPLICATION_TIMEOUT_US_DEFAULT};
use vigil_sync::{TaskGroup, TaskReport};

use crate::client::NodeClient;
use crate::durability::{have_revoked, Durability};
use crate::error::FenceError;
use crate::status::{PrimaryStatus, StopReplicationMode, StopReplicationStatus};

/// Maximum number of recorded errors below which a pass is trivially safe:
/// enough nodes answered that the durability check is not consulted.
///
/// One error is tolerated because the outage already removed one
/// functioning primary from the expected count. Deployments with larger
/// shards should re-derive this margin rather than assume it generalizes.
const TRIVIAL_SAFE_ERRORS_MAX: usize = 1;

/// The aggregate of one fencing pass.
///
/// `status_map` and `primary_status_map` are disjoint in key space; every
/// key in either belongs to a node in `reachable_nodes`. The snapshot is
/// created fresh per pass and discarded once the driver has extracted its
/// position map.
#[derive(Debug, Clone, Default)]
pub struct ReplicationSnapshot {
    /// Status after the stop, for nodes that answered normally.
    pub status_map: HashMap<NodeKey, StopReplicationStatus>,
    /// Executed positions, for nodes that turned out to think they are
    /// primary and were demoted instead.
    pub primary_status_map: HashMap<NodeKey, PrimaryStatus>,
    /// Every node that produced a usable answer. Consumed by the fencing
    /// proof only, never for position comparison.
    pub reachable_nodes: Vec<Node>,
    /// Whether each answering node is currently taking a backup.
    pub backup_state: HashMap<NodeKey, bool>,
}

/// Inputs of one fencing pass.
#[derive(Debug, Clone)]
pub struct StopReplicationRequest {
    /// Every node in the shard, keyed by identity.
    pub nodes: HashMap<NodeKey, Node>,
    /// Deadline for the whole pass.
    pub stop_timeout: Duration,
    /// Nodes to leave untouched.
    pub ignored_nodes: HashSet<NodeKey>,
    /// A node that must report before the pass converges, even once the
    /// success threshold is met by others.
    pub wait_for_node: Option<NodeKey>,
    /// Require every non-ignored node to report, not just `n - 1`.
    pub wait_for_all_nodes: bool,
}

impl StopReplicationRequest {
    /// Creates a request over the given nodes with the default deadline.
    #[must_use]
    pub fn new(nodes: HashMap<NodeKey, Node>) -> Self {
        Self {
            nodes,
            stop_timeout: Duration::from_micros(STOP_REPLICATION_TIMEOUT_US_DEFAULT),
            ignored_nodes: HashSet::new(),
            wait_for_node: None,
            wait_for_all_nodes: false,
        }
    }

    /// Overrides the pass deadline.
    #[must_use]
    pub const fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    /// Marks nodes to leave untouched.
    #[must_use]
    pub fn with_ignored_nodes(mut self, ignored: HashSet<NodeKey>) -> Self {
        self.ignored_nodes = ignored;
        self
    }

    /// Flags one node that must report before the pass converges.
    #[must_use]
    pub fn with_wait_for_node(mut self, node: NodeKey) -> Self {
        self.wait_for_node = Some(node);
        self
    }

    /// Requires every non-ignored node to report.
    #[must_use]
    pub const fn with_wait_for_all_nodes(mut self) -> Self {
        self.wait_for_all_nodes = true;
        self
    }
}

/// Stops replication on every non-ignored node and builds the status maps
/// of one fencing pass.
///
/// The pass succeeds if at most one node failed to answer, or if the
/// durability policy proves that the unreached nodes can no longer accept
/// writes. A false "safe" verdict here risks split-brain; every doubtful
/// path fails the pass instead.
///
/// # Errors
/// Returns [`FenceError::NoCandidateNodes`] if every node is ignored, and
/// [`FenceError::NotEnoughNodes`] - wrapping the first per-node error -
/// when too many nodes were unreached and fencing cannot be proven.
///
/// # Panics
/// Panics if the shard exceeds [`NODES_PER_SHARD_MAX`].
pub async fn stop_replication_and_build_status_maps(
    client: Arc<dyn NodeClient>,
    durability: &dyn Durability,
    request: StopReplicationRequest,
) -> Result<ReplicationSnapshot, FenceError> {
    let all_nodes: Vec<Node> = request.nodes.values().cloned().collect();
    let candidates: Vec<Node> = all_nodes
        .iter()
        .filter(|node| !request.ignored_nodes.contains(&node.key))
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Err(FenceError::NoCandidateNodes);
    }
    assert!(
        candidates.len() <= NODES_PER_SHARD_MAX,
        "shard has {} candidate nodes, limit is {NODES_PER_SHARD_MAX}",
        candidates.len()
    );

    info!(
        candidates = candidates.len(),
        total = all_nodes.len(),
        "stopping replication on all replicas"
    );

    let num_tasks = candidates.len();
    let snapshot = Arc::new(Mutex::new(ReplicationSnapshot::default()));
    let cancel = CancellationToken::new();
    let (report_tx, report_rx) = mpsc::channel::<TaskReport<FenceError>>(num_tasks);

    let mut must_wait_for_count = 0;
    for node in candidates {
        let must_wait_for = request.wait_for_node.as_ref() == Some(&node.key);
        if must_wait_for {
            must_wait_for_count += 1;
        }

        let client = Arc::clone(&client);
        let snapshot = Arc::clone(&snapshot);
        let cancel = cancel.clone();
        let report_tx = report_tx.clone();
        let stop_timeout = request.stop_timeout;
        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = cancel.cancelled() => Err(FenceError::Cancelled {
                    operation: "stop replication",
                }),
                result = timeout(stop_timeout, fill_status(&*client, &snapshot, &node)) => {
                    match result {
                        Ok(outcome) => outcome,
                        Err(_elapsed) => Err(FenceError::Cancelled {
                            operation: "stop replication",
                        }),
                    }
                }
            };
            // The channel is sized to the task count, so reporting after an
            // early exit never blocks.
            let _ = report_tx
                .send(TaskReport {
                    error: outcome.err(),
                    must_wait_for,
                })
                .await;
        });
    }
    drop(report_tx);

    // We expect the dead primary among the candidates, so n - 1 answers are
    // enough unless the caller insists on all of them. Errors never trigger
    // a fast-fail; the durability check below is the arbiter.
    let required_successes = if request.wait_for_all_nodes {
        num_tasks
    } else {
        num_tasks - 1
    };
    let group = TaskGroup::new(
        num_tasks,
        required_successes,
        all_nodes.len(),
        must_wait_for_count,
    );
    let recorder = group.wait(&cancel, report_rx).await;

    let result = {
        let snap = snapshot.lock().await;
        debug_assert!(
            snap.status_map
                .keys()
                .all(|key| !snap.primary_status_map.contains_key(key)),
            "a node answered as both replica and primary"
        );
        snap.clone()
    };

    if recorder.error_count() <= TRIVIAL_SAFE_ERRORS_MAX {
        return Ok(result);
    }

    // Too many nodes unreached: only the durability policy can prove that
    // none of them will accept another write.
    if have_revoked(durability, &result.reachable_nodes, &all_nodes) {
        info!(
            errors = recorder.error_count(),
            reachable = result.reachable_nodes.len(),
            "fencing proven despite unreached nodes"
        );
        return Ok(result);
    }

    warn!(
        errors = recorder.error_count(),
        reachable = result.reachable_nodes.len(),
        total = all_nodes.len(),
        "could not reach sufficient nodes to guarantee safety"
    );
    match recorder.into_first_error() {
        Some(first) => Err(FenceError::NotEnoughNodes {
            first: Box::new(first),
        }),
        None => unreachable!("error count exceeded the trivial-safe margin"),
    }
}

/// Stops replication on one node, or demotes it if it answers that it is
/// not a replica, recording the outcome in the shared snapshot.
async fn fill_status(
    client: &dyn NodeClient,
    snapshot: &Mutex<ReplicationSnapshot>,
    node: &Node,
) -> Result<(), FenceError> {
    debug!(node = %node.key, "getting replication position");

    match client
        .stop_replication_and_get_status(&node.key, StopReplicationMode::IoThreadOnly)
        .await
    {
        Ok(stop_status) => {
            // Prefer the after-stop backup flag; fall back to before.
            let backup_running = stop_status
                .after
                .as_ref()
                .or(stop_status.before.as_ref())
                .is_some_and(|status| status.backup_running);

            let mut snap = snapshot.lock().await;
            snap.backup_state.insert(node.key.clone(), backup_running);
            snap.status_map.insert(node.key.clone(), stop_status);
            snap.reachable_nodes.push(node.clone());
            Ok(())
        }
        Err(error) if error.is_not_replica() => {
            // The node already acts as primary, likely a prior partial
            // failover. Demote it to read-only instead.
            warn!(node = %node.key, "node is not a replica, demoting");
            match client.demote_primary(&node.key).await {
                Ok(primary_status) => {
                    let mut snap = snapshot.lock().await;
                    snap.primary_status_map
                        .insert(node.key.clone(), primary_status);
                    snap.reachable_nodes.push(node.clone());
                    Ok(())
                }
                Err(demote_error) => {
                    warn!(
                        node = %node.key,
                        error = %demote_error,
                        "node thinks it's primary but demotion failed"
                    );
                    Err(FenceError::DemoteFailed {
                        node: node.key.clone(),
                        source: demote_error,
                    })
                }
            }
        }
        Err(error) => {
            warn!(node = %node.key, error = %error, "failed to get replication status");
            Err(FenceError::Client {
                node: node.key.clone(),
                source: error,
            })
        }
    }
}
