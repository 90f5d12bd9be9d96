//! Cluster durability policies and the fencing proof built on them.
//!
//! A durability policy answers two pure questions: how many synchronous
//! acknowledgements a primary needs before a write commits, and whether a
//! given replica is one of the nodes that send those acknowledgements.
//! Fencing leans on the second answer: if an unreached node could only
//! commit writes with acks from nodes whose replication this pass has
//! stopped, that node can never again accept a durable write - even though
//! we never spoke to it.
//!
//! Policies are selected by name once per cluster, stateless after
//! construction, and safe for concurrent use by many fencing passes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use vigil_core::{Node, NodeRole};

use crate::error::FenceError;

/// Pure durability decisions for one cluster.
pub trait Durability: Send + Sync {
    /// Number of semi-sync acknowledgements `primary` requires before a
    /// write is acknowledged as committed.
    fn semi_sync_ackers(&self, primary: &Node) -> u32;

    /// True if `replica` sends semi-sync acknowledgements to `primary`.
    fn is_replica_semi_sync(&self, primary: &Node, replica: &Node) -> bool;
}

/// No durability guarantee: writes commit without any acknowledgement.
///
/// Under this policy fencing is only provable by reaching every node; an
/// unreached node can always accept writes on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct DurabilityNone;

impl Durability for DurabilityNone {
    fn semi_sync_ackers(&self, _primary: &Node) -> u32 {
        0
    }

    fn is_replica_semi_sync(&self, _primary: &Node, _replica: &Node) -> bool {
        false
    }
}

/// Semi-synchronous durability: one acknowledgement, sent by nodes serving
/// a write-eligible role.
#[derive(Debug, Default, Clone, Copy)]
pub struct DurabilitySemiSync;

impl Durability for DurabilitySemiSync {
    fn semi_sync_ackers(&self, _primary: &Node) -> u32 {
        1
    }

    fn is_replica_semi_sync(&self, _primary: &Node, replica: &Node) -> bool {
        matches!(replica.role, NodeRole::Primary | NodeRole::Replica)
    }
}

/// Registry name of [`DurabilityNone`].
pub const DURABILITY_NONE: &str = "none";

/// Registry name of [`DurabilitySemiSync`].
pub const DURABILITY_SEMI_SYNC: &str = "semi_sync";

fn registry() -> &'static HashMap<&'static str, Arc<dyn Durability>> {
    static REGISTRY: OnceLock<HashMap<&'static str, Arc<dyn Durability>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut policies: HashMap<&'static str, Arc<dyn Durability>> = HashMap::new();
        policies.insert(DURABILITY_NONE, Arc::new(DurabilityNone));
        policies.insert(DURABILITY_SEMI_SYNC, Arc::new(DurabilitySemiSync));
        policies
    })
}

/// Looks up a durability policy by name.
///
/// # Errors
/// Returns an error if no policy is registered under `name`.
pub fn durability_policy(name: &str) -> Result<Arc<dyn Durability>, FenceError> {
    registry()
        .get(name)
        .cloned()
        .ok_or_else(|| FenceError::UnknownDurabilityPolicy {
            name: name.to_string(),
        })
}

/// Returns true if `candidate` could gather the acknowledgements it needs
/// from `ackers` were it to act as primary. The candidate never acks
/// itself.
#[must_use]
pub fn can_establish(durability: &dyn Durability, candidate: &Node, ackers: &[Node]) -> bool {
    let reachable_ackers = ackers
        .iter()
        .filter(|acker| acker.key != candidate.key)
        .filter(|acker| durability.is_replica_semi_sync(candidate, acker))
        .count();
    reachable_ackers >= durability.semi_sync_ackers(candidate) as usize
}

/// Returns true if the nodes reached by a fencing pass are sufficient to
/// prove that no unreached node can accept a durable write.
///
/// An unreached node's only remaining acknowledgers are the other unreached
/// nodes; if none of the unreached nodes can establish itself against that
/// set, every one of them is fenced.
#[must_use]
pub fn have_revoked(durability: &dyn Durability, reached: &[Node], all: &[Node]) -> bool {
    let unreached: Vec<Node> = all
        .iter()
        .filter(|node| !reached.iter().any(|r| r.key == node.key))
        .cloned()
        .collect();

    !unreached
        .iter()
        .any(|candidate| can_establish(durability, candidate, &unreached))
}

#[cfg(test)]
mod tests {
    use vigil_core::NodeKey;

    use super::*;

    fn node(uid: u64, role: NodeRole) -> Node {
        Node::new(NodeKey::new("zone1", uid), role)
    }

    #[test]
    fn test_registry_lookup() {
        assert!(durability_policy("none").is_ok());
        assert!(durability_policy("semi_sync").is_ok());
        assert!(matches!(
            durability_policy("two_phase"),
            Err(FenceError::UnknownDurabilityPolicy { .. })
        ));
    }

    #[test]
    fn test_none_policy_decisions() {
        let policy = DurabilityNone;
        let primary = node(1, NodeRole::Primary);
        let replica = node(2, NodeRole::Replica);

        assert_eq!(policy.semi_sync_ackers(&primary), 0);
        assert!(!policy.is_replica_semi_sync(&primary, &replica));
    }

    #[test]
    fn test_semi_sync_policy_decisions() {
        let policy = DurabilitySemiSync;
        let primary = node(1, NodeRole::Primary);

        assert_eq!(policy.semi_sync_ackers(&primary), 1);
        assert!(policy.is_replica_semi_sync(&primary, &node(2, NodeRole::Replica)));
        assert!(!policy.is_replica_semi_sync(&primary, &node(3, NodeRole::Rdonly)));
        assert!(!policy.is_replica_semi_sync(&primary, &node(4, NodeRole::Drained)));
    }

    #[test]
    fn test_none_policy_never_proves_fencing_with_unreached_nodes() {
        let all = vec![
            node(1, NodeRole::Replica),
            node(2, NodeRole::Replica),
            node(3, NodeRole::Replica),
        ];
        let reached = vec![all[0].clone(), all[1].clone()];

        assert!(!have_revoked(&DurabilityNone, &reached, &all));
        // Reaching everything is the only proof.
        assert!(have_revoked(&DurabilityNone, &all, &all));
    }

    #[test]
    fn test_semi_sync_proves_fencing_when_unreached_ackers_are_gone() {
        // The two unreached nodes are rdonly: neither can ack the other, so
        // neither can commit a write again.
        let all = vec![
            node(1, NodeRole::Replica),
            node(2, NodeRole::Rdonly),
            node(3, NodeRole::Rdonly),
        ];
        let reached = vec![all[0].clone()];

        assert!(have_revoked(&DurabilitySemiSync, &reached, &all));
    }

    #[test]
    fn test_semi_sync_cannot_prove_fencing_when_unreached_can_ack_each_other() {
        // Two unreached replicas can ack each other; either could still
        // commit writes as a primary.
        let all = vec![
            node(1, NodeRole::Replica),
            node(2, NodeRole::Replica),
            node(3, NodeRole::Replica),
        ];
        let reached = vec![all[0].clone()];

        assert!(!have_revoked(&DurabilitySemiSync, &reached, &all));
    }

    #[test]
    fn test_candidate_never_acks_itself() {
        let candidate = node(1, NodeRole::Replica);
        assert!(!can_establish(
            &DurabilitySemiSync,
            &candidate,
            &[candidate.clone()]
        ));
    }
}
