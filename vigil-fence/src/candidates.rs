//! Resolving a snapshot into one comparable position per candidate.

use std::collections::HashMap;

use vigil_core::NodeKey;
use vigil_position::Position;
use vigil_sync::FirstErrorRecorder;

use crate::error::FenceError;
use crate::status::{PrimaryStatus, StopReplicationStatus};

/// Builds the map of candidate node to comparable replication position from
/// the status maps of one fencing pass, and reports whether the cluster is
/// set-based.
///
/// For a set-based cluster each node ranks by its *relay* position: data
/// received but not yet applied is still committed history that must not be
/// lost. For an offset-based cluster the plain replication position ranks.
/// A node that answered as a demoted primary ranks by what it has executed,
/// overwriting any relay-derived entry.
///
/// # Errors
/// Returns a fatal error if set-based and offset-based relay positions are
/// mixed across nodes, or if a node has no relay position while the
/// cluster is set-based - such a node cannot be ranked safely.
pub fn find_positions_of_all_candidates(
    status_map: &HashMap<NodeKey, StopReplicationStatus>,
    primary_status_map: &HashMap<NodeKey, PrimaryStatus>,
) -> Result<(HashMap<NodeKey, Position>, bool), FenceError> {
    // Decode the after-stop statuses.
    let mut decoded: HashMap<&NodeKey, (Position, Position)> =
        HashMap::with_capacity(status_map.len());
    for (key, stop_status) in status_map {
        let after = stop_status
            .after
            .as_ref()
            .ok_or_else(|| FenceError::MissingStatus { node: key.clone() })?;
        let position = Position::decode(&after.position)?;
        let relay = Position::decode(&after.relay_log_position)?;
        decoded.insert(key, (position, relay));
    }

    // Classify the cluster's representation from the relay positions. A
    // zero relay position carries no representation; whether it is fatal
    // depends on what the rest of the cluster uses.
    let mut set_based = false;
    let mut offset_based = false;
    let mut empty_relay = FirstErrorRecorder::new();
    for (key, (_, relay)) in &decoded {
        if relay.is_zero() {
            empty_relay.record(FenceError::EmptyRelayPosition {
                node: (*key).clone(),
            });
        } else if relay.is_set_based() {
            set_based = true;
        } else {
            offset_based = true;
        }
    }

    if set_based {
        // A node without a relay position cannot be ranked against nodes
        // that have one. In a fully offset-based cluster the deferred
        // error no longer matters and is discarded.
        if let Some(error) = empty_relay.into_error() {
            return Err(error);
        }
        if offset_based {
            return Err(FenceError::MixedPositionRepresentations);
        }
    }

    let mut position_map: HashMap<NodeKey, Position> = HashMap::with_capacity(decoded.len());
    for (key, (position, relay)) in decoded {
        let ranking = if set_based { relay } else { position };
        position_map.insert(key.clone(), ranking);
    }

    for (key, primary_status) in primary_status_map {
        let executed = Position::decode(&primary_status.position).map_err(|source| {
            FenceError::PrimaryPositionDecode {
                node: key.clone(),
                source,
            }
        })?;
        position_map.insert(key.clone(), executed);
    }

    Ok((position_map, set_based))
}

#[cfg(test)]
mod tests {
    use vigil_position::PositionOrdering;

    use super::*;
    use crate::status::ReplicationStatus;

    fn key(uid: u64) -> NodeKey {
        NodeKey::new("zone1", uid)
    }

    fn stop_status(position: &str, relay: &str) -> StopReplicationStatus {
        StopReplicationStatus {
            before: Some(ReplicationStatus::default()),
            after: Some(ReplicationStatus {
                position: position.to_string(),
                relay_log_position: relay.to_string(),
                ..ReplicationStatus::default()
            }),
        }
    }

    #[test]
    fn test_set_based_cluster_ranks_by_relay_position() {
        let status_map = HashMap::from([
            (key(1), stop_status("gtid/src1:1-4", "gtid/src1:1-5")),
            (key(2), stop_status("gtid/src1:1-8", "gtid/src1:1-9")),
        ]);

        let (positions, set_based) =
            find_positions_of_all_candidates(&status_map, &HashMap::new()).unwrap();

        assert!(set_based);
        assert_eq!(positions[&key(1)], Position::decode("gtid/src1:1-5").unwrap());
        assert_eq!(positions[&key(2)], Position::decode("gtid/src1:1-9").unwrap());
        assert_eq!(
            positions[&key(2)].compare(&positions[&key(1)]).unwrap(),
            PositionOrdering::Greater
        );
    }

    #[test]
    fn test_offset_based_cluster_ranks_by_plain_position() {
        let status_map = HashMap::from([
            (
                key(1),
                stop_status("filepos/binlog.000001:900", "filepos/relay.000007:300"),
            ),
            (
                key(2),
                stop_status("filepos/binlog.000002:40", "filepos/relay.000003:88"),
            ),
        ]);

        let (positions, set_based) =
            find_positions_of_all_candidates(&status_map, &HashMap::new()).unwrap();

        assert!(!set_based);
        assert_eq!(
            positions[&key(1)],
            Position::decode("filepos/binlog.000001:900").unwrap()
        );
        assert_eq!(
            positions[&key(2)],
            Position::decode("filepos/binlog.000002:40").unwrap()
        );
    }

    #[test]
    fn test_empty_relay_in_set_based_cluster_is_fatal() {
        let status_map = HashMap::from([
            (key(1), stop_status("gtid/src1:1-4", "gtid/src1:1-5")),
            (key(2), stop_status("gtid/src1:1-8", "gtid/src1:1-9")),
            (key(3), stop_status("gtid/src1:1-2", "gtid/src1:1-3")),
            (key(4), stop_status("filepos/binlog.000001:4", "")),
        ]);

        let result = find_positions_of_all_candidates(&status_map, &HashMap::new());
        assert!(matches!(
            result,
            Err(FenceError::EmptyRelayPosition { node }) if node == key(4)
        ));
    }

    #[test]
    fn test_empty_relay_in_offset_based_cluster_is_discarded() {
        let status_map = HashMap::from([
            (
                key(1),
                stop_status("filepos/binlog.000001:900", "filepos/relay.000007:300"),
            ),
            (key(2), stop_status("filepos/binlog.000002:40", "")),
        ]);

        let (positions, set_based) =
            find_positions_of_all_candidates(&status_map, &HashMap::new()).unwrap();

        assert!(!set_based);
        assert_eq!(positions.len(), 2);
        assert_eq!(
            positions[&key(2)],
            Position::decode("filepos/binlog.000002:40").unwrap()
        );
    }

    #[test]
    fn test_mixed_representations_are_fatal() {
        let status_map = HashMap::from([
            (key(1), stop_status("gtid/src1:1-4", "gtid/src1:1-5")),
            (
                key(2),
                stop_status("filepos/binlog.000002:40", "filepos/relay.000003:88"),
            ),
        ]);

        let result = find_positions_of_all_candidates(&status_map, &HashMap::new());
        assert!(matches!(
            result,
            Err(FenceError::MixedPositionRepresentations)
        ));
    }

    #[test]
    fn test_demoted_primary_ranks_by_executed_position() {
        let status_map = HashMap::from([
            (key(1), stop_status("gtid/src1:1-4", "gtid/src1:1-5")),
        ]);
        let primary_status_map = HashMap::from([(
            key(2),
            PrimaryStatus {
                position: "gtid/src1:1-9".to_string(),
            },
        )]);

        let (positions, set_based) =
            find_positions_of_all_candidates(&status_map, &primary_status_map).unwrap();

        assert!(set_based);
        assert_eq!(positions[&key(2)], Position::decode("gtid/src1:1-9").unwrap());
    }

    #[test]
    fn test_undecodable_primary_position_is_fatal() {
        let primary_status_map = HashMap::from([(
            key(1),
            PrimaryStatus {
                position: "garbage".to_string(),
            },
        )]);

        let result = find_positions_of_all_candidates(&HashMap::new(), &primary_status_map);
        assert!(matches!(
            result,
            Err(FenceError::PrimaryPositionDecode { node, .. }) if node == key(1)
        ));
    }

    #[test]
    fn test_missing_after_status_is_fatal() {
        let status_map = HashMap::from([(key(1), StopReplicationStatus::default())]);
        let result = find_positions_of_all_candidates(&status_map, &HashMap::new());
        assert!(matches!(
            result,
            Err(FenceError::MissingStatus { node }) if node == key(1)
        ));
    }
}
