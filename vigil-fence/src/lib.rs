//! Vigil Fence - Write-fencing decisions for unplanned primary failover.
//!
//! When a primary dies unexpectedly, the hard problem is not choosing which
//! replica to promote - it is proving, under partial network visibility,
//! that the old primary can no longer accept writes before a new one starts
//! accepting them. This crate stops replication everywhere it can reach,
//! demotes nodes that wrongly believe they are primary, and consults a
//! pluggable durability policy to decide whether the set of nodes reached
//! is sufficient to prove write-safety on the nodes it could not reach.
//!
//! # Design
//!
//! - **Unsafe-on-doubt**: a false "safe" verdict risks split-brain; a false
//!   "unsafe" verdict only costs availability. Every arbitration path here
//!   biases toward unsafe.
//! - **Collaborators behind traits**: the per-node RPC surface and the
//!   topology store are consumed through [`NodeClient`] and [`Topology`];
//!   this crate owns no transport.
//! - **One pass, one snapshot**: each fencing attempt allocates its own
//!   [`ReplicationSnapshot`]; nothing is shared across passes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod candidates;
mod client;
mod durability;
mod error;
mod snapshot;
mod source;
mod status;
mod topology;
mod waiter;

pub use candidates::find_positions_of_all_candidates;
pub use client::{ClientError, NodeClient};
pub use durability::{
    can_establish, durability_policy, have_revoked, Durability, DurabilityNone, DurabilitySemiSync,
    DURABILITY_NONE, DURABILITY_SEMI_SYNC,
};
pub use error::FenceError;
pub use snapshot::{
    stop_replication_and_build_status_maps, ReplicationSnapshot, StopReplicationRequest,
};
pub use source::set_replication_source;
pub use status::{
    PrimaryStatus, ReplicationStatus, ReplicationThreadState, StopReplicationMode,
    StopReplicationStatus,
};
pub use topology::{Topology, TopologyError};
pub use waiter::wait_for_relay_logs_to_apply;
