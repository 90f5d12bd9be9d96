//! Vigil Core - Node identity and shared limits for the Vigil control plane.
//!
//! This crate provides the types every other Vigil crate agrees on: the
//! globally unique node key, node roles, and explicit resource limits. It
//! does NOT know anything about replication positions or fencing - those
//! live in `vigil-position` and `vigil-fence`.
//!
//! # Design Principles (`TigerStyle`)
//!
//! - **Strongly-typed identity**: a `NodeKey` is not a bare string
//! - **Explicit limits**: every fan-out and timeout has a bounded maximum
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod limits;
mod types;

pub use limits::{NODES_PER_SHARD_MAX, STOP_REPLICATION_TIMEOUT_US_DEFAULT};
pub use types::{Node, NodeKey, NodeKeyParseError, NodeRole};
