//! Vigil Position - Replication position model.
//!
//! Replication positions come in two incompatible representations: set-based
//! (a set of source/interval pairs naming every executed transaction) and
//! offset-based (a log file name plus byte offset). This crate models both
//! as an explicit tagged union, decodes the `flavor/value` wire form, and
//! compares positions within a representation - never across.
//!
//! # Design
//!
//! - **Explicit tags**: comparison and decoding pattern-match on the tag and
//!   reject cross-tag operations instead of coercing
//! - **Normalized sets**: intervals are merged and sorted on parse, so equal
//!   sets are structurally equal
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod file_pos;
mod gtid;
mod position;

pub use error::PositionError;
pub use file_pos::FilePos;
pub use gtid::{GtidSet, Interval, SourceId};
pub use position::{Position, PositionOrdering};
