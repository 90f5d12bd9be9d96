//! Vigil Sync - Bounded task-group concurrency primitive.
//!
//! This crate provides the "fan out, wait for enough, but definitely wait
//! for these specific ones" primitive used by fencing passes, plus the
//! ordered error recorders tasks report through. It has no knowledge of
//! replication concepts and is reusable by any fan-out workload.
//!
//! # Design
//!
//! - **Counting completion**: the compound exit condition (success threshold
//!   met AND every flagged task reported) is checked on every completion
//! - **Cancellation, not draining**: an early exit cancels a shared token so
//!   in-flight tasks can abandon work; it never blocks on stragglers
//! - **No unsafe code**: Safety > Performance

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod recorder;
mod task_group;

pub use recorder::{ErrorRecorder, FirstErrorRecorder};
pub use task_group::{TaskGroup, TaskReport};
