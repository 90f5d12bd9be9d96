//! Replication status as reported by a node.
//!
//! Positions travel here in wire form; decoding into the position model is
//! the resolver's job, so a malformed position fails the pass that ranks,
//! not the pass that collects.

use crate::error::FenceError;

/// State of one replication thread at the instant of capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationThreadState {
    /// The thread is not running.
    #[default]
    Stopped,
    /// The thread is running normally.
    Running,
    /// The thread stopped on an error.
    Error,
}

/// Which replication threads a stop request halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReplicationMode {
    /// Stop only the IO thread; the SQL thread keeps replaying data already
    /// received. Used during fencing so relay data still applies.
    IoThreadOnly,
    /// Stop both threads.
    IoAndSqlThread,
}

/// A node's replication state captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplicationStatus {
    /// IO thread state.
    pub io_state: ReplicationThreadState,
    /// SQL thread state.
    pub sql_state: ReplicationThreadState,
    /// Source position: what has been received, in wire form.
    pub position: String,
    /// Relay position: received but not yet applied, in wire form.
    pub relay_log_position: String,
    /// Source-side position equivalent to the relay position, for nodes
    /// whose relay coordinates are not directly comparable.
    pub relay_log_source_binlog_equivalent_position: String,
    /// True if the node is currently taking a backup. A node mid-backup may
    /// be slow to answer, not unsafe.
    pub backup_running: bool,
}

/// Replication status captured before and after a stop request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StopReplicationStatus {
    /// Status before the stop was issued.
    pub before: Option<ReplicationStatus>,
    /// Status after the stop took effect.
    pub after: Option<ReplicationStatus>,
}

impl StopReplicationStatus {
    /// Returns true if either replication thread was running before the
    /// stop was issued.
    ///
    /// # Errors
    /// Returns an error if the before-state was not captured.
    pub fn replica_was_running(&self) -> Result<bool, FenceError> {
        let before = self.before.as_ref().ok_or(FenceError::MissingBeforeState)?;
        Ok(before.io_state == ReplicationThreadState::Running
            || before.sql_state == ReplicationThreadState::Running)
    }
}

/// Executed position reported by a node acting as primary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrimaryStatus {
    /// The primary-side executed position, in wire form.
    pub position: String,
}
