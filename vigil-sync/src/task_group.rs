//! Bounded task group with early exit and must-wait-for flags.
//!
//! Runs `N` independently spawned tasks, each reporting exactly one outcome
//! on a shared channel. [`TaskGroup::wait`] converges as soon as enough
//! successes are in, while never leaving a flagged task behind.
//!
//! # Design
//!
//! The group does not spawn tasks itself; callers spawn with their runtime
//! of choice and hand each task the channel sender. Size the channel to
//! `num_tasks` so a report sent after an early exit never blocks the
//! reporting task.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::recorder::ErrorRecorder;

/// The single outcome a task sends when it finishes.
#[derive(Debug)]
pub struct TaskReport<E> {
    /// The classified error, or `None` on success.
    pub error: Option<E>,
    /// True if [`TaskGroup::wait`] must not return before this report.
    pub must_wait_for: bool,
}

impl<E> TaskReport<E> {
    /// A successful outcome.
    #[must_use]
    pub const fn success(must_wait_for: bool) -> Self {
        Self {
            error: None,
            must_wait_for,
        }
    }

    /// A failed outcome carrying its classified error.
    #[must_use]
    pub const fn failure(error: E, must_wait_for: bool) -> Self {
        Self {
            error: Some(error),
            must_wait_for,
        }
    }
}

/// Counting completion primitive over a fan-out of tasks.
///
/// `wait` returns to the caller as soon as `required_successes` successes
/// are observed and every flagged task has reported; it also returns early
/// once the observed errors exceed `allowed_errors`, unless flagged tasks
/// remain outstanding. On any early return the shared cancellation token is
/// cancelled so in-flight tasks can abandon work promptly; `wait` never
/// blocks on stragglers finishing.
#[derive(Debug, Clone, Copy)]
pub struct TaskGroup {
    /// Total number of tasks reporting into the group.
    pub num_tasks: usize,
    /// Successes needed before `wait` may return.
    pub required_successes: usize,
    /// Errors tolerated before `wait` fast-fails.
    pub allowed_errors: usize,
    /// Number of tasks flagged must-wait-for.
    pub must_wait_for_count: usize,
}

impl TaskGroup {
    /// Creates a task group.
    ///
    /// # Panics
    /// Panics if there are no tasks, or if a threshold exceeds the task
    /// count.
    #[must_use]
    pub fn new(
        num_tasks: usize,
        required_successes: usize,
        allowed_errors: usize,
        must_wait_for_count: usize,
    ) -> Self {
        assert!(num_tasks >= 1, "task group needs at least 1 task");
        assert!(
            required_successes <= num_tasks,
            "required successes {required_successes} exceeds task count {num_tasks}"
        );
        assert!(
            must_wait_for_count <= num_tasks,
            "must-wait-for count {must_wait_for_count} exceeds task count {num_tasks}"
        );

        Self {
            num_tasks,
            required_successes,
            allowed_errors,
            must_wait_for_count,
        }
    }

    /// Waits for the group to converge, returning every error seen.
    ///
    /// Outcomes arrive in arbitrary order; the only orderings recognized are
    /// "enough successes occurred" and "every flagged task has reported".
    /// If the channel closes before the counting conditions are met (a task
    /// dropped its sender without reporting), whatever was recorded so far
    /// is returned.
    pub async fn wait<E>(
        &self,
        cancel: &CancellationToken,
        mut reports: mpsc::Receiver<TaskReport<E>>,
    ) -> ErrorRecorder<E> {
        let mut recorder = ErrorRecorder::new();
        let mut responses: usize = 0;
        let mut successes: usize = 0;
        let mut errors: usize = 0;
        let mut flagged_reported: usize = 0;

        while let Some(report) = reports.recv().await {
            responses += 1;
            if report.must_wait_for {
                flagged_reported += 1;
            }
            match report.error {
                Some(error) => {
                    errors += 1;
                    recorder.record(error);
                }
                None => successes += 1,
            }

            // The thresholds are only consulted once every flagged task has
            // reported; success or failure, a flagged task is never left
            // outstanding.
            if flagged_reported == self.must_wait_for_count
                && (errors > self.allowed_errors || successes >= self.required_successes)
            {
                cancel.cancel();
                return recorder;
            }

            // All responses are in.
            if responses == self.num_tasks {
                cancel.cancel();
                return recorder;
            }
        }

        debug!(
            responses,
            num_tasks = self.num_tasks,
            "report channel closed before the group converged"
        );
        recorder
    }
}
