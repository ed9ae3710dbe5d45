//! Scheduler statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of scheduler activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Size of the worker pool.
    pub worker_count: usize,
    /// Jobs waiting in the queue.
    pub queued_jobs: usize,
    /// Jobs currently held by a worker.
    pub running_jobs: u64,
    /// Jobs accepted by `submit`.
    pub submitted_jobs: u64,
    /// Submissions refused (invalid, unknown kind, closed, full).
    pub rejected_jobs: u64,
    /// Failed attempts that were put back in the queue.
    pub retried_attempts: u64,
    /// Jobs that reached `Succeeded`.
    pub succeeded_jobs: u64,
    /// Jobs that reached `Failed`.
    pub failed_jobs: u64,
}

/// Lock-free counters behind [`SchedulerStats`].
#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
    pub running_jobs: AtomicU64,
    pub submitted_jobs: AtomicU64,
    pub rejected_jobs: AtomicU64,
    pub retried_attempts: AtomicU64,
    pub succeeded_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
}

impl SchedulerCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize, queued_jobs: usize) -> SchedulerStats {
        SchedulerStats {
            worker_count,
            queued_jobs,
            running_jobs: self.running_jobs.load(Ordering::Relaxed),
            submitted_jobs: self.submitted_jobs.load(Ordering::Relaxed),
            rejected_jobs: self.rejected_jobs.load(Ordering::Relaxed),
            retried_attempts: self.retried_attempts.load(Ordering::Relaxed),
            succeeded_jobs: self.succeeded_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
        }
    }
}
