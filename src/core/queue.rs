//! FIFO job queue shared by producers and the dispatch loop.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use super::{Job, SchedulerError};

struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Thread-safe FIFO of pending jobs.
///
/// Producers push under a short `parking_lot` critical section; the single
/// consumer parks on a `Notify` instead of polling. Fresh submissions are
/// rejected once `capacity` jobs are pending. Retried jobs bypass the limit so
/// a job that already consumed an attempt is never dropped for lack of room.
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Notify,
    capacity: usize,
}

impl JobQueue {
    /// Create an open queue holding at most `capacity` fresh submissions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::with_capacity(capacity.min(1024)),
                closed: false,
            }),
            available: Notify::new(),
            capacity,
        }
    }

    /// Append a newly submitted job.
    ///
    /// # Errors
    ///
    /// `QueueClosed` after [`close`](Self::close), `QueueFull` at capacity.
    pub fn push(&self, job: Job) -> Result<(), SchedulerError> {
        self.push_with(job, |_| {})
    }

    /// Like [`push`](Self::push), running `on_accept` under the queue lock
    /// once the job is admitted and before any consumer can see it.
    ///
    /// # Errors
    ///
    /// Same as [`push`](Self::push); `on_accept` is not called.
    pub fn push_with<F>(&self, job: Job, on_accept: F) -> Result<(), SchedulerError>
    where
        F: FnOnce(&Job),
    {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(SchedulerError::QueueClosed);
            }
            if state.jobs.len() >= self.capacity {
                return Err(SchedulerError::QueueFull(state.jobs.len()));
            }
            on_accept(&job);
            state.jobs.push_back(job);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Put a retried job at the back of the queue, ignoring capacity.
    ///
    /// # Errors
    ///
    /// Hands the job back if the queue is closed.
    pub fn requeue(&self, job: Job) -> Result<(), Box<Job>> {
        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(Box::new(job));
            }
            state.jobs.push_back(job);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Take the oldest job without waiting.
    pub fn try_pop(&self) -> Option<Job> {
        self.state.lock().jobs.pop_front()
    }

    /// Wait until a job is available and take it.
    ///
    /// Cancel-safe: dropping the future never loses a job.
    pub async fn pop(&self) -> Job {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(job) = self.try_pop() {
                return job;
            }
            notified.await;
        }
    }

    /// Stop accepting jobs. Pending jobs stay where they are.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    /// Remove and return every pending job, oldest first.
    pub fn drain(&self) -> Vec<Job> {
        self.state.lock().jobs.drain(..).collect()
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Pending job count, taken under the lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    /// Whether no job is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GroupMembership, JobKind, JobPayload, JobRequest};
    use std::sync::Arc;
    use std::time::Duration;

    fn make_job(uid: u32) -> Job {
        Job::submit(JobRequest::new(
            JobKind::AllocateGroupResource,
            JobPayload::GroupMembership(GroupMembership {
                uid,
                gid: 1,
                user_name: format!("user{uid}"),
            }),
        ))
    }

    fn uid_of(job: &Job) -> u32 {
        job.payload.as_group_membership().unwrap().uid
    }

    #[test]
    fn test_fifo_order() {
        let q = JobQueue::new(10);
        for uid in 1..=3 {
            q.push(make_job(uid)).unwrap();
        }
        assert_eq!(q.len(), 3);
        assert_eq!(uid_of(&q.try_pop().unwrap()), 1);
        assert_eq!(uid_of(&q.try_pop().unwrap()), 2);
        assert_eq!(uid_of(&q.try_pop().unwrap()), 3);
        assert!(q.try_pop().is_none());
    }

    #[test]
    fn test_queue_full() {
        let q = JobQueue::new(2);
        q.push(make_job(1)).unwrap();
        q.push(make_job(2)).unwrap();

        let result = q.push(make_job(3));
        assert!(matches!(result, Err(SchedulerError::QueueFull(2))));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_push_with_runs_only_on_accept() {
        let q = JobQueue::new(1);
        let mut accepted = Vec::new();
        q.push_with(make_job(1), |job| accepted.push(uid_of(job))).unwrap();
        assert!(q.push_with(make_job(2), |job| accepted.push(uid_of(job))).is_err());
        q.close();
        q.try_pop().unwrap();
        assert!(q.push_with(make_job(3), |job| accepted.push(uid_of(job))).is_err());
        assert_eq!(accepted, vec![1]);
    }

    #[test]
    fn test_requeue_ignores_capacity() {
        let q = JobQueue::new(1);
        q.push(make_job(1)).unwrap();
        assert!(q.requeue(make_job(2)).is_ok());
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_closed_queue_rejects() {
        let q = JobQueue::new(10);
        q.push(make_job(1)).unwrap();
        q.close();

        assert!(q.is_closed());
        assert!(matches!(q.push(make_job(2)), Err(SchedulerError::QueueClosed)));
        let returned = q.requeue(make_job(3)).unwrap_err();
        assert_eq!(uid_of(&returned), 3);
        // Already queued work is left in place.
        assert_eq!(q.len(), 1);
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let q = Arc::new(JobQueue::new(10));
        let consumer = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.pop().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        q.push(make_job(42)).unwrap();

        let job = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("pop should wake")
            .unwrap();
        assert_eq!(uid_of(&job), 42);
    }
}
