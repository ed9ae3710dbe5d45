//! Job scheduler: submission, dispatch loop, worker pool and shutdown.
//!
//! One dispatch loop decides what runs next; execution happens on a bounded
//! pool of tokio tasks. The loop first waits for a free worker slot, then for
//! a pending job, and checks the cancellation token at both suspension points.
//!
//! Per attempt a worker:
//!
//! 1. resolves the executor (an unknown kind fails the job immediately),
//! 2. marks the job `Running` and runs `execute` under the job timeout,
//! 3. marks it `Succeeded`, or requeues it after `backoff * attempts`, or
//!    marks it `Failed` once `max_attempts` is reached or shutdown has begun.
//!
//! Terminal jobs are sent to the outcome channel and the audit log, then
//! dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::audit::{AuditAction, AuditEvent, AuditLog};
use super::queue::JobQueue;
use super::stats::{SchedulerCounters, SchedulerStats};
use super::{ExecutorRegistry, Job, JobId, JobRequest, JobState, SchedulerError};
use crate::config::SchedulerConfig;

/// State shared between the scheduler handle, the dispatch loop and workers.
struct Shared {
    config: SchedulerConfig,
    registry: Arc<ExecutorRegistry>,
    queue: JobQueue,
    counters: SchedulerCounters,
    outcomes: mpsc::Sender<Job>,
    audit: Option<AuditLog>,
    /// Snapshot of every job whose attempt is executing, for reporting jobs
    /// whose worker is aborted at shutdown.
    in_flight: Mutex<HashMap<JobId, Job>>,
}

impl Shared {
    fn audit(&self, job: &Job, action: AuditAction, detail: Option<String>) {
        if let Some(audit) = &self.audit {
            audit.record(AuditEvent::for_job(job, action, detail));
        }
    }

    /// Report a job that reached a terminal state and let it go.
    fn finish(&self, job: Job) {
        match job.state {
            JobState::Succeeded => {
                self.counters.succeeded_jobs.fetch_add(1, Ordering::Relaxed);
                info!(job_id = %job.id, kind = %job.kind, attempts = job.attempts, "job succeeded");
                self.audit(&job, AuditAction::Succeeded, None);
            }
            JobState::Failed => {
                self.counters.failed_jobs.fetch_add(1, Ordering::Relaxed);
                warn!(
                    job_id = %job.id,
                    kind = %job.kind,
                    attempts = job.attempts,
                    error = job.last_error.as_deref().unwrap_or(""),
                    "job failed permanently"
                );
                self.audit(&job, AuditAction::Failed, job.last_error.clone());
            }
            state => {
                error!(job_id = %job.id, state = %state, "non-terminal job reported as finished");
                return;
            }
        }

        if let Err(e) = self.outcomes.try_send(job) {
            debug!(error = %e, "outcome not delivered");
        }
    }

    fn abandon(&self, job: &Job) {
        warn!(job_id = %job.id, kind = %job.kind, attempts = job.attempts, "job abandoned at shutdown");
        self.audit(job, AuditAction::Abandoned, None);
    }

    /// Fail and report jobs whose attempt was still executing when their
    /// worker was aborted.
    fn fail_stranded(&self) {
        let stranded: Vec<Job> = self.in_flight.lock().drain().map(|(_, job)| job).collect();
        for mut job in stranded {
            if let Err(e) = job.fail("aborted at shutdown before the attempt finished") {
                error!(job_id = %job.id, error = %e, "could not mark aborted job failed");
                continue;
            }
            self.finish(job);
        }
    }
}

/// Decrements the running counter however the worker exits.
struct RunningGuard<'a>(&'a SchedulerCounters);

impl<'a> RunningGuard<'a> {
    fn enter(counters: &'a SchedulerCounters) -> Self {
        counters.running_jobs.fetch_add(1, Ordering::Relaxed);
        Self(counters)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running_jobs.fetch_sub(1, Ordering::Relaxed);
    }
}

/// In-process job scheduler.
///
/// Construct once at startup, share by `Arc` with producers, and drive with
/// [`start`](Self::start).
pub struct Scheduler {
    shared: Arc<Shared>,
    outcome_rx: Mutex<Option<mpsc::Receiver<Job>>>,
    started: AtomicBool,
}

impl Scheduler {
    /// Create a scheduler over a fully populated registry.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(
        config: SchedulerConfig,
        registry: ExecutorRegistry,
        audit: Option<AuditLog>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        if registry.is_empty() {
            warn!("scheduler created with no executors; every submission will be rejected");
        }

        let (outcome_tx, outcome_rx) = mpsc::channel(config.outcome_buffer);
        let queue = JobQueue::new(config.max_queue_depth);

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            max_attempts = config.max_attempts,
            kinds = ?registry.kinds(),
            "scheduler initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                registry: Arc::new(registry),
                queue,
                counters: SchedulerCounters::default(),
                outcomes: outcome_tx,
                audit,
                in_flight: Mutex::new(HashMap::new()),
            }),
            outcome_rx: Mutex::new(Some(outcome_rx)),
            started: AtomicBool::new(false),
        })
    }

    /// Validate and enqueue a job. Returns once the job is queued; execution
    /// happens later.
    ///
    /// # Errors
    ///
    /// - `QueueClosed` once shutdown has begun
    /// - `UnknownKind` if no executor handles the kind
    /// - `InvalidJob` if the executor rejects the payload
    /// - `QueueFull` if `max_queue_depth` jobs are already pending
    pub fn submit(&self, request: JobRequest) -> Result<JobId, SchedulerError> {
        let kind = request.kind;
        let result = self.admit(request);
        if let Err(e) = &result {
            self.shared.counters.rejected_jobs.fetch_add(1, Ordering::Relaxed);
            warn!(kind = %kind, error = %e, "submission rejected");
        }
        result
    }

    fn admit(&self, request: JobRequest) -> Result<JobId, SchedulerError> {
        if self.shared.queue.is_closed() {
            return Err(SchedulerError::QueueClosed);
        }
        let executor = self.shared.registry.resolve(request.kind)?;
        executor.validate(&request.payload)?;

        let kind = request.kind;
        let job = Job::submit(request);
        let job_id = job.id;
        // Recorded under the queue lock, so it precedes any event of the
        // worker that later pops the job.
        self.shared
            .queue
            .push_with(job, |job| self.shared.audit(job, AuditAction::Submitted, None))?;

        self.shared.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
        debug!(job_id = %job_id, kind = %kind, "job submitted");
        Ok(job_id)
    }

    /// Number of jobs waiting to be picked up.
    #[must_use]
    pub fn queue_size(&self) -> usize {
        self.shared.queue.len()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.shared
            .counters
            .snapshot(self.shared.config.worker_count, self.shared.queue.len())
    }

    /// Take the receiver of terminal jobs. Only the first call gets it.
    pub fn take_outcomes(&self) -> Option<mpsc::Receiver<Job>> {
        self.outcome_rx.lock().take()
    }

    /// Registry the scheduler dispatches through.
    #[must_use]
    pub fn registry(&self) -> &ExecutorRegistry {
        &self.shared.registry
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.queue.is_closed()
    }

    /// Run the dispatch loop until `token` is cancelled.
    ///
    /// After cancellation no further job is dequeued and running jobs get up
    /// to `shutdown_grace` to reach a terminal state; a worker still busy
    /// after that is aborted and its job reported `Failed`. Jobs still pending
    /// are abandoned.
    ///
    /// # Errors
    ///
    /// `Internal` if the scheduler was already started or the worker pool
    /// became unusable.
    pub async fn start(&self, token: CancellationToken) -> Result<(), SchedulerError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::Internal("scheduler already started".into()));
        }

        let shutdown = token.child_token();
        let slots = Arc::new(Semaphore::new(self.shared.config.worker_count));
        let mut workers = JoinSet::new();

        info!(
            worker_count = self.shared.config.worker_count,
            queued = self.shared.queue.len(),
            "dispatch loop started"
        );

        let outcome = loop {
            while let Some(joined) = workers.try_join_next() {
                reap(joined);
            }

            let permit = tokio::select! {
                biased;
                () = shutdown.cancelled() => break Ok(()),
                permit = Arc::clone(&slots).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => break Err(SchedulerError::Internal(format!("worker pool unavailable: {e}"))),
                },
            };

            let job = tokio::select! {
                biased;
                () = shutdown.cancelled() => break Ok(()),
                job = self.shared.queue.pop() => job,
            };

            debug!(job_id = %job.id, kind = %job.kind, attempt = job.attempts + 1, "dispatching job");
            workers.spawn(run_job(
                Arc::clone(&self.shared),
                job,
                permit,
                shutdown.clone(),
            ));
        };

        match &outcome {
            Ok(()) => info!("shutdown requested, draining workers"),
            Err(e) => error!(error = %e, "dispatch loop stopped on internal fault"),
        }

        self.shared.queue.close();
        shutdown.cancel();
        self.drain_workers(&mut workers).await;

        let abandoned = self.shared.queue.drain();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "pending jobs abandoned at shutdown");
        }
        for job in &abandoned {
            self.shared.abandon(job);
        }

        info!(stats = ?self.stats(), "scheduler stopped");
        outcome
    }

    async fn drain_workers(&self, workers: &mut JoinSet<()>) {
        let grace = self.shared.config.shutdown_grace();
        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = workers.join_next().await {
                reap(joined);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = workers.len(),
                grace_ms = self.shared.config.shutdown_grace_ms,
                "workers did not finish within grace period, aborting"
            );
            workers.abort_all();
            while let Some(joined) = workers.join_next().await {
                reap(joined);
            }
            self.shared.fail_stranded();
        }
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            error!(error = %e, "worker panicked; its job is lost");
        } else {
            warn!(error = %e, "worker aborted");
        }
    }
}

/// Run one attempt of `job` on a worker slot.
async fn run_job(
    shared: Arc<Shared>,
    mut job: Job,
    permit: OwnedSemaphorePermit,
    shutdown: CancellationToken,
) {
    let executor = match shared.registry.resolve(job.kind) {
        Ok(executor) => executor,
        Err(e) => {
            error!(job_id = %job.id, kind = %job.kind, "no executor at dispatch; failing job without retry");
            if let Err(te) = job.fail(e.to_string()) {
                error!(job_id = %job.id, error = %te, "could not mark job failed");
                return;
            }
            shared.finish(job);
            return;
        }
    };

    if let Err(e) = job.start_attempt() {
        error!(job_id = %job.id, error = %e, "dequeued job was not pending");
        return;
    }
    shared.audit(&job, AuditAction::Started, None);
    shared.in_flight.lock().insert(job.id, job.clone());

    let timeout = shared.config.job_timeout();
    let attempt = {
        let _running = RunningGuard::enter(&shared.counters);
        debug!(job_id = %job.id, kind = %job.kind, attempt = job.attempts, "executing job");
        match tokio::time::timeout(timeout, executor.execute(&job)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SchedulerError::ExecutionFailure(format!("{e:#}"))),
            Err(_) => Err(SchedulerError::ExecutionTimeout(timeout)),
        }
    };
    shared.in_flight.lock().remove(&job.id);

    match attempt {
        Ok(()) => {
            if let Err(e) = job.succeed() {
                error!(job_id = %job.id, error = %e, "could not mark job succeeded");
                return;
            }
            drop(permit);
            shared.finish(job);
        }
        Err(e)
            if e.is_retryable()
                && job.attempts < shared.config.max_attempts
                && !shutdown.is_cancelled() =>
        {
            drop(permit);
            let delay = shared.config.retry_delay(job.attempts);
            warn!(
                job_id = %job.id,
                kind = %job.kind,
                attempt = job.attempts,
                max_attempts = shared.config.max_attempts,
                retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %e,
                "job attempt failed, will retry"
            );
            if let Err(te) = job.retry() {
                error!(job_id = %job.id, error = %te, "could not return job to pending");
                return;
            }
            shared.counters.retried_attempts.fetch_add(1, Ordering::Relaxed);
            shared.audit(&job, AuditAction::Retried, Some(e.to_string()));

            if !delay.is_zero() {
                tokio::select! {
                    () = shutdown.cancelled() => {}
                    () = tokio::time::sleep(delay) => {}
                }
            }
            if let Err(job) = shared.queue.requeue(job) {
                shared.abandon(&job);
            }
        }
        Err(e) => {
            if let Err(te) = job.fail(e.to_string()) {
                error!(job_id = %job.id, error = %te, "could not mark job failed");
                return;
            }
            drop(permit);
            shared.finish(job);
        }
    }
}
