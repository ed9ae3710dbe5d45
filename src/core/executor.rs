//! Executor contract implemented once per job kind.

use async_trait::async_trait;

use super::{AppResult, Job, JobKind, JobPayload, SchedulerError};

/// Capability that carries out one kind of job.
///
/// The retry policy may call [`execute`](JobExecutor::execute) more than once
/// for the same job, so implementations must be idempotent: allocating a
/// namespace that already exists succeeds, removing one that is gone succeeds.
/// When an executor performs several sub-steps and one fails, it reports
/// failure for the whole job and leaves the earlier steps in a state that a
/// retry can build on. The scheduler performs no compensation.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use provision_scheduler::core::{AppResult, Job, JobExecutor, JobKind};
///
/// struct Noop;
///
/// #[async_trait]
/// impl JobExecutor for Noop {
///     fn kind(&self) -> JobKind {
///         JobKind::AllocateGroupResource
///     }
///
///     async fn execute(&self, _job: &Job) -> AppResult<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor: Send + Sync + 'static {
    /// The kind this executor is registered under.
    fn kind(&self) -> JobKind;

    /// Check the payload carries what this kind needs.
    ///
    /// Called synchronously at submission; a failure is returned to the
    /// producer and the job is never enqueued.
    ///
    /// # Errors
    ///
    /// `SchedulerError::InvalidJob` describing the missing or malformed field.
    fn validate(&self, _payload: &JobPayload) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// Run one attempt of the job.
    ///
    /// The job is a read-only view; the scheduler owns its state.
    async fn execute(&self, job: &Job) -> AppResult<()>;
}
