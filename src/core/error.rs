//! Error types for scheduler operations.

use std::time::Duration;

use thiserror::Error;

use super::job::{JobKind, JobState};

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Submission was malformed for its kind; never enqueued.
    #[error("invalid job: {0}")]
    InvalidJob(String),
    /// No executor is registered for the kind.
    #[error("no executor registered for kind `{0}`")]
    UnknownKind(JobKind),
    /// Submission attempted after shutdown began.
    #[error("queue closed")]
    QueueClosed,
    /// Queue already holds the maximum number of pending jobs.
    #[error("queue full: {0} pending jobs")]
    QueueFull(usize),
    /// An executor reported an error for one attempt.
    #[error("execution failed: {0}")]
    ExecutionFailure(String),
    /// An executor exceeded its allotted time for one attempt.
    #[error("execution timed out after {0:?}")]
    ExecutionTimeout(Duration),
    /// A second executor was registered for the same kind.
    #[error("executor already registered for kind `{0}`")]
    DuplicateRegistration(JobKind),
    /// A job was asked to move between states the lifecycle does not allow.
    #[error("invalid job transition: {from} -> {to}")]
    InvalidTransition {
        /// State the job was in.
        from: JobState,
        /// State that was requested.
        to: JobState,
    },
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Scheduler-level fault that stops the dispatch loop.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SchedulerError {
    /// Whether this error counts as a failed attempt that may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ExecutionFailure(_) | Self::ExecutionTimeout(_))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
