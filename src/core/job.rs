//! Job entity and its lifecycle transitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SchedulerError;

/// Unique job identifier, assigned at submission.
pub type JobId = Uuid;

/// Discriminator selecting which executor handles a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobKind {
    /// Create per-project namespaces (and storage) for a new group member.
    AllocateGroupResource,
    /// Remove per-project namespaces of a departing group member.
    RemoveGroupResource,
}

impl JobKind {
    /// Every kind the scheduler knows about.
    pub const ALL: [Self; 2] = [Self::AllocateGroupResource, Self::RemoveGroupResource];

    /// Stable name used in logs and audit records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllocateGroupResource => "allocate_group_resource",
            Self::RemoveGroupResource => "remove_group_resource",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SchedulerError::InvalidJob(format!("unrecognized job kind `{s}`")))
    }
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Waiting in the queue.
    Pending,
    /// Picked up by a worker.
    Running,
    /// Finished successfully (terminal).
    Succeeded,
    /// Exhausted its attempts or could not be dispatched (terminal).
    Failed,
}

impl JobState {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Membership change a provisioning job acts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// User identifier.
    pub uid: u32,
    /// Group identifier.
    pub gid: u32,
    /// User name, used to derive namespace names.
    pub user_name: String,
}

/// Kind-specific data needed for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// A user joined or left a group.
    GroupMembership(GroupMembership),
}

impl JobPayload {
    /// Borrow the membership payload.
    #[must_use]
    pub const fn as_group_membership(&self) -> Option<&GroupMembership> {
        match self {
            Self::GroupMembership(membership) => Some(membership),
        }
    }
}

/// What a producer hands to the scheduler. Ownership moves on submit, so the
/// producer cannot touch the job afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    /// Executor selector.
    pub kind: JobKind,
    /// Data for the executor.
    pub payload: JobPayload,
}

impl JobRequest {
    /// Build a request.
    #[must_use]
    pub const fn new(kind: JobKind, payload: JobPayload) -> Self {
        Self { kind, payload }
    }
}

/// A submitted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Assigned at submission, immutable.
    pub id: JobId,
    /// Executor selector.
    pub kind: JobKind,
    /// Data for the executor.
    pub payload: JobPayload,
    /// Current lifecycle state.
    pub state: JobState,
    /// Attempts started so far.
    pub attempts: u32,
    /// When the scheduler accepted the job.
    pub submitted_at: DateTime<Utc>,
    /// Start of the most recent attempt.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure description, set only once the job is `Failed`.
    pub last_error: Option<String>,
}

impl Job {
    /// Accept a request as a new pending job.
    #[must_use]
    pub fn submit(request: JobRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: request.kind,
            payload: request.payload,
            state: JobState::Pending,
            attempts: 0,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            last_error: None,
        }
    }

    /// Pending -> Running, counting a new attempt.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the job is pending.
    pub fn start_attempt(&mut self) -> Result<(), SchedulerError> {
        self.transition(JobState::Pending, JobState::Running)?;
        self.attempts += 1;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Running -> Succeeded.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the job is running.
    pub fn succeed(&mut self) -> Result<(), SchedulerError> {
        self.transition(JobState::Running, JobState::Succeeded)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Running -> Pending after a failed attempt. The attempt's error is not
    /// kept on the job; callers log or audit it.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless the job is running.
    pub fn retry(&mut self) -> Result<(), SchedulerError> {
        self.transition(JobState::Running, JobState::Pending)
    }

    /// Pending or Running -> Failed. Pending is allowed so a job that cannot
    /// be dispatched at all fails without ever running.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if the job is already terminal.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), SchedulerError> {
        if self.state.is_terminal() {
            return Err(SchedulerError::InvalidTransition {
                from: self.state,
                to: JobState::Failed,
            });
        }
        self.state = JobState::Failed;
        self.last_error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, from: JobState, to: JobState) -> Result<(), SchedulerError> {
        if self.state != from {
            return Err(SchedulerError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
