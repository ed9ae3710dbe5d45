//! Submission and observability surface used by the administrative layer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    GroupMembership, JobId, JobKind, JobPayload, JobRequest, Scheduler, SchedulerError,
    SchedulerStats,
};

/// User id of the built-in administrator.
pub const RESERVED_UID: u32 = 1;
/// Group id of the built-in super group.
pub const RESERVED_GID: u32 = 1;

/// Errors surfaced to the administrative caller.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The admin user's membership in the super group cannot change.
    #[error("cannot modify reserved user & group 'admin & super'")]
    ReservedMembership,
    /// The job could not be enqueued.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Proof that provisioning was queued. It does not mean provisioning is done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Identifier of the queued job.
    pub job_id: JobId,
    /// What was queued.
    pub kind: JobKind,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag; false once the scheduler stops accepting work.
    pub ok: bool,
    /// Pending jobs.
    pub queue_size: usize,
    /// Full counters.
    pub stats: SchedulerStats,
}

/// Translates group-membership changes into provisioning jobs.
#[derive(Clone)]
pub struct MembershipService {
    scheduler: Arc<Scheduler>,
}

impl MembershipService {
    /// Wrap the process-wide scheduler.
    #[must_use]
    pub const fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    /// A user joined a group: queue namespace allocation.
    ///
    /// # Errors
    ///
    /// Any submission error.
    pub fn member_added(
        &self,
        uid: u32,
        gid: u32,
        user_name: &str,
    ) -> Result<SubmissionReceipt, ApiError> {
        self.submit(JobKind::AllocateGroupResource, uid, gid, user_name)
    }

    /// A user left a group: queue namespace removal. The admin user cannot
    /// leave the super group.
    ///
    /// # Errors
    ///
    /// `ReservedMembership` or any submission error.
    pub fn member_removed(
        &self,
        uid: u32,
        gid: u32,
        user_name: &str,
    ) -> Result<SubmissionReceipt, ApiError> {
        if uid == RESERVED_UID && gid == RESERVED_GID {
            return Err(ApiError::ReservedMembership);
        }
        self.submit(JobKind::RemoveGroupResource, uid, gid, user_name)
    }

    fn submit(
        &self,
        kind: JobKind,
        uid: u32,
        gid: u32,
        user_name: &str,
    ) -> Result<SubmissionReceipt, ApiError> {
        let payload = JobPayload::GroupMembership(GroupMembership {
            uid,
            gid,
            user_name: user_name.to_string(),
        });
        let job_id = self.scheduler.submit(JobRequest::new(kind, payload))?;
        Ok(SubmissionReceipt { job_id, kind })
    }
}

/// Return a health payload.
#[must_use]
pub fn health(scheduler: &Scheduler) -> Health {
    Health {
        ok: !scheduler.is_closed(),
        queue_size: scheduler.queue_size(),
        stats: scheduler.stats(),
    }
}
