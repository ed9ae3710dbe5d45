//! Provisioning executors plugged into the scheduler.
//!
//! Both executors act on a [`GroupMembership`] payload: they list the
//! projects of the group and create or delete one namespace per project for
//! the member. The provisioning calls themselves sit behind
//! [`ProvisioningBackend`] and [`ProjectDirectory`].

pub mod backend;
pub mod memory;
pub mod namespace;

pub use backend::{ProjectDirectory, ProjectId, ProvisioningBackend, VolumeClaim};
pub use memory::{InMemoryProjectDirectory, InMemoryProvisioner};
pub use namespace::{
    format_namespace_name, AllocateGroupResourceExecutor, RemoveGroupResourceExecutor,
};

use crate::core::{GroupMembership, JobPayload, SchedulerError};

/// Extract the membership payload.
///
/// # Errors
///
/// `InvalidJob` if the payload is of another type.
pub fn membership(payload: &JobPayload) -> Result<&GroupMembership, SchedulerError> {
    payload
        .as_group_membership()
        .ok_or_else(|| SchedulerError::InvalidJob("expected a group membership payload".into()))
}

/// Check the fields every membership job needs.
///
/// # Errors
///
/// `InvalidJob` naming the offending field.
pub fn validate_membership(payload: &JobPayload) -> Result<(), SchedulerError> {
    let member = membership(payload)?;
    if member.user_name.trim().is_empty() {
        return Err(SchedulerError::InvalidJob("user_name must not be empty".into()));
    }
    if member.gid == 0 {
        return Err(SchedulerError::InvalidJob("gid must be set".into()));
    }
    Ok(())
}
