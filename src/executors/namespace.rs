//! Executors that allocate and remove per-project namespaces for a group member.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, info};

use super::backend::{ProjectDirectory, ProjectId, ProvisioningBackend, VolumeClaim};
use super::{membership, validate_membership};
use crate::core::{AppResult, Job, JobExecutor, JobKind, JobPayload, SchedulerError};

/// Longest namespace name the cluster accepts (DNS label).
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Namespace owned by `user_name` inside project `pid`.
///
/// Lowercased; characters outside `[a-z0-9-]` become `-`; trailing dashes
/// left by truncation are trimmed.
#[must_use]
pub fn format_namespace_name(pid: ProjectId, user_name: &str) -> String {
    let raw = format!("proj-{pid}-{}", user_name.trim()).to_lowercase();
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' { c } else { '-' })
        .take(MAX_NAMESPACE_LEN)
        .collect();
    while name.ends_with('-') {
        name.pop();
    }
    name
}

/// Creates the namespace (and optional volume claim) of every project in the
/// member's group.
pub struct AllocateGroupResourceExecutor {
    directory: Arc<dyn ProjectDirectory>,
    backend: Arc<dyn ProvisioningBackend>,
    claim: Option<VolumeClaim>,
}

impl AllocateGroupResourceExecutor {
    /// Build the executor.
    pub fn new(
        directory: Arc<dyn ProjectDirectory>,
        backend: Arc<dyn ProvisioningBackend>,
        claim: Option<VolumeClaim>,
    ) -> Self {
        Self {
            directory,
            backend,
            claim,
        }
    }
}

#[async_trait]
impl JobExecutor for AllocateGroupResourceExecutor {
    fn kind(&self) -> JobKind {
        JobKind::AllocateGroupResource
    }

    fn validate(&self, payload: &JobPayload) -> Result<(), SchedulerError> {
        validate_membership(payload)
    }

    async fn execute(&self, job: &Job) -> AppResult<()> {
        let member = membership(&job.payload)?;
        let projects = self
            .directory
            .projects_for_group(member.gid)
            .await
            .with_context(|| format!("listing projects of group {}", member.gid))?;

        for pid in &projects {
            let namespace = format_namespace_name(*pid, &member.user_name);
            self.backend
                .ensure_namespace(&namespace)
                .await
                .with_context(|| format!("creating namespace `{namespace}`"))?;
            if let Some(claim) = &self.claim {
                self.backend
                    .ensure_volume_claim(&namespace, claim)
                    .await
                    .with_context(|| format!("creating claim `{}` in `{namespace}`", claim.name))?;
            }
            debug!(job_id = %job.id, namespace = %namespace, "namespace ready");
        }

        info!(
            job_id = %job.id,
            uid = member.uid,
            gid = member.gid,
            projects = projects.len(),
            "group resources allocated"
        );
        Ok(())
    }
}

/// Deletes the namespace of every project in the member's former group.
pub struct RemoveGroupResourceExecutor {
    directory: Arc<dyn ProjectDirectory>,
    backend: Arc<dyn ProvisioningBackend>,
}

impl RemoveGroupResourceExecutor {
    /// Build the executor.
    pub fn new(directory: Arc<dyn ProjectDirectory>, backend: Arc<dyn ProvisioningBackend>) -> Self {
        Self { directory, backend }
    }
}

#[async_trait]
impl JobExecutor for RemoveGroupResourceExecutor {
    fn kind(&self) -> JobKind {
        JobKind::RemoveGroupResource
    }

    fn validate(&self, payload: &JobPayload) -> Result<(), SchedulerError> {
        validate_membership(payload)
    }

    async fn execute(&self, job: &Job) -> AppResult<()> {
        let member = membership(&job.payload)?;
        let projects = self
            .directory
            .projects_for_group(member.gid)
            .await
            .with_context(|| format!("listing projects of group {}", member.gid))?;

        for pid in &projects {
            let namespace = format_namespace_name(*pid, &member.user_name);
            self.backend
                .delete_namespace(&namespace)
                .await
                .with_context(|| format!("deleting namespace `{namespace}`"))?;
        }

        info!(
            job_id = %job.id,
            uid = member.uid,
            gid = member.gid,
            projects = projects.len(),
            "group resources removed"
        );
        Ok(())
    }
}
