//! In-memory provisioning backend and project directory for development and
//! testing.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::backend::{ProjectDirectory, ProjectId, ProvisioningBackend, VolumeClaim};
use crate::core::AppResult;

/// Static group -> projects table.
#[derive(Debug, Default)]
pub struct InMemoryProjectDirectory {
    groups: RwLock<HashMap<u32, Vec<ProjectId>>>,
}

impl InMemoryProjectDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the projects of a group.
    pub fn set_projects(&self, gid: u32, projects: impl IntoIterator<Item = ProjectId>) {
        self.groups.write().insert(gid, projects.into_iter().collect());
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn projects_for_group(&self, gid: u32) -> AppResult<Vec<ProjectId>> {
        Ok(self.groups.read().get(&gid).cloned().unwrap_or_default())
    }
}

/// Namespaces and claims held in a map.
///
/// `fail_next` makes the next N backend calls fail, which lets tests drive
/// the retry path through real executors.
#[derive(Debug, Default)]
pub struct InMemoryProvisioner {
    namespaces: RwLock<BTreeMap<String, BTreeSet<VolumeClaim>>>,
    failures_left: AtomicU32,
    calls: AtomicU64,
}

impl InMemoryProvisioner {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls.
    pub fn fail_next(&self, count: u32) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Existing namespaces, sorted.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces.read().keys().cloned().collect()
    }

    /// Claims inside a namespace, sorted.
    #[must_use]
    pub fn claims(&self, namespace: &str) -> Vec<VolumeClaim> {
        self.namespaces
            .read()
            .get(namespace)
            .map(|claims| claims.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Backend calls made so far, including failed ones.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: &str, namespace: &str) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            bail!("injected failure during {op} of `{namespace}`");
        }
        Ok(())
    }
}

#[async_trait]
impl ProvisioningBackend for InMemoryProvisioner {
    async fn ensure_namespace(&self, namespace: &str) -> AppResult<()> {
        self.enter("create", namespace)?;
        self.namespaces
            .write()
            .entry(namespace.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> AppResult<()> {
        self.enter("delete", namespace)?;
        self.namespaces.write().remove(namespace);
        Ok(())
    }

    async fn ensure_volume_claim(&self, namespace: &str, claim: &VolumeClaim) -> AppResult<()> {
        self.enter("claim", namespace)?;
        let mut namespaces = self.namespaces.write();
        let Some(claims) = namespaces.get_mut(namespace) else {
            bail!("namespace `{namespace}` does not exist");
        };
        claims.insert(claim.clone());
        Ok(())
    }
}
