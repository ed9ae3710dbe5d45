//! Collaborators the provisioning executors call into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::StorageConfig;
use crate::core::AppResult;

/// Project identifier in the platform's persistence layer.
pub type ProjectId = u32;

/// Persistent volume claim requested inside a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeClaim {
    /// Claim name.
    pub name: String,
    /// Storage class.
    pub class: String,
    /// Requested size.
    pub size: String,
}

impl From<StorageConfig> for VolumeClaim {
    fn from(cfg: StorageConfig) -> Self {
        Self {
            name: cfg.name,
            class: cfg.class,
            size: cfg.size,
        }
    }
}

/// Read access to the projects a group owns.
#[async_trait]
pub trait ProjectDirectory: Send + Sync + 'static {
    /// Projects belonging to `gid`.
    async fn projects_for_group(&self, gid: u32) -> AppResult<Vec<ProjectId>>;
}

/// Cluster-side provisioning calls. Implementations must be idempotent.
#[async_trait]
pub trait ProvisioningBackend: Send + Sync + 'static {
    /// Create the namespace if it does not exist.
    async fn ensure_namespace(&self, namespace: &str) -> AppResult<()>;

    /// Delete the namespace; a missing namespace is not an error.
    async fn delete_namespace(&self, namespace: &str) -> AppResult<()>;

    /// Create the claim in `namespace` if it does not exist.
    async fn ensure_volume_claim(&self, namespace: &str, claim: &VolumeClaim) -> AppResult<()>;
}
