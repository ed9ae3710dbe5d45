//! Builder wiring configuration, executors and audit into a scheduler.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{AuditLog, ExecutorRegistry, JobExecutor, Scheduler, SchedulerError};
use crate::executors::{
    AllocateGroupResourceExecutor, ProjectDirectory, ProvisioningBackend,
    RemoveGroupResourceExecutor, VolumeClaim,
};

/// Collects everything a scheduler needs before it starts.
///
/// Registration happens here, in call order, so the registry is complete
/// and immutable by the time [`build`](Self::build) hands it to the scheduler.
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    registry: ExecutorRegistry,
    audit: Option<AuditLog>,
}

impl SchedulerBuilder {
    /// Start from a configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            registry: ExecutorRegistry::new(),
            audit: None,
        }
    }

    /// Register an executor.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if its kind is taken.
    pub fn register<E>(mut self, executor: E) -> Result<Self, SchedulerError>
    where
        E: JobExecutor,
    {
        self.registry.register(executor)?;
        Ok(self)
    }

    /// Register the namespace allocation and removal executors over the given
    /// collaborators. The configured storage, if any, becomes the volume
    /// claim of every allocated namespace.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if either kind is taken.
    pub fn with_group_resource_executors(
        self,
        directory: Arc<dyn ProjectDirectory>,
        backend: Arc<dyn ProvisioningBackend>,
    ) -> Result<Self, SchedulerError> {
        let claim = self.config.storage.clone().map(VolumeClaim::from);
        self.register(AllocateGroupResourceExecutor::new(
            Arc::clone(&directory),
            Arc::clone(&backend),
            claim,
        ))?
        .register(RemoveGroupResourceExecutor::new(directory, backend))
    }

    /// Send lifecycle events to an audit log.
    #[must_use]
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Build the scheduler.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration does not validate.
    pub fn build(self) -> Result<Scheduler, SchedulerError> {
        Scheduler::new(self.config, self.registry, self.audit)
    }
}
