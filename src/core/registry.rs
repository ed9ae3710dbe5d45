//! Startup-time mapping from job kind to executor.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{JobExecutor, JobKind, SchedulerError};

/// Kind -> executor table.
///
/// Populated before the scheduler starts, then shared read-only behind an
/// `Arc`, so lookups during dispatch need no locking.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<JobKind, Arc<dyn JobExecutor>>,
}

impl ExecutorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executor under the kind it reports.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if the kind already has an executor.
    pub fn register<E>(&mut self, executor: E) -> Result<(), SchedulerError>
    where
        E: JobExecutor,
    {
        self.register_arc(Arc::new(executor))
    }

    /// Register an already shared executor.
    ///
    /// # Errors
    ///
    /// `DuplicateRegistration` if the kind already has an executor.
    pub fn register_arc(&mut self, executor: Arc<dyn JobExecutor>) -> Result<(), SchedulerError> {
        let kind = executor.kind();
        if self.executors.contains_key(&kind) {
            return Err(SchedulerError::DuplicateRegistration(kind));
        }
        debug!(kind = %kind, "executor registered");
        self.executors.insert(kind, executor);
        Ok(())
    }

    /// Look up the executor for a kind.
    ///
    /// # Errors
    ///
    /// `UnknownKind` if nothing is registered for it.
    pub fn resolve(&self, kind: JobKind) -> Result<Arc<dyn JobExecutor>, SchedulerError> {
        self.executors
            .get(&kind)
            .cloned()
            .ok_or(SchedulerError::UnknownKind(kind))
    }

    /// Registered kinds in a stable order.
    #[must_use]
    pub fn kinds(&self) -> Vec<JobKind> {
        let mut kinds: Vec<_> = self.executors.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Whether no executor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
