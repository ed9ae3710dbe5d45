//! Tests for the scheduler builder

use std::sync::Arc;

use provision_scheduler::builders::SchedulerBuilder;
use provision_scheduler::config::SchedulerConfig;
use provision_scheduler::core::{JobKind, SchedulerError};
use provision_scheduler::executors::{
    InMemoryProjectDirectory, InMemoryProvisioner, RemoveGroupResourceExecutor,
};

#[test]
fn test_group_resource_executors_register_both_kinds() {
    let scheduler = SchedulerBuilder::new(SchedulerConfig::new())
        .with_group_resource_executors(
            Arc::new(InMemoryProjectDirectory::new()),
            Arc::new(InMemoryProvisioner::new()),
        )
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(scheduler.registry().kinds(), JobKind::ALL.to_vec());
}

#[test]
fn test_duplicate_executor_rejected() {
    let directory = Arc::new(InMemoryProjectDirectory::new());
    let backend = Arc::new(InMemoryProvisioner::new());
    let result = SchedulerBuilder::new(SchedulerConfig::new())
        .register(RemoveGroupResourceExecutor::new(directory.clone(), backend.clone()))
        .unwrap()
        .with_group_resource_executors(directory, backend);

    assert!(matches!(
        result,
        Err(SchedulerError::DuplicateRegistration(JobKind::RemoveGroupResource))
    ));
}

#[test]
fn test_build_validates_config() {
    let result = SchedulerBuilder::new(SchedulerConfig::new().with_max_attempts(0)).build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}
