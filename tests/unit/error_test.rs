//! Tests for error types

use std::time::Duration;

use provision_scheduler::core::{JobKind, JobState, SchedulerError};

#[test]
fn test_error_display() {
    assert_eq!(
        SchedulerError::UnknownKind(JobKind::RemoveGroupResource).to_string(),
        "no executor registered for kind `remove_group_resource`"
    );
    assert_eq!(SchedulerError::QueueFull(8).to_string(), "queue full: 8 pending jobs");
    assert_eq!(SchedulerError::QueueClosed.to_string(), "queue closed");
    assert!(SchedulerError::ExecutionTimeout(Duration::from_millis(50))
        .to_string()
        .contains("timed out"));
    assert_eq!(
        SchedulerError::InvalidTransition {
            from: JobState::Succeeded,
            to: JobState::Running,
        }
        .to_string(),
        "invalid job transition: succeeded -> running"
    );
}

#[test]
fn test_only_execution_errors_are_retryable() {
    assert!(SchedulerError::ExecutionFailure("x".into()).is_retryable());
    assert!(SchedulerError::ExecutionTimeout(Duration::from_secs(1)).is_retryable());
    assert!(!SchedulerError::QueueFull(1).is_retryable());
    assert!(!SchedulerError::InvalidJob("x".into()).is_retryable());
    assert!(!SchedulerError::UnknownKind(JobKind::AllocateGroupResource).is_retryable());
}

#[test]
fn test_converts_into_anyhow() {
    let err: anyhow::Error = SchedulerError::QueueClosed.into();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
