//! Tests for the membership submission API and health reporting

use std::sync::Arc;

use provision_scheduler::builders::SchedulerBuilder;
use provision_scheduler::config::SchedulerConfig;
use provision_scheduler::core::{JobKind, Scheduler, SchedulerError};
use provision_scheduler::executors::{InMemoryProjectDirectory, InMemoryProvisioner};
use provision_scheduler::runtime::{
    health, ApiError, MembershipService, RESERVED_GID, RESERVED_UID,
};
use tokio_util::sync::CancellationToken;

fn membership_service(config: SchedulerConfig) -> (MembershipService, Arc<Scheduler>) {
    let scheduler = Arc::new(
        SchedulerBuilder::new(config)
            .with_group_resource_executors(
                Arc::new(InMemoryProjectDirectory::new()),
                Arc::new(InMemoryProvisioner::new()),
            )
            .unwrap()
            .build()
            .unwrap(),
    );
    (MembershipService::new(Arc::clone(&scheduler)), scheduler)
}

#[test]
fn test_member_added_enqueues_allocation() {
    let (service, scheduler) = membership_service(SchedulerConfig::new());
    let receipt = service.member_added(7, 3, "alice").unwrap();

    assert_eq!(receipt.kind, JobKind::AllocateGroupResource);
    assert_eq!(scheduler.queue_size(), 1);
}

#[test]
fn test_member_removed_enqueues_removal() {
    let (service, _) = membership_service(SchedulerConfig::new());
    let receipt = service.member_removed(7, 3, "alice").unwrap();
    assert_eq!(receipt.kind, JobKind::RemoveGroupResource);
}

#[test]
fn test_reserved_membership_cannot_be_removed() {
    let (service, scheduler) = membership_service(SchedulerConfig::new());
    let err = service
        .member_removed(RESERVED_UID, RESERVED_GID, "admin")
        .unwrap_err();

    assert!(matches!(err, ApiError::ReservedMembership));
    assert_eq!(scheduler.queue_size(), 0);
}

#[test]
fn test_reserved_membership_can_be_added() {
    let (service, scheduler) = membership_service(SchedulerConfig::new());
    let receipt = service
        .member_added(RESERVED_UID, RESERVED_GID, "admin")
        .unwrap();

    assert_eq!(receipt.kind, JobKind::AllocateGroupResource);
    assert_eq!(scheduler.queue_size(), 1);
}

#[test]
fn test_invalid_membership_surfaces_scheduler_error() {
    let (service, _) = membership_service(SchedulerConfig::new());
    let err = service.member_added(7, 3, "  ").unwrap_err();
    assert!(matches!(err, ApiError::Scheduler(SchedulerError::InvalidJob(_))));
}

#[test]
fn test_queue_full_surfaces_through_api() {
    let (service, _) = membership_service(SchedulerConfig::new().with_max_queue_depth(1));
    service.member_added(7, 3, "alice").unwrap();
    let err = service.member_added(8, 3, "bob").unwrap_err();
    assert!(matches!(err, ApiError::Scheduler(SchedulerError::QueueFull(1))));
}

#[tokio::test]
async fn test_health_reflects_shutdown() {
    let (service, scheduler) = membership_service(SchedulerConfig::new());
    service.member_added(7, 3, "alice").unwrap();

    let before = health(&scheduler);
    assert!(before.ok);
    assert_eq!(before.queue_size, 1);
    assert_eq!(before.stats.submitted_jobs, 1);

    let token = CancellationToken::new();
    token.cancel();
    scheduler.start(token).await.unwrap();

    let after = health(&scheduler);
    assert!(!after.ok);
    assert_eq!(after.queue_size, 0);
    assert!(matches!(
        service.member_added(8, 3, "bob"),
        Err(ApiError::Scheduler(SchedulerError::QueueClosed))
    ));
}
