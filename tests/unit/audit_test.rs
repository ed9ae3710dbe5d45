//! Tests for audit events and sinks

use provision_scheduler::core::{
    AuditAction, AuditEvent, AuditLog, AuditSink, GroupMembership, InMemoryAuditSink, Job,
    JobKind, JobPayload, JobRequest, TracingAuditSink,
};

fn make_job(uid: u32) -> Job {
    Job::submit(JobRequest::new(
        JobKind::AllocateGroupResource,
        JobPayload::GroupMembership(GroupMembership {
            uid,
            gid: 3,
            user_name: "dave".into(),
        }),
    ))
}

#[test]
fn test_event_copies_job_fields() {
    let mut job = make_job(1);
    job.start_attempt().unwrap();
    let event = AuditEvent::for_job(&job, AuditAction::Started, None);

    assert_eq!(event.job_id, job.id);
    assert_eq!(event.kind, JobKind::AllocateGroupResource);
    assert_eq!(event.attempt, 1);
    assert!(event.detail.is_none());
}

#[test]
fn test_event_serializes_action_in_snake_case() {
    let event = AuditEvent::for_job(&make_job(1), AuditAction::Abandoned, Some("late".into()));
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "abandoned");
    assert_eq!(json["detail"], "late");
}

#[test]
fn test_events_for_filters_by_job() {
    let a = make_job(1);
    let b = make_job(2);
    let mut sink = InMemoryAuditSink::new(10);
    sink.record(AuditEvent::for_job(&a, AuditAction::Submitted, None));
    sink.record(AuditEvent::for_job(&b, AuditAction::Submitted, None));
    sink.record(AuditEvent::for_job(&a, AuditAction::Started, None));

    assert_eq!(sink.events().len(), 3);
    assert_eq!(sink.events_for(a.id).len(), 2);
    assert_eq!(sink.events_for(b.id).len(), 1);
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(AuditEvent::for_job(&make_job(1), AuditAction::Failed, Some("boom".into())));
}

#[tokio::test]
async fn test_cloned_handles_share_writer() {
    let sink = InMemoryAuditSink::new(10);
    let (log, writer) = AuditLog::spawn(sink.clone(), 4);
    let other = log.clone();
    let job = make_job(1);

    log.record(AuditEvent::for_job(&job, AuditAction::Submitted, None));
    other.record(AuditEvent::for_job(&job, AuditAction::Started, None));
    drop(log);
    drop(other);
    writer.await.unwrap();

    assert_eq!(sink.events_for(job.id).len(), 2);
}
