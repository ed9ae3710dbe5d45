//! Audit trail for job lifecycle events.
//!
//! Events are handed to a dedicated task over a bounded channel so recording
//! never blocks the dispatch path and the backlog cannot grow without limit.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{Job, JobId, JobKind};

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Accepted by `submit`.
    Submitted,
    /// An attempt began.
    Started,
    /// An attempt failed and the job went back to the queue.
    Retried,
    /// Terminal success.
    Succeeded,
    /// Terminal failure.
    Failed,
    /// Left pending when the scheduler shut down.
    Abandoned,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Submitted => "submitted",
            Self::Started => "started",
            Self::Retried => "retried",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event identifier.
    pub event_id: Uuid,
    /// Related job.
    pub job_id: JobId,
    /// Kind of the related job.
    pub kind: JobKind,
    /// Action taken.
    pub action: AuditAction,
    /// Attempt number at the time of the event.
    pub attempt: u32,
    /// Additional context, usually an error message.
    pub detail: Option<String>,
    /// When the event was built.
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event describing `job`.
    #[must_use]
    pub fn for_job(job: &Job, action: AuditAction, detail: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            job_id: job.id,
            kind: job.kind,
            action,
            attempt: job.attempts,
            detail,
            created_at: Utc::now(),
        }
    }
}

/// Audit sink abstraction.
pub trait AuditSink: Send + 'static {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// Bounded in-memory sink; clones share the same buffer.
#[derive(Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events recorded for one job, oldest first.
    #[must_use]
    pub fn events_for(&self, job_id: JobId) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Sink that writes each event as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::info!(
            target: "audit",
            event_id = %event.event_id,
            job_id = %event.job_id,
            kind = %event.kind,
            action = %event.action,
            attempt = event.attempt,
            detail = event.detail.as_deref().unwrap_or(""),
            "job audit"
        );
    }
}

/// Handle for recording audit events from any task.
///
/// The background task stops once every handle has been dropped and the
/// channel is drained.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditLog {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn<S>(mut sink: S, buffer: usize) -> (Self, JoinHandle<()>)
    where
        S: AuditSink,
    {
        let (tx, mut rx) = mpsc::channel::<AuditEvent>(buffer.max(1));
        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                sink.record(event);
            }
            tracing::debug!("audit writer drained, exiting");
        });
        (Self { tx }, handle)
    }

    /// Queue an event without waiting. Dropped with a warning if the writer
    /// is behind.
    pub fn record(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                tracing::warn!(
                    job_id = %event.job_id,
                    action = %event.action,
                    "audit buffer full, dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("audit writer stopped, event discarded");
            }
        }
    }
}
