//! Core scheduling abstractions: jobs, executors, registry, queue and scheduler.

pub mod audit;
pub mod error;
pub mod executor;
pub mod job;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod stats;

pub use audit::{AuditAction, AuditEvent, AuditLog, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use error::{AppResult, SchedulerError};
pub use executor::JobExecutor;
pub use job::{GroupMembership, Job, JobId, JobKind, JobPayload, JobRequest, JobState};
pub use queue::JobQueue;
pub use registry::ExecutorRegistry;
pub use scheduler::Scheduler;
pub use stats::SchedulerStats;
