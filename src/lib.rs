//! # Provision Scheduler
//!
//! In-process job scheduler that runs infrastructure provisioning (per-user
//! namespaces and storage) asynchronously, off the request path of an
//! administrative API.
//!
//! ## Pieces
//!
//! - **Job**: a unit of work with a [`JobKind`](core::JobKind), a payload and
//!   a lifecycle `Pending -> Running -> {Succeeded | Pending (retry) | Failed}`
//! - **Executor**: [`JobExecutor`](core::JobExecutor), one per kind
//! - **Registry**: [`ExecutorRegistry`](core::ExecutorRegistry), filled at
//!   startup and read-only afterwards
//! - **Scheduler**: [`Scheduler`](core::Scheduler), a FIFO queue with
//!   rejecting backpressure, a dispatch loop, a bounded worker pool, per-job
//!   timeouts, retries with linear backoff and cooperative shutdown
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use provision_scheduler::builders::SchedulerBuilder;
//! use provision_scheduler::config::SchedulerConfig;
//! use provision_scheduler::executors::{InMemoryProjectDirectory, InMemoryProvisioner};
//! use provision_scheduler::runtime::{install_shutdown_handler, MembershipService};
//!
//! let scheduler = Arc::new(
//!     SchedulerBuilder::new(SchedulerConfig::from_env()?)
//!         .with_group_resource_executors(
//!             Arc::new(InMemoryProjectDirectory::new()),
//!             Arc::new(InMemoryProvisioner::new()),
//!         )?
//!         .build()?,
//! );
//!
//! let service = MembershipService::new(Arc::clone(&scheduler));
//! let receipt = service.member_added(7, 3, "alice")?;
//!
//! scheduler.start(install_shutdown_handler()).await?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: jobs, executors, registry, queue, scheduler.
pub mod core;
/// Configuration models for the scheduler and storage.
pub mod config;
/// Builders to construct the scheduler from configuration.
pub mod builders;
/// Provisioning executors and their collaborators.
pub mod executors;
/// Submission API, health and process shutdown.
pub mod runtime;
/// Shared utilities.
pub mod util;
