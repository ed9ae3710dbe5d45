//! Scheduler process entry point.
//!
//! Loads configuration from `PROVISION_*` variables (and `.env`), registers
//! the namespace executors over the in-memory backend, and runs the dispatch
//! loop until SIGTERM/SIGINT.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use provision_scheduler::builders::SchedulerBuilder;
use provision_scheduler::config::SchedulerConfig;
use provision_scheduler::core::{AuditLog, TracingAuditSink};
use provision_scheduler::executors::{InMemoryProjectDirectory, InMemoryProvisioner};
use provision_scheduler::runtime::install_shutdown_handler;
use provision_scheduler::util::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => {
            info!("scheduler exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "scheduler error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = SchedulerConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading configuration")?;
    let (audit, audit_writer) = AuditLog::spawn(TracingAuditSink, config.audit_buffer);

    let scheduler = SchedulerBuilder::new(config)
        .with_group_resource_executors(
            Arc::new(InMemoryProjectDirectory::new()),
            Arc::new(InMemoryProvisioner::new()),
        )?
        .with_audit(audit)
        .build()?;

    let token = install_shutdown_handler();
    info!(queue = scheduler.queue_size(), "Starting scheduler");
    let result = scheduler.start(token).await;

    // Releases the last audit handle so the writer drains.
    drop(scheduler);
    if let Err(e) = audit_writer.await {
        error!(error = %e, "audit writer failed");
    }

    result.context("dispatch loop")
}
