//! Scheduler and provisioning configuration structures.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "PROVISION_";

/// Volume claim created in every allocated namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Claim name.
    pub name: String,
    /// Storage class.
    pub class: String,
    /// Requested size, e.g. `10Gi`.
    pub size: String,
}

impl StorageConfig {
    /// Validate storage values.
    ///
    /// # Errors
    ///
    /// Describes the first empty field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("storage.name must not be empty".into());
        }
        if self.class.trim().is_empty() {
            return Err("storage.class must not be empty".into());
        }
        if self.size.trim().is_empty() {
            return Err("storage.size must not be empty".into());
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Jobs executed concurrently.
    pub worker_count: usize,
    /// Pending jobs accepted before `submit` rejects with `QueueFull`.
    pub max_queue_depth: usize,
    /// Attempts per job, including the first.
    pub max_attempts: u32,
    /// Upper bound for a single attempt, in milliseconds.
    pub job_timeout_ms: u64,
    /// Backoff unit; the delay before attempt `n + 1` is `n` times this.
    pub retry_backoff_ms: u64,
    /// How long shutdown waits for running jobs, in milliseconds. Must be at
    /// least `job_timeout_ms` so a running attempt ends on its own.
    pub shutdown_grace_ms: u64,
    /// Capacity of the terminal-outcome channel.
    pub outcome_buffer: usize,
    /// Capacity of the audit channel.
    pub audit_buffer: usize,
    /// Optional volume claim for allocated namespaces.
    pub storage: Option<StorageConfig>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().clamp(1, 8),
            max_queue_depth: 1024,
            max_attempts: 3,
            job_timeout_ms: 30_000,
            retry_backoff_ms: 500,
            shutdown_grace_ms: 35_000,
            outcome_buffer: 256,
            audit_buffer: 256,
            storage: None,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker pool size.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue depth limit.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = depth;
        self
    }

    /// Set the attempt limit.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the per-attempt timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the retry backoff unit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Set the shutdown grace period.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    /// Attach a volume claim to allocations.
    #[must_use]
    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    /// Backoff before the attempt following attempt number `attempts`.
    #[must_use]
    pub fn retry_delay(&self, attempts: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempts)))
    }

    /// Shutdown grace period.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".into());
        }
        if self.job_timeout_ms == 0 {
            return Err("job_timeout_ms must be greater than 0".into());
        }
        if self.shutdown_grace_ms < self.job_timeout_ms {
            return Err(format!(
                "shutdown_grace_ms ({}) must be at least job_timeout_ms ({})",
                self.shutdown_grace_ms, self.job_timeout_ms
            ));
        }
        if self.outcome_buffer == 0 {
            return Err("outcome_buffer must be greater than 0".into());
        }
        if self.audit_buffer == 0 {
            return Err("audit_buffer must be greater than 0".into());
        }
        if let Some(storage) = &self.storage {
            storage.validate()?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `PROVISION_*` environment variables, loading
    /// a `.env` file first if present. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// A variable that does not parse, or validation failure.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) against an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// A value that does not parse, or validation failure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let read = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        override_parsed(&read, "WORKER_COUNT", &mut cfg.worker_count)?;
        override_parsed(&read, "MAX_QUEUE_DEPTH", &mut cfg.max_queue_depth)?;
        override_parsed(&read, "MAX_ATTEMPTS", &mut cfg.max_attempts)?;
        override_parsed(&read, "JOB_TIMEOUT_MS", &mut cfg.job_timeout_ms)?;
        override_parsed(&read, "RETRY_BACKOFF_MS", &mut cfg.retry_backoff_ms)?;
        override_parsed(&read, "SHUTDOWN_GRACE_MS", &mut cfg.shutdown_grace_ms)?;
        override_parsed(&read, "OUTCOME_BUFFER", &mut cfg.outcome_buffer)?;
        override_parsed(&read, "AUDIT_BUFFER", &mut cfg.audit_buffer)?;

        if let Some(name) = read("STORAGE_NAME") {
            cfg.storage = Some(StorageConfig {
                name,
                class: read("STORAGE_CLASS").unwrap_or_else(|| "standard".into()),
                size: read("STORAGE_SIZE").unwrap_or_else(|| "1Gi".into()),
            });
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn override_parsed<T, F>(read: &F, name: &str, slot: &mut T) -> Result<(), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = read(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| format!("{ENV_PREFIX}{name}: {e}"))?;
    }
    Ok(())
}
