//! Configuration models for the scheduler and provisioning executors.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, StorageConfig, ENV_PREFIX};
