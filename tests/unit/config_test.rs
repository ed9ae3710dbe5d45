//! Tests for configuration defaults, validation and loading

use std::collections::HashMap;
use std::time::Duration;

use provision_scheduler::config::{SchedulerConfig, StorageConfig, ENV_PREFIX};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert!((1..=8).contains(&cfg.worker_count));
    assert_eq!(cfg.max_queue_depth, 1024);
    assert_eq!(cfg.max_attempts, 3);
    assert_eq!(cfg.job_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.shutdown_grace(), Duration::from_secs(35));
    assert!(cfg.shutdown_grace() >= cfg.job_timeout());
    assert!(cfg.storage.is_none());
}

#[test]
fn test_zero_values_rejected() {
    assert!(SchedulerConfig::new().with_worker_count(0).validate().is_err());
    assert!(SchedulerConfig::new().with_max_queue_depth(0).validate().is_err());
    assert!(SchedulerConfig::new().with_max_attempts(0).validate().is_err());
    assert!(SchedulerConfig::new()
        .with_job_timeout(Duration::ZERO)
        .validate()
        .is_err());
    assert!(SchedulerConfig::new()
        .with_shutdown_grace(Duration::ZERO)
        .validate()
        .is_err());
}

#[test]
fn test_grace_shorter_than_job_timeout_rejected() {
    let cfg = SchedulerConfig::new()
        .with_job_timeout(Duration::from_millis(600))
        .with_shutdown_grace(Duration::from_millis(200));
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("shutdown_grace_ms"));

    let cfg = cfg.with_shutdown_grace(Duration::from_millis(600));
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_env_grace_must_cover_timeout() {
    let err = SchedulerConfig::from_lookup(lookup(&[
        ("JOB_TIMEOUT_MS", "30000"),
        ("SHUTDOWN_GRACE_MS", "10000"),
    ]))
    .unwrap_err();
    assert!(err.contains("job_timeout_ms"));
}

#[test]
fn test_zero_backoff_allowed() {
    let cfg = SchedulerConfig::new().with_retry_backoff(Duration::ZERO);
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.retry_delay(3), Duration::ZERO);
}

#[test]
fn test_retry_delay_is_linear() {
    let cfg = SchedulerConfig::new().with_retry_backoff(Duration::from_millis(250));
    assert_eq!(cfg.retry_delay(1), Duration::from_millis(250));
    assert_eq!(cfg.retry_delay(2), Duration::from_millis(500));
    assert_eq!(cfg.retry_delay(4), Duration::from_secs(1));
}

#[test]
fn test_storage_validation() {
    let storage = StorageConfig {
        name: "data".into(),
        class: String::new(),
        size: "5Gi".into(),
    };
    let err = SchedulerConfig::new()
        .with_storage(storage)
        .validate()
        .unwrap_err();
    assert!(err.contains("storage.class"));
}

#[test]
fn test_from_json_str_fills_missing_fields() {
    let cfg = SchedulerConfig::from_json_str(r#"{"worker_count": 2, "max_attempts": 5}"#).unwrap();
    assert_eq!(cfg.worker_count, 2);
    assert_eq!(cfg.max_attempts, 5);
    assert_eq!(cfg.max_queue_depth, SchedulerConfig::default().max_queue_depth);
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("{not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"worker_count": 0}"#).is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("WORKER_COUNT", "4"),
        ("MAX_QUEUE_DEPTH", " 16 "),
        ("JOB_TIMEOUT_MS", "1500"),
        ("STORAGE_NAME", "home"),
        ("STORAGE_SIZE", "20Gi"),
    ]))
    .unwrap();

    assert_eq!(cfg.worker_count, 4);
    assert_eq!(cfg.max_queue_depth, 16);
    assert_eq!(cfg.job_timeout(), Duration::from_millis(1500));
    let storage = cfg.storage.unwrap();
    assert_eq!(storage.name, "home");
    assert_eq!(storage.class, "standard");
    assert_eq!(storage.size, "20Gi");
}

#[test]
fn test_from_lookup_reports_bad_value() {
    let err = SchedulerConfig::from_lookup(lookup(&[("MAX_ATTEMPTS", "many")])).unwrap_err();
    assert!(err.contains("PROVISION_MAX_ATTEMPTS"));
}

#[test]
fn test_from_lookup_validates() {
    assert!(SchedulerConfig::from_lookup(lookup(&[("WORKER_COUNT", "0")])).is_err());
}
