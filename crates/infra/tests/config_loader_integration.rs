//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! wiring it into the policy source.

use std::io::Write;

use tempfile::NamedTempFile;
use tierguard_core::PolicyConfig;
use tierguard_infra::{config, StaticPolicy};

fn write_config(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_toml_file() {
    let file = write_config(
        r#"
[window]
bucket_duration_ms = 20
bucket_count = 50

[probe]
error_rate_threshold = 0.75
min_samples = 10

[reader]
fetch_timeout_ms = 150

[policy]
hot_keys = ["user:1", "user:2"]
auto_degrade = true
"#,
        ".toml",
    );

    let config = config::load_from_file(Some(file.path())).expect("TOML config loads");

    assert_eq!(config.window.bucket_duration_ms, 20);
    assert_eq!(config.window.bucket_count, 50);
    assert_eq!(config.probe.min_samples, 10);
    assert_eq!(config.reader.fetch_timeout_ms, Some(150));

    let window = config.window.to_window_config().expect("valid window");
    assert_eq!(window.span(), std::time::Duration::from_millis(1000));

    let policy = StaticPolicy::from_settings(&config.policy);
    assert!(policy.is_hot_key("user:2"));
    assert!(policy.is_auto_degrade_enabled());
}

#[test]
fn test_load_config_from_json_file() {
    let file = write_config(r#"{"policy": {"auto_degrade": false}}"#, ".json");

    let config = config::load_from_file(Some(file.path())).expect("JSON config loads");

    assert!(!config.policy.auto_degrade);
    assert_eq!(config.window.bucket_count, 100);
    assert!(config.reader.fetch_timeout().is_none());
}

#[test]
fn test_invalid_toml_is_rejected() {
    let file = write_config("[window\nbucket_count = ", ".toml");
    let err = config::load_from_file(Some(file.path())).expect_err("malformed TOML");
    assert!(err.to_string().contains("Invalid TOML format"));
}
