//! Configuration loader
//!
//! Loads [`ResilienceConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. If any `TIERGUARD_*` variable is set, environment values are applied on
//!    top of the defaults
//! 2. Otherwise probes the standard paths for a config file
//! 3. With neither present, the defaults are used
//!
//! ## Environment Variables
//! - `TIERGUARD_BUCKET_DURATION_MS`: Rolling window bucket duration
//! - `TIERGUARD_BUCKET_COUNT`: Number of retained buckets
//! - `TIERGUARD_ERROR_RATE_THRESHOLD`: Probe threshold in (0, 1]
//! - `TIERGUARD_MIN_SAMPLES`: Outcomes required before the probe may trip
//! - `TIERGUARD_FETCH_TIMEOUT_MS`: Bound on each underlying tier fetch
//! - `TIERGUARD_AUTO_DEGRADE`: Distributed cache auto-degrade (true/false)
//! - `TIERGUARD_HOT_KEYS`: Comma-separated hot keys
//!
//! ## File Locations
//! The loader probes `tierguard.toml`, `tierguard.json` and `config.toml` in
//! the current working directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tierguard_core::{ResilienceConfig, StoreError, StoreResult};

const ENV_BUCKET_DURATION_MS: &str = "TIERGUARD_BUCKET_DURATION_MS";
const ENV_BUCKET_COUNT: &str = "TIERGUARD_BUCKET_COUNT";
const ENV_ERROR_RATE_THRESHOLD: &str = "TIERGUARD_ERROR_RATE_THRESHOLD";
const ENV_MIN_SAMPLES: &str = "TIERGUARD_MIN_SAMPLES";
const ENV_FETCH_TIMEOUT_MS: &str = "TIERGUARD_FETCH_TIMEOUT_MS";
const ENV_AUTO_DEGRADE: &str = "TIERGUARD_AUTO_DEGRADE";
const ENV_HOT_KEYS: &str = "TIERGUARD_HOT_KEYS";

const ENV_VARS: [&str; 7] = [
    ENV_BUCKET_DURATION_MS,
    ENV_BUCKET_COUNT,
    ENV_ERROR_RATE_THRESHOLD,
    ENV_MIN_SAMPLES,
    ENV_FETCH_TIMEOUT_MS,
    ENV_AUTO_DEGRADE,
    ENV_HOT_KEYS,
];

const CONFIG_FILE_NAMES: [&str; 3] = ["tierguard.toml", "tierguard.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `StoreError::Config` if a present source is malformed or the
/// resulting configuration fails validation.
pub fn load() -> StoreResult<ResilienceConfig> {
    if ENV_VARS.iter().any(|key| std::env::var_os(key).is_some()) {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(&path)),
        None => {
            tracing::debug!("No config source found, using defaults");
            Ok(ResilienceConfig::default())
        }
    }
}

/// Load configuration from environment variables
///
/// Unset variables keep their default values.
///
/// # Errors
/// Returns `StoreError::Config` if a variable holds an invalid value.
pub fn load_from_env() -> StoreResult<ResilienceConfig> {
    let mut config = ResilienceConfig::default();

    if let Some(value) = env_parse(ENV_BUCKET_DURATION_MS)? {
        config.window.bucket_duration_ms = value;
    }
    if let Some(value) = env_parse(ENV_BUCKET_COUNT)? {
        config.window.bucket_count = value;
    }
    if let Some(value) = env_parse(ENV_ERROR_RATE_THRESHOLD)? {
        config.probe.error_rate_threshold = value;
    }
    if let Some(value) = env_parse(ENV_MIN_SAMPLES)? {
        config.probe.min_samples = value;
    }
    if let Some(value) = env_parse(ENV_FETCH_TIMEOUT_MS)? {
        config.reader.fetch_timeout_ms = Some(value);
    }
    config.policy.auto_degrade = env_bool(ENV_AUTO_DEGRADE, config.policy.auto_degrade);
    if let Ok(keys) = std::env::var(ENV_HOT_KEYS) {
        config.policy.hot_keys = parse_hot_keys(&keys);
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension).
///
/// # Errors
/// Returns `StoreError::Config` if the file is missing, unreadable,
/// malformed or invalid.
pub fn load_from_file(path: Option<&Path>) -> StoreResult<ResilienceConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StoreError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => probe_config_paths().ok_or_else(|| {
            StoreError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StoreError::config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration by file extension (`.json` or `.toml`)
fn parse_config(contents: &str, path: &Path) -> StoreResult<ResilienceConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StoreError::config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StoreError::config(format!("Invalid JSON format: {e}"))),
        _ => Err(StoreError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        let parent = cwd.join("..");
        dirs.push(cwd);
        dirs.push(parent);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_parse<T>(key: &str) -> StoreResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| StoreError::config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn parse_hot_keys(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|key| !key.is_empty()).map(String::from).collect()
}
