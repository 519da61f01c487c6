//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment when one exists
//! 2. Attempts to load from environment variables
//! 3. If the token is missing there, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON and TOML)
//!
//! A token in the environment commits the loader to the environment: an
//! invalid companion variable is an error, never a reason to read a file.
//!
//! ## Environment Variables
//! - `ADFLOW_API_TOKEN`: API token (required; `MainAPI` is accepted as well)
//! - `ADFLOW_BASE_URL`: Upstream base URL
//! - `ADFLOW_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `ADFLOW_MAX_ATTEMPTS`: Total attempts per request, retries included
//! - `ADFLOW_BASE_DELAY_MS`: First backoff delay in milliseconds
//! - `ADFLOW_MAX_DELAY_MS`: Backoff ceiling in milliseconds
//! - `ADFLOW_BATCH_CONCURRENCY`: Requests in flight per batch
//! - `ADFLOW_LOG_LEVEL`: Default log filter directive
//! - `ADFLOW_LOG_JSON`: Emit JSON log lines (true/false)
//! - `ADFLOW_RATE_LIMIT`: Enable the client-side token bucket (true/false)
//! - `ADFLOW_RATE_LIMIT_MAX_REQUESTS`, `ADFLOW_RATE_LIMIT_WINDOW_SECS`,
//!   `ADFLOW_RATE_LIMIT_BURST`: Token bucket sizing
//! - `ADFLOW_CIRCUIT_BREAKER`: Enable the circuit breaker (true/false)
//! - `ADFLOW_CIRCUIT_FAILURE_THRESHOLD`, `ADFLOW_CIRCUIT_RECOVERY_SECS`:
//!   Circuit breaker tuning
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./adflow.json` or `./adflow.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use adflow_domain::{AdflowError, ClientConfig, Result};

const TOKEN_VAR: &str = "ADFLOW_API_TOKEN";
const LEGACY_TOKEN_VAR: &str = "MainAPI";

const CONFIG_FILE_NAMES: [&str; 4] = ["adflow.json", "adflow.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the token is not
/// in the environment, falls back to loading from a config file.
///
/// # Errors
/// Returns `AdflowError::Config` if:
/// - The token is in the environment but another variable is invalid
/// - No token is in the environment and no usable config file is found
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    if env_token().is_err() {
        tracing::debug!("No API token in environment, trying config file");
        return load_from_file(None);
    }

    let config = load_from_env()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only the token is required; every other variable falls back to its
/// default when unset.
///
/// # Errors
/// Returns `AdflowError::Config` if the token is missing or a value is
/// invalid.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_token()?);

    if let Ok(base_url) = env_var("ADFLOW_BASE_URL") {
        config.base_url = base_url;
    }
    if let Some(timeout) = env_parse("ADFLOW_TIMEOUT_SECS")? {
        config.timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse("ADFLOW_MAX_ATTEMPTS")? {
        config.retry.max_attempts = attempts;
    }
    if let Some(delay) = env_parse("ADFLOW_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = delay;
    }
    if let Some(delay) = env_parse("ADFLOW_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = delay;
    }
    if let Some(limit) = env_parse("ADFLOW_BATCH_CONCURRENCY")? {
        config.batch.concurrency_limit = limit;
    }
    if let Ok(level) = env_var("ADFLOW_LOG_LEVEL") {
        config.log.level = level;
    }
    config.log.json = env_bool("ADFLOW_LOG_JSON", config.log.json);

    config.rate_limit.enabled = env_bool("ADFLOW_RATE_LIMIT", config.rate_limit.enabled);
    if let Some(max) = env_parse("ADFLOW_RATE_LIMIT_MAX_REQUESTS")? {
        config.rate_limit.max_requests = max;
    }
    if let Some(window) = env_parse("ADFLOW_RATE_LIMIT_WINDOW_SECS")? {
        config.rate_limit.window_secs = window;
    }
    if let Some(burst) = env_parse("ADFLOW_RATE_LIMIT_BURST")? {
        config.rate_limit.burst_allowance = burst;
    }
    config.circuit_breaker.enabled =
        env_bool("ADFLOW_CIRCUIT_BREAKER", config.circuit_breaker.enabled);
    if let Some(threshold) = env_parse("ADFLOW_CIRCUIT_FAILURE_THRESHOLD")? {
        config.circuit_breaker.failure_threshold = threshold;
    }
    if let Some(secs) = env_parse("ADFLOW_CIRCUIT_RECOVERY_SECS")? {
        config.circuit_breaker.recovery_timeout_secs = secs;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `AdflowError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AdflowError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AdflowError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AdflowError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AdflowError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AdflowError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AdflowError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent, then
/// the same three levels relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots.iter().flat_map(|root| candidates_under(root)).find(|path| path.exists())
}

fn candidates_under(root: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .iter()
        .flat_map(|up| CONFIG_FILE_NAMES.iter().map(move |name| root.join(up).join(name)))
        .collect()
}

/// API token from `ADFLOW_API_TOKEN`, else the legacy `MainAPI`.
fn env_token() -> Result<String> {
    env_var(TOKEN_VAR).or_else(|_| env_var(LEGACY_TOKEN_VAR))
}

/// Get required environment variable
///
/// # Errors
/// Returns `AdflowError::Config` if the variable is not set or empty.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AdflowError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional numeric environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AdflowError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map_or(default, |s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
