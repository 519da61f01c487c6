//! Client configuration structures.
//!
//! Every section except the API token has defaults, so a config file only
//! needs to name what it overrides.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_BASE_URL, DEFAULT_BATCH_CONCURRENCY,
    DEFAULT_CIRCUIT_FAILURE_THRESHOLD, DEFAULT_CIRCUIT_RECOVERY_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_POOL_IDLE_TIMEOUT_SECS,
    DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_RATE_LIMIT_BURST_ALLOWANCE,
    DEFAULT_RATE_LIMIT_MAX_REQUESTS, DEFAULT_RATE_LIMIT_WINDOW_SECS, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
use crate::errors::{AdflowError, Result};
use crate::types::retry::RetryPolicy;

/// Top-level client configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub batch: BatchSettings,
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
}

/// Retry section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

/// Batch fan-out section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub concurrency_limit: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { concurrency_limit: DEFAULT_BATCH_CONCURRENCY }
    }
}

/// Connection pool section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_idle_per_host: usize,
    pub idle_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            idle_timeout_secs: DEFAULT_POOL_IDLE_TIMEOUT_SECS,
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}

/// Client-side token bucket, acquired before every wire attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Sustained requests allowed per window.
    pub max_requests: u32,
    pub window_secs: u64,
    /// Bucket capacity as a multiple of `max_requests`.
    pub burst_allowance: f64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            burst_allowance: DEFAULT_RATE_LIMIT_BURST_ALLOWANCE,
        }
    }
}

impl RateLimitSettings {
    fn validate(&self) -> Result<()> {
        if self.max_requests == 0 || self.window_secs == 0 {
            return Err(AdflowError::Config(
                "rate_limit max_requests and window_secs must be greater than 0".into(),
            ));
        }
        if !self.burst_allowance.is_finite() || self.burst_allowance < 1.0 {
            return Err(AdflowError::Config(format!(
                "rate_limit burst_allowance must be at least 1.0: {}",
                self.burst_allowance
            )));
        }
        Ok(())
    }
}

/// Circuit breaker section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub enabled: bool,
    /// Consecutive upstream failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial request.
    pub recovery_timeout_secs: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: DEFAULT_CIRCUIT_FAILURE_THRESHOLD,
            recovery_timeout_secs: DEFAULT_CIRCUIT_RECOVERY_TIMEOUT_SECS,
        }
    }
}

impl CircuitBreakerSettings {
    pub const fn recovery_timeout(&self) -> Duration {
        Duration::from_secs(self.recovery_timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl ClientConfig {
    /// Configuration with defaults for everything but the token.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            retry: RetrySettings::default(),
            batch: BatchSettings::default(),
            pool: PoolSettings::default(),
            log: LogConfig::default(),
            rate_limit: RateLimitSettings::default(),
            circuit_breaker: CircuitBreakerSettings::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url_trimmed(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// # Errors
    /// Returns `AdflowError::Config` for the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(AdflowError::Config("API token is required".into()));
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| AdflowError::Config(format!("Invalid base URL {}: {e}", self.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(AdflowError::Config(format!(
                "Base URL must be an absolute http(s) URL: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(AdflowError::Config("timeout_secs must be greater than 0".into()));
        }
        if self.batch.concurrency_limit == 0 {
            return Err(AdflowError::Config("batch concurrency_limit must be greater than 0".into()));
        }

        if self.rate_limit.enabled {
            self.rate_limit.validate()?;
        }
        if self.circuit_breaker.enabled
            && (self.circuit_breaker.failure_threshold == 0
                || self.circuit_breaker.recovery_timeout_secs == 0)
        {
            return Err(AdflowError::Config(
                "circuit_breaker failure_threshold and recovery_timeout_secs must be greater than 0"
                    .into(),
            ));
        }

        self.retry_policy().map(|_| ())
    }

    /// Derive the executor's retry policy.
    ///
    /// # Errors
    /// Returns `AdflowError::Config` for zero attempts or inverted delays.
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::builder()
            .max_attempts(self.retry.max_attempts)
            .base_delay(Duration::from_millis(self.retry.base_delay_ms))
            .max_delay(Duration::from_millis(self.retry.max_delay_ms))
            .build()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("batch", &self.batch)
            .field("pool", &self.pool)
            .field("log", &self.log)
            .field("rate_limit", &self.rate_limit)
            .field("circuit_breaker", &self.circuit_breaker)
            .finish()
    }
}
