//! Application constants
//!
//! Centralized location for the upstream contract and the tunable defaults.

// Upstream contract
pub const DEFAULT_BASE_URL: &str = "https://ssp-api.propellerads.com/v5";
pub const BALANCE_PATH: &str = "/adv/balance";
pub const CAMPAIGNS_PATH: &str = "/adv/campaigns";
pub const STATISTICS_PATH: &str = "/adv/statistics";
pub const COLLECTIONS_PATH: &str = "/collections/targeting";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// Request defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("adflow/", env!("CARGO_PKG_VERSION"));

// Retry defaults: 3 attempts, 2s first retry, 10s ceiling
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

// Fan-out and pool sizing
pub const DEFAULT_BATCH_CONCURRENCY: usize = 5;
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 5;
pub const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

// Logging
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Client-side rate limit: 60 requests a minute with 50% burst headroom
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 60;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const DEFAULT_RATE_LIMIT_BURST_ALLOWANCE: f64 = 1.5;

// Circuit breaker: open after 5 upstream failures, admit a trial call after 60s
pub const DEFAULT_CIRCUIT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_CIRCUIT_RECOVERY_TIMEOUT_SECS: u64 = 60;
