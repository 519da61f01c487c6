//! Client-side protection for the upstream
//!
//! Both guards are opt-in and sit in front of every wire attempt the
//! retrying executor makes.

pub mod circuit_breaker;
pub mod rate_limiter;

pub use circuit_breaker::{circuit_open_failure, CircuitBreaker, CircuitState};
pub use rate_limiter::{RateLimiterStats, TokenBucket};
