//! # Adflow Core
//!
//! Request execution logic with no network code of its own.
//!
//! This crate contains:
//! - The error taxonomy (`taxonomy`)
//! - Response normalization into `Outcome` (`normalizer`)
//! - The `Transport` and `RequestExecutor` ports and the retrying executor
//! - The bounded-concurrency batch orchestrator
//! - Opt-in rate limiting and circuit breaking (`resilience`)
//!
//! ## Architecture Principles
//! - Only depends on `adflow-domain`
//! - Sockets live behind the `Transport` port, implemented in `adflow-infra`
//! - Retry and fan-out are testable with in-memory transports

pub mod batch;
pub mod execution;
pub mod normalizer;
pub mod resilience;
pub mod taxonomy;

pub use batch::BatchOrchestrator;
pub use execution::{ExecutorStats, RequestExecutor, RetryingExecutor, Transport};
pub use normalizer::{normalize, normalize_transport_failure};
pub use resilience::{CircuitBreaker, CircuitState, RateLimiterStats, TokenBucket};
pub use taxonomy::{classify, classify_response, extract_message};
