//! Port interfaces for request execution

use std::time::Duration;

use adflow_domain::{Outcome, RawResponse, Request, TransportFailure};
use async_trait::async_trait;

/// One HTTP round-trip with no retry and no interpretation of the status.
///
/// Implementations own their connection pool and must be safe to call from
/// many tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and read the full body, giving up after `timeout`.
    async fn send(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<RawResponse, TransportFailure>;
}

/// Executes one logical request to a terminal [`Outcome`].
///
/// Expected HTTP and transport failures are reported as
/// `Outcome::Failure`, never as a panic or error.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &Request) -> Outcome;
}
