//! Retrying executor: bounded attempts, exponential backoff, transient-only
//! retry.
//!
//! An optional circuit breaker and token bucket guard every wire attempt. A
//! call refused by an open circuit ends as a client-side `Generic` failure
//! and is never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use adflow_domain::constants::DEFAULT_TIMEOUT_SECS;
use adflow_domain::{ErrorKind, Outcome, Request, RetryPolicy, TransportFailure};
use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::ports::{RequestExecutor, Transport};
use crate::normalizer::{normalize, normalize_transport_failure};
use crate::resilience::{circuit_open_failure, CircuitBreaker, CircuitState, TokenBucket};

/// Counter snapshot used for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorStats {
    /// Terminal outcomes produced (one per `execute` call).
    pub requests: u64,
    /// Terminal outcomes that were failures.
    pub errors: u64,
    /// Wire attempts, retries included.
    pub attempts: u64,
}

impl ExecutorStats {
    /// Error rate in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> f64 {
        self.errors as f64 / self.requests.max(1) as f64 * 100.0
    }
}

/// Executor that owns a transport exclusively and drives each request to a
/// terminal outcome under a [`RetryPolicy`].
pub struct RetryingExecutor<T> {
    transport: T,
    policy: RetryPolicy,
    default_timeout: Duration,
    rate_limiter: Option<TokenBucket>,
    circuit_breaker: Option<CircuitBreaker>,
    requests: AtomicU64,
    errors: AtomicU64,
    attempts: AtomicU64,
}

impl<T: Transport> RetryingExecutor<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            rate_limiter: None,
            circuit_breaker: None,
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            attempts: AtomicU64::new(0),
        }
    }

    /// Timeout applied to requests that do not carry their own.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Pace wire attempts through `limiter`.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: TokenBucket) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Refuse wire attempts while `breaker` is open.
    #[must_use]
    pub fn with_circuit_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.circuit_breaker = Some(breaker);
        self
    }

    pub const fn rate_limiter(&self) -> Option<&TokenBucket> {
        self.rate_limiter.as_ref()
    }

    pub const fn circuit_breaker(&self) -> Option<&CircuitBreaker> {
        self.circuit_breaker.as_ref()
    }

    pub fn circuit_state(&self) -> Option<CircuitState> {
        self.circuit_breaker.as_ref().map(CircuitBreaker::state)
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
        }
    }

    async fn attempt_once(&self, request: &Request) -> Outcome {
        if let Some(breaker) = &self.circuit_breaker {
            if !breaker.try_acquire() {
                debug!(state = %breaker.state(), "circuit open, request refused");
                return Outcome::failure(circuit_open_failure());
            }
        }
        // The wait for a token is not part of the request timeout.
        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let timeout = request.timeout().unwrap_or(self.default_timeout);
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let sent = tokio::time::timeout(timeout, self.transport.send(request, timeout)).await;
        let outcome = match sent {
            Ok(Ok(response)) => normalize(request, response),
            Ok(Err(failure)) => normalize_transport_failure(request, &failure),
            Err(_) => normalize_transport_failure(
                request,
                &TransportFailure::timeout(format!("no response within {timeout:?}")),
            ),
        };

        if let Some(breaker) = &self.circuit_breaker {
            breaker.record(&outcome);
        }
        outcome
    }

    /// Kind of the failure to retry, or `None` when `outcome` is terminal.
    fn retryable_kind(&self, outcome: &Outcome, attempt: u32) -> Option<ErrorKind> {
        let failure = outcome.failure_ref()?;
        if !self.policy.should_retry(failure) {
            debug!(attempt, kind = %failure.kind, "failure is not retryable");
            return None;
        }
        if attempt >= self.policy.max_attempts() {
            warn!(attempt, kind = %failure.kind, "retry attempts exhausted");
            return None;
        }
        Some(failure.kind)
    }

    fn finish(&self, outcome: Outcome) -> Outcome {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if let Outcome::Failure(failure) = &outcome {
            self.errors.fetch_add(1, Ordering::Relaxed);
            warn!(
                kind = %failure.kind,
                status = ?failure.status_code,
                message = %failure.message,
                "request failed"
            );
        }
        outcome
    }
}

#[async_trait]
impl<T: Transport> RequestExecutor for RetryingExecutor<T> {
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    async fn execute(&self, request: &Request) -> Outcome {
        let mut attempt: u32 = 1;

        loop {
            debug!(attempt, "sending request");
            let outcome = self.attempt_once(request).await;

            if let Outcome::Success { status_code, .. } = &outcome {
                debug!(attempt, status = status_code, "request succeeded");
                return self.finish(outcome);
            }

            let Some(kind) = self.retryable_kind(&outcome, attempt) else {
                return self.finish(outcome);
            };

            let delay = self.policy.delay_for_attempt(attempt);
            warn!(
                attempt,
                kind = %kind,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "transient failure, backing off before retry"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}
