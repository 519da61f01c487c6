//! Retry policy: attempt bound, backoff schedule and which failures are
//! transient.

use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS};
use crate::errors::{AdflowError, ErrorKind, Result};
use crate::types::outcome::{Failure, FailureOrigin};

/// Immutable retry configuration, built once per executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    retryable_kinds: HashSet<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            retryable_kinds: ErrorKind::ALL.into_iter().filter(|k| k.is_transient()).collect(),
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that performs exactly one attempt.
    pub fn no_retry() -> Self {
        Self { max_attempts: 1, ..Self::default() }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn is_retryable_kind(&self, kind: ErrorKind) -> bool {
        self.retryable_kinds.contains(&kind)
    }

    /// Delay to wait after failed attempt `attempt` (1-based) before the next
    /// one: `min(base * 2^(attempt-1), max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        let multiplier = 1u32 << shift;
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }

    /// Whether a failure is transient under this policy.
    ///
    /// `Generic` failures only count when they came from the transport;
    /// client-origin failures never retry.
    pub fn should_retry(&self, failure: &Failure) -> bool {
        if !self.is_retryable_kind(failure.kind) {
            return false;
        }
        match failure.origin {
            FailureOrigin::Client => false,
            FailureOrigin::Transport => true,
            FailureOrigin::Response => failure.kind != ErrorKind::Generic,
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Configure the total number of attempts (initial try + retries).
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.policy.base_delay = delay;
        self
    }

    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Replace the retryable set.
    #[must_use]
    pub fn retryable_kinds(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.policy.retryable_kinds = kinds.into_iter().collect();
        self
    }

    /// Add one kind to the retryable set.
    #[must_use]
    pub fn retry_on(mut self, kind: ErrorKind) -> Self {
        self.policy.retryable_kinds.insert(kind);
        self
    }

    /// # Errors
    /// Returns `AdflowError::Config` when `max_attempts` is zero or the base
    /// delay exceeds the maximum delay.
    pub fn build(self) -> Result<RetryPolicy> {
        if self.policy.max_attempts == 0 {
            return Err(AdflowError::Config("max_attempts must be at least 1".into()));
        }
        if self.policy.base_delay > self.policy.max_delay {
            return Err(AdflowError::Config(format!(
                "base delay {:?} exceeds max delay {:?}",
                self.policy.base_delay, self.policy.max_delay
            )));
        }
        Ok(self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(base_ms: u64, max_ms: u64) -> RetryPolicy {
        RetryPolicy::builder()
            .base_delay(Duration::from_millis(base_ms))
            .max_delay(Duration::from_millis(max_ms))
            .build()
            .unwrap()
    }

    #[test]
    fn default_policy_matches_upstream_behavior() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::from_secs(2));
        assert_eq!(policy.max_delay(), Duration::from_secs(10));
        assert!(policy.is_retryable_kind(ErrorKind::Server));
        assert!(policy.is_retryable_kind(ErrorKind::Timeout));
        assert!(!policy.is_retryable_kind(ErrorKind::RateLimited));
        assert!(!policy.is_retryable_kind(ErrorKind::NotFound));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = policy(2_000, 10_000);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(60), Duration::from_secs(10));
    }

    #[test]
    fn attempt_zero_is_treated_as_first() {
        let policy = policy(100, 1_000);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    }

    #[test]
    fn generic_only_retries_from_transport() {
        let policy = RetryPolicy::default();
        let transport = Failure::new(ErrorKind::Generic, "reset", FailureOrigin::Transport);
        let response = Failure::new(ErrorKind::Generic, "teapot", FailureOrigin::Response);
        let client = Failure::new(ErrorKind::Generic, "closed", FailureOrigin::Client);
        assert!(policy.should_retry(&transport));
        assert!(!policy.should_retry(&response));
        assert!(!policy.should_retry(&client));
    }

    #[test]
    fn server_and_timeout_retry_but_client_errors_do_not() {
        let policy = RetryPolicy::default();
        let server = Failure::new(ErrorKind::Server, "502", FailureOrigin::Response);
        let timeout = Failure::new(ErrorKind::Timeout, "deadline", FailureOrigin::Transport);
        let not_found = Failure::new(ErrorKind::NotFound, "gone", FailureOrigin::Response);
        let throttled = Failure::new(ErrorKind::RateLimited, "slow down", FailureOrigin::Response);
        assert!(policy.should_retry(&server));
        assert!(policy.should_retry(&timeout));
        assert!(!policy.should_retry(&not_found));
        assert!(!policy.should_retry(&throttled));
    }

    #[test]
    fn retry_on_extends_the_set() {
        let policy = RetryPolicy::builder().retry_on(ErrorKind::RateLimited).build().unwrap();
        let throttled = Failure::new(ErrorKind::RateLimited, "slow down", FailureOrigin::Response);
        assert!(policy.should_retry(&throttled));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        assert!(RetryPolicy::builder().max_attempts(0).build().is_err());
        assert!(RetryPolicy::builder()
            .base_delay(Duration::from_secs(20))
            .max_delay(Duration::from_secs(10))
            .build()
            .is_err());
    }
}
