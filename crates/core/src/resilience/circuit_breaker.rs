//! Circuit breaker
//!
//! Counts consecutive upstream failures. At the threshold the circuit opens
//! and every call is refused locally. After the recovery timeout one trial
//! call is admitted: success closes the circuit, failure reopens it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use adflow_domain::{
    impl_domain_enum_conversions, CircuitBreakerSettings, ErrorKind, Failure, FailureOrigin,
    Outcome,
};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls flow normally
    Closed,
    /// Calls are refused until the recovery timeout elapses
    Open,
    /// One trial call decides whether to close again
    HalfOpen,
}

impl_domain_enum_conversions!(CircuitState {
    Closed => "closed",
    Open => "open",
    HalfOpen => "half_open",
});

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_started: Option<Instant>,
}

/// Breaker shared by every request of one executor.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    circuit: Mutex<Circuit>,
    trips: AtomicU64,
    rejected: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            recovery_timeout,
            circuit: Mutex::new(Circuit {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_started: None,
            }),
            trips: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &CircuitBreakerSettings) -> Self {
        Self::new(settings.failure_threshold, settings.recovery_timeout())
    }

    pub fn state(&self) -> CircuitState {
        self.circuit.lock().state
    }

    /// Times the circuit has opened.
    pub fn trips(&self) -> u64 {
        self.trips.load(Ordering::Relaxed)
    }

    /// Calls refused while open.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Ask to make one call.
    ///
    /// An open circuit past its recovery timeout turns half-open and admits a
    /// single trial. A trial that never reports back stops blocking others
    /// after another recovery timeout.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();

        let admitted = match circuit.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let recovered = circuit
                    .opened_at
                    .map_or(true, |opened| now.duration_since(opened) >= self.recovery_timeout);
                if recovered {
                    info!("circuit breaker half-open, admitting trial request");
                    circuit.state = CircuitState::HalfOpen;
                    circuit.trial_started = Some(now);
                }
                recovered
            }
            CircuitState::HalfOpen => {
                let stale = circuit
                    .trial_started
                    .map_or(true, |started| now.duration_since(started) >= self.recovery_timeout);
                if stale {
                    circuit.trial_started = Some(now);
                }
                stale
            }
        };

        if !admitted {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        admitted
    }

    pub fn record_success(&self) {
        let mut circuit = self.circuit.lock();
        if circuit.state == CircuitState::HalfOpen {
            info!("circuit breaker closed, upstream recovered");
        }
        circuit.state = CircuitState::Closed;
        circuit.consecutive_failures = 0;
        circuit.opened_at = None;
        circuit.trial_started = None;
    }

    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut circuit = self.circuit.lock();
        circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);

        let should_open = match circuit.state {
            CircuitState::Closed => circuit.consecutive_failures >= self.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if should_open {
            circuit.state = CircuitState::Open;
            circuit.opened_at = Some(now);
            circuit.trial_started = None;
            self.trips.fetch_add(1, Ordering::Relaxed);
            warn!(
                failures = circuit.consecutive_failures,
                recovery_secs = self.recovery_timeout.as_secs(),
                "circuit breaker opened"
            );
        }
    }

    /// Feed one attempt's outcome into the breaker.
    ///
    /// Only failures that say the upstream is unhealthy count against it. A
    /// 4xx proves the upstream is answering and counts as success. Local
    /// failures count as neither but release a half-open trial.
    pub fn record(&self, outcome: &Outcome) {
        match outcome.failure_ref() {
            None => self.record_success(),
            Some(failure) if failure.origin == FailureOrigin::Client => self.release_trial(),
            Some(failure) if is_upstream_failure(failure) => self.record_failure(),
            Some(_) => self.record_success(),
        }
    }

    fn release_trial(&self) {
        let mut circuit = self.circuit.lock();
        if circuit.state == CircuitState::HalfOpen {
            circuit.trial_started = None;
        }
    }
}

fn is_upstream_failure(failure: &Failure) -> bool {
    matches!(failure.kind, ErrorKind::Server | ErrorKind::Timeout)
        || failure.origin == FailureOrigin::Transport
}

/// Failure returned for calls refused by an open circuit.
pub fn circuit_open_failure() -> Failure {
    Failure::new(
        ErrorKind::Generic,
        "Circuit breaker is open - too many upstream failures",
        FailureOrigin::Client,
    )
}

#[cfg(test)]
mod tests {
    use adflow_domain::Payload;

    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_secs(60))
    }

    fn server_error() -> Outcome {
        Outcome::failure(
            Failure::new(ErrorKind::Server, "boom", FailureOrigin::Response).with_status(503),
        )
    }

    fn trip(breaker: &CircuitBreaker) {
        for _ in 0..3 {
            assert!(breaker.try_acquire());
            breaker.record(&server_error());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn opens_at_threshold_and_refuses_calls() {
        let breaker = breaker();
        breaker.record(&server_error());
        breaker.record(&server_error());
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record(&server_error());
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.try_acquire());
        assert_eq!(breaker.trips(), 1);
        assert_eq!(breaker.rejected(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_the_failure_streak() {
        let breaker = breaker();
        breaker.record(&server_error());
        breaker.record(&server_error());
        breaker.record(&Outcome::success(200, Payload::Text(String::new())));
        breaker.record(&server_error());
        breaker.record(&server_error());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_success_closes() {
        let breaker = breaker();
        trip(&breaker);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(!breaker.try_acquire());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(breaker.try_acquire());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(!breaker.try_acquire(), "only one trial at a time");

        breaker.record(&Outcome::success(200, Payload::Text(String::new())));
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_trial_failure_reopens() {
        let breaker = breaker();
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(60)).await;

        assert!(breaker.try_acquire());
        breaker.record(&server_error());
        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.trips(), 2);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(!breaker.try_acquire());
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_do_not_count() {
        let breaker = breaker();
        let not_found = Outcome::failure(
            Failure::new(ErrorKind::NotFound, "missing", FailureOrigin::Response).with_status(404),
        );
        for _ in 0..10 {
            breaker.record(&not_found);
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn local_failure_releases_the_trial() {
        let breaker = breaker();
        trip(&breaker);
        tokio::time::advance(Duration::from_secs(60)).await;

        assert!(breaker.try_acquire());
        breaker.record(&Outcome::failure(circuit_open_failure()));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.try_acquire());
    }

    #[test]
    fn state_names() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
        assert_eq!("OPEN".parse::<CircuitState>().unwrap(), CircuitState::Open);
    }
}
