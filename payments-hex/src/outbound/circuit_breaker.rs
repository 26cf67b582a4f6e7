//! Circuit breaker decorator.
//!
//! State machine:
//!
//! ```text
//!   Closed --(max_attempts failures within open_timeout)--> Open
//!   Open   --(reset_timeout elapsed)----------------------> HalfOpen
//!   HalfOpen --(trial succeeds)---------------------------> Closed
//!   HalfOpen --(trial fails)------------------------------> Open
//! ```
//!
//! Only transient failures count. Every counted failure, and every call
//! short-circuited while open, is answered by the small-charge fallback.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use payments_types::{CreditCard, FraudCheckError, FraudChecker, FraudStatus, Money};

use super::fallback::SmallChargeFallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Failures inside one window that open the circuit.
    pub max_attempts: u32,
    /// Length of the failure-counting window, from its first failure.
    pub open_timeout: Duration,
    /// How long the circuit stays open before a trial call.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            open_timeout: Duration::from_millis(15_000),
            reset_timeout: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Whether a call may reach the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed, call normally.
    Call,
    /// Half-open probe. Its outcome decides the next state.
    Trial,
    /// Short-circuit to the fallback.
    Reject,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failures: u32,
    window_started: Option<Instant>,
    opened_at: Option<Instant>,
    trial_started: Option<Instant>,
}

/// Shared breaker state. The lock is never held across an await.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: CircuitBreakerConfig {
                max_attempts: config.max_attempts.max(1),
                ..config
            },
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                window_started: None,
                opened_at: None,
                trial_started: None,
            }),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state. An open circuit whose reset timeout has passed
    /// reports `HalfOpen`.
    pub fn state_at(&self, now: Instant) -> CircuitState {
        let inner = self.lock();
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened))
                if now.duration_since(opened) >= self.config.reset_timeout =>
            {
                CircuitState::HalfOpen
            }
            (state, _) => state,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state_at(Instant::now())
    }

    pub fn admit_at(&self, now: Instant) -> Admission {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Admission::Call,
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|t| now.duration_since(t));
                if elapsed.is_some_and(|e| e >= self.config.reset_timeout) {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started = Some(now);
                    tracing::info!("Circuit half-open, letting a trial call through");
                    Admission::Trial
                } else {
                    Admission::Reject
                }
            }
            CircuitState::HalfOpen => {
                // A trial whose caller went away must not wedge the circuit.
                let stale = inner
                    .trial_started
                    .is_none_or(|t| now.duration_since(t) >= self.config.reset_timeout);
                if stale {
                    inner.trial_started = Some(now);
                    Admission::Trial
                } else {
                    Admission::Reject
                }
            }
        }
    }

    pub fn record_success_at(&self, _now: Instant) {
        let mut inner = self.lock();
        if inner.state != CircuitState::Closed {
            tracing::info!("Circuit closed");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.window_started = None;
        inner.opened_at = None;
        inner.trial_started = None;
    }

    pub fn record_failure_at(&self, now: Instant) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::HalfOpen => self.trip(&mut inner, now),
            CircuitState::Closed => {
                let window_open = inner
                    .window_started
                    .is_some_and(|t| now.duration_since(t) <= self.config.open_timeout);
                if window_open {
                    inner.failures += 1;
                } else {
                    inner.window_started = Some(now);
                    inner.failures = 1;
                }
                if inner.failures >= self.config.max_attempts {
                    self.trip(&mut inner, now);
                }
            }
            // A call admitted before the circuit opened finished late.
            CircuitState::Open => {}
        }
    }

    /// Non-counting outcome. Frees a half-open trial slot.
    pub fn record_ignored_at(&self, _now: Instant) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_started = None;
        }
    }

    fn trip(&self, inner: &mut Inner, now: Instant) {
        tracing::warn!(
            failures = inner.failures,
            reset_after_ms = self.config.reset_timeout.as_millis() as u64,
            "Circuit opened"
        );
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.failures = 0;
        inner.window_started = None;
        inner.trial_started = None;
    }
}

/// Guards the inner checker with a [`CircuitBreaker`].
pub struct CircuitBreakingFraudChecker<F> {
    inner: F,
    breaker: CircuitBreaker,
    fallback: SmallChargeFallback,
}

impl<F: FraudChecker> CircuitBreakingFraudChecker<F> {
    pub fn new(inner: F, config: CircuitBreakerConfig, fallback: SmallChargeFallback) -> Self {
        Self {
            inner,
            breaker: CircuitBreaker::new(config),
            fallback,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

#[async_trait]
impl<F: FraudChecker> FraudChecker for CircuitBreakingFraudChecker<F> {
    async fn check_fraud(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        if self.breaker.admit_at(Instant::now()) == Admission::Reject {
            tracing::debug!("Circuit open, skipping fraud check");
            return self.fallback(credit_card, amount).await;
        }

        match self.inner.check_fraud(credit_card, amount).await {
            Ok(status) => {
                self.breaker.record_success_at(Instant::now());
                Ok(status)
            }
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Fraud check failed");
                self.breaker.record_failure_at(Instant::now());
                self.fallback(credit_card, amount).await
            }
            Err(e) => {
                self.breaker.record_ignored_at(Instant::now());
                Err(e)
            }
        }
    }

    async fn fallback(
        &self,
        _credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        self.fallback.decide(amount)
    }

    async fn ping(&self) -> Result<String, FraudCheckError> {
        self.inner.ping().await
    }
}
