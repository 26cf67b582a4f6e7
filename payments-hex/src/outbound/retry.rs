//! Retry decorator with uniform random backoff.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use payments_types::{CreditCard, FraudCheckError, FraudChecker, FraudStatus, Money};

use super::fallback::SmallChargeFallback;

/// How many times to call, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100), Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call. Zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            max_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait before the next attempt: `delay` when it is not below
    /// `max_delay`, otherwise uniform in `[delay, max_delay)`.
    pub fn backoff(&self) -> Duration {
        if self.delay >= self.max_delay {
            self.delay
        } else {
            rand::rng().random_range(self.delay..self.max_delay)
        }
    }
}

/// Retries transient failures of the inner checker, then falls back.
pub struct RetryingFraudChecker<F> {
    inner: F,
    policy: RetryPolicy,
    fallback: SmallChargeFallback,
}

impl<F: FraudChecker> RetryingFraudChecker<F> {
    pub fn new(inner: F, policy: RetryPolicy, fallback: SmallChargeFallback) -> Self {
        Self {
            inner,
            policy,
            fallback,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<F: FraudChecker> FraudChecker for RetryingFraudChecker<F> {
    async fn check_fraud(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        let mut attempt = 1;
        loop {
            match self.inner.check_fraud(credit_card, amount).await {
                Ok(status) => return Ok(status),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff();
                    tracing::warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "Fraud check failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(attempt, error = %e, "Fraud check retries exhausted");
                    return self.fallback(credit_card, amount).await;
                }
                Err(e) => return Err(e),
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
