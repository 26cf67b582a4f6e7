//! Outbound adapters: the remote fraud checker and its resiliency policies.

mod circuit_breaker;
mod fallback;
mod http;
mod retry;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use payments_types::{CreditCard, FraudCheckError, FraudChecker, FraudStatus, Money};

pub use circuit_breaker::{
    Admission, CircuitBreaker, CircuitBreakerConfig, CircuitBreakingFraudChecker, CircuitState,
};
pub use fallback::SmallChargeFallback;
pub use http::HttpFraudChecker;
pub use retry::{RetryPolicy, RetryingFraudChecker};

// ─────────────────────────────────────────────────────────────────────────────
// Strategy selection
// ─────────────────────────────────────────────────────────────────────────────

/// Latency-control policy wrapped around the remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResiliencyStrategy {
    #[default]
    None,
    Retry,
    CircuitBreaker,
}

impl std::str::FromStr for ResiliencyStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "" | "none" => Ok(ResiliencyStrategy::None),
            "retry" => Ok(ResiliencyStrategy::Retry),
            "circuit_breaker" | "circuitbreaker" => Ok(ResiliencyStrategy::CircuitBreaker),
            other => Err(format!("Unknown resiliency strategy: {}", other)),
        }
    }
}

impl std::fmt::Display for ResiliencyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResiliencyStrategy::None => "none",
            ResiliencyStrategy::Retry => "retry",
            ResiliencyStrategy::CircuitBreaker => "circuit_breaker",
        };
        f.write_str(name)
    }
}

/// Everything needed to build a [`FraudCheckerClient`].
#[derive(Debug, Clone)]
pub struct FraudCheckerSettings {
    /// `{host}:{port}` of the remote service.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub strategy: ResiliencyStrategy,
    pub retry: RetryPolicy,
    pub circuit_breaker: CircuitBreakerConfig,
    pub fallback_threshold: Decimal,
}

impl Default for FraudCheckerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_millis(1000),
            read_timeout: Duration::from_millis(2000),
            strategy: ResiliencyStrategy::None,
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            fallback_threshold: Decimal::from(1000),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// The fraud checker variant chosen at startup.
pub enum FraudCheckerClient {
    Default(HttpFraudChecker),
    Retry(RetryingFraudChecker<HttpFraudChecker>),
    CircuitBreaker(CircuitBreakingFraudChecker<HttpFraudChecker>),
}

impl FraudCheckerClient {
    pub fn from_settings(settings: &FraudCheckerSettings) -> anyhow::Result<Self> {
        let http = HttpFraudChecker::new(
            settings.base_url.clone(),
            settings.connect_timeout,
            settings.read_timeout,
        )?;
        let fallback = SmallChargeFallback::new(settings.fallback_threshold);

        let client = match settings.strategy {
            ResiliencyStrategy::None => FraudCheckerClient::Default(http),
            ResiliencyStrategy::Retry => {
                FraudCheckerClient::Retry(RetryingFraudChecker::new(http, settings.retry, fallback))
            }
            ResiliencyStrategy::CircuitBreaker => FraudCheckerClient::CircuitBreaker(
                CircuitBreakingFraudChecker::new(http, settings.circuit_breaker, fallback),
            ),
        };
        Ok(client)
    }

    pub fn strategy(&self) -> ResiliencyStrategy {
        match self {
            FraudCheckerClient::Default(_) => ResiliencyStrategy::None,
            FraudCheckerClient::Retry(_) => ResiliencyStrategy::Retry,
            FraudCheckerClient::CircuitBreaker(_) => ResiliencyStrategy::CircuitBreaker,
        }
    }
}

#[async_trait]
impl FraudChecker for FraudCheckerClient {
    async fn check_fraud(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        match self {
            FraudCheckerClient::Default(c) => c.check_fraud(credit_card, amount).await,
            FraudCheckerClient::Retry(c) => c.check_fraud(credit_card, amount).await,
            FraudCheckerClient::CircuitBreaker(c) => c.check_fraud(credit_card, amount).await,
        }
    }

    async fn fallback(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        match self {
            FraudCheckerClient::Default(c) => c.fallback(credit_card, amount).await,
            FraudCheckerClient::Retry(c) => c.fallback(credit_card, amount).await,
            FraudCheckerClient::CircuitBreaker(c) => c.fallback(credit_card, amount).await,
        }
    }

    async fn ping(&self) -> Result<String, FraudCheckError> {
        match self {
            FraudCheckerClient::Default(c) => c.ping().await,
            FraudCheckerClient::Retry(c) => c.ping().await,
            FraudCheckerClient::CircuitBreaker(c) => c.ping().await,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test support
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use payments_types::Currency;

    use super::*;

    type Outcome = Result<FraudStatus, FraudCheckError>;

    /// Replays scripted outcomes, then repeats `otherwise` forever.
    pub struct ScriptedFraudChecker {
        script: Mutex<VecDeque<Outcome>>,
        otherwise: Box<dyn Fn() -> Outcome + Send + Sync>,
        calls: AtomicUsize,
    }

    impl ScriptedFraudChecker {
        pub fn new(script: Vec<Outcome>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                otherwise: Box::new(|| Ok(FraudStatus::new("pass"))),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn always(error: impl Fn() -> FraudCheckError + Send + Sync + 'static) -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                otherwise: Box::new(move || Err(error())),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FraudChecker for ScriptedFraudChecker {
        async fn check_fraud(&self, _card: &CreditCard, _amount: Money) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| (self.otherwise)())
        }

        async fn fallback(&self, _card: &CreditCard, _amount: Money) -> Outcome {
            Err(FraudCheckError::FallbackUnsupported)
        }

        async fn ping(&self) -> Result<String, FraudCheckError> {
            Ok("pong".to_string())
        }
    }

    pub fn timeout() -> FraudCheckError {
        FraudCheckError::Timeout("read timed out".into())
    }

    pub fn inr(amount: &str) -> Money {
        Money::new(amount.parse().unwrap(), Currency::INR).unwrap()
    }

    pub fn card() -> CreditCard {
        CreditCard {
            number: "4485-2847-2013-4093".to_string(),
            holder_name: "Jumping Jack".to_string(),
            issuing_bank: "Bank of Test".to_string(),
            valid_until: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            cvv: 456,
        }
    }
}
