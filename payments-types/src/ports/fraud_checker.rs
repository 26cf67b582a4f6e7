//! Fraud checker port.
//!
//! Implementations call a remote fraud-checking service. Resiliency
//! policies (retry, circuit breaker) are layered on top as decorators
//! implementing the same trait.

use crate::domain::{CreditCard, FraudStatus, Money};
use crate::error::DomainError;

/// Error type for fraud check operations.
#[derive(Debug, thiserror::Error)]
pub enum FraudCheckError {
    #[error("Fraud checker timed out: {0}")]
    Timeout(String),

    #[error("Fraud checker unreachable: {0}")]
    Connect(String),

    #[error("Fraud checker returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Invalid fraud checker response: {0}")]
    InvalidResponse(String),

    #[error("Fallback is not supported by this fraud checker")]
    FallbackUnsupported,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl FraudCheckError {
    /// Whether the failure is worth retrying or counting against a circuit.
    pub fn is_transient(&self) -> bool {
        matches!(self, FraudCheckError::Timeout(_) | FraudCheckError::Connect(_))
    }
}

/// Port trait for fraud checkers.
#[async_trait::async_trait]
pub trait FraudChecker: Send + Sync + 'static {
    /// Asks for a verdict on charging `amount` to `credit_card`.
    async fn check_fraud(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError>;

    /// Verdict to use when the remote check could not be completed.
    async fn fallback(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError>;

    /// Liveness probe of the remote service.
    async fn ping(&self) -> Result<String, FraudCheckError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeouts_and_connect_failures_are_transient() {
        assert!(FraudCheckError::Timeout("read".into()).is_transient());
        assert!(FraudCheckError::Connect("refused".into()).is_transient());
        assert!(
            !FraudCheckError::Server {
                status: 500,
                body: String::new()
            }
            .is_transient()
        );
        assert!(!FraudCheckError::InvalidResponse("garbage".into()).is_transient());
        assert!(!FraudCheckError::FallbackUnsupported.is_transient());
    }
}
