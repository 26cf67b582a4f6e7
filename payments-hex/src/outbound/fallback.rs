//! Small-charge recovery rule shared by the resilient fraud checkers.

use rust_decimal::Decimal;

use payments_types::{FraudCheckError, FraudStatus, Money};

/// Verdict used when the remote check could not be completed: charges
/// below `threshold` are marked unverified, larger ones get no verdict at
/// all. Neither maps to a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmallChargeFallback {
    threshold: Decimal,
}

impl Default for SmallChargeFallback {
    fn default() -> Self {
        Self::new(Decimal::from(1000))
    }
}

impl SmallChargeFallback {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// The threshold is read in the charge's own currency.
    pub fn decide(&self, amount: Money) -> Result<FraudStatus, FraudCheckError> {
        let limit = Money::new(self.threshold, amount.currency())?;

        if amount.checked_lt(&limit)? {
            tracing::info!(%amount, "Fraud check unavailable, small charge marked unverified");
            Ok(FraudStatus::unverified())
        } else {
            tracing::warn!(%amount, "Fraud check unavailable, no verdict for large charge");
            Ok(FraudStatus::EMPTY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use payments_types::Currency;

    fn inr(amount: &str) -> Money {
        Money::new(amount.parse().unwrap(), Currency::INR).unwrap()
    }

    #[test]
    fn test_small_charge_is_unverified() {
        let status = SmallChargeFallback::default().decide(inr("999.99")).unwrap();
        assert_eq!(status, FraudStatus::unverified());
    }

    #[test]
    fn test_charge_at_threshold_gets_no_decision() {
        let status = SmallChargeFallback::default().decide(inr("1000")).unwrap();
        assert_eq!(status, FraudStatus::EMPTY);
    }

    #[test]
    fn test_large_charge_gets_no_decision() {
        let status = SmallChargeFallback::default().decide(inr("1235.45")).unwrap();
        assert!(status.is_empty());
    }

    #[test]
    fn test_threshold_follows_charge_currency() {
        let fallback = SmallChargeFallback::new(Decimal::from(50));
        let usd = Money::new(Decimal::from(49), Currency::USD).unwrap();

        assert_eq!(fallback.decide(usd).unwrap(), FraudStatus::unverified());
        assert_eq!(fallback.decide(inr("50")).unwrap(), FraudStatus::EMPTY);
    }

    #[test]
    fn test_empty_order_is_unverified() {
        let status = SmallChargeFallback::default().decide(Money::ZERO).unwrap();
        assert_eq!(status, FraudStatus::unverified());
    }
}
