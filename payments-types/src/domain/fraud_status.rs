//! Verdict returned by the remote fraud checker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::Money;
use super::transaction::{Transaction, TransactionId, TransactionStatus};

/// Fraud check result.
///
/// Only `overall` drives the payment decision. `cvv_status` and `av_status`
/// are informational sub-verdicts some checkers include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FraudStatus {
    #[schema(example = "pass")]
    pub overall: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub av_status: Option<String>,
}

impl FraudStatus {
    pub const PASS: &'static str = "pass";
    pub const FAIL: &'static str = "fail";
    pub const UNVERIFIED: &'static str = "unverified";

    /// No decision. Never produces a transaction.
    pub const EMPTY: FraudStatus = FraudStatus {
        overall: String::new(),
        cvv_status: None,
        av_status: None,
    };

    pub fn new(overall: impl Into<String>) -> Self {
        Self {
            overall: overall.into(),
            cvv_status: None,
            av_status: None,
        }
    }

    /// Synthetic verdict used when the checker could not be reached. It is
    /// not one of the recognised decisions, so it records no transaction.
    pub fn unverified() -> Self {
        Self::new(Self::UNVERIFIED)
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_empty()
    }

    /// The transaction status this verdict maps to, if any.
    pub fn transaction_status(&self) -> Option<TransactionStatus> {
        match self.overall.as_str() {
            Self::PASS => Some(TransactionStatus::Accepted),
            Self::FAIL => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }

    /// Builds the transaction for this verdict, or `None` when the verdict
    /// reached no decision (empty, "unverified", "suspicious", anything
    /// unrecognised).
    pub fn make_transaction(
        &self,
        id: TransactionId,
        date: DateTime<Utc>,
        order_id: &str,
        value: Money,
    ) -> Option<Transaction> {
        self.transaction_status()
            .map(|status| Transaction::new(id, date, status, order_id, value))
    }
}

impl std::fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "<<FraudStatus.EMPTY>>")
        } else {
            write!(f, "FraudStatus{{overall='{}'}}", self.overall)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;

    fn value() -> Money {
        Money::new("100.253".parse().unwrap(), Currency::INR).unwrap()
    }

    #[test]
    fn test_pass_creates_accepted_transaction() {
        let id = TransactionId::new();
        let date = Utc::now();

        let tx = FraudStatus::new("pass")
            .make_transaction(id, date, "TEST-ORDER-ID", value())
            .unwrap();

        assert_eq!(
            tx,
            Transaction::new(id, date, TransactionStatus::Accepted, "TEST-ORDER-ID", value())
        );
    }

    #[test]
    fn test_fail_creates_rejected_transaction() {
        let tx = FraudStatus::new("fail")
            .make_transaction(TransactionId::new(), Utc::now(), "TEST-ORDER-ID", value())
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Rejected);
    }

    #[test]
    fn test_unverified_creates_no_transaction() {
        let tx = FraudStatus::unverified().make_transaction(
            TransactionId::new(),
            Utc::now(),
            "TEST-ORDER-ID",
            value(),
        );

        assert!(tx.is_none());
        assert_eq!(FraudStatus::unverified().transaction_status(), None);
    }

    #[test]
    fn test_suspicious_creates_no_transaction() {
        let tx = FraudStatus::new("suspicious").make_transaction(
            TransactionId::new(),
            Utc::now(),
            "TEST-ORDER-ID",
            value(),
        );

        assert!(tx.is_none());
    }

    #[test]
    fn test_empty_creates_no_transaction() {
        let tx = FraudStatus::EMPTY.make_transaction(
            TransactionId::new(),
            Utc::now(),
            "TEST-ORDER-ID",
            value(),
        );

        assert!(tx.is_none());
        assert_eq!(FraudStatus::EMPTY.to_string(), "<<FraudStatus.EMPTY>>");
    }

    #[test]
    fn test_deserializes_remote_response() {
        let body = r#"{"cvvStatus": "pass", "avStatus": "incorrect address", "overall": "suspicious"}"#;

        let status: FraudStatus = serde_json::from_str(body).unwrap();

        assert_eq!(status.overall, "suspicious");
        assert_eq!(status.av_status.as_deref(), Some("incorrect address"));
    }
}
