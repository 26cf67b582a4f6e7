//! Transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::money::Money;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "123e4567-e89b-12d3-a456-426614174000")]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Outcome recorded for a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Fraud check passed
    Accepted,
    /// Fraud check failed
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Accepted => "accepted",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(TransactionStatus::Accepted),
            "rejected" => Ok(TransactionStatus::Rejected),
            _ => Err(format!("Unknown transaction status: {}", s)),
        }
    }
}

/// A recorded payment attempt.
///
/// Transactions are immutable once created - they represent
/// a historical record of what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// When the transaction was created
    #[schema(value_type = String, example = "2024-01-01T00:00:00Z")]
    pub date: DateTime<Utc>,
    /// Fraud decision the transaction was recorded with
    pub status: TransactionStatus,
    /// Business key of the paid order
    #[schema(example = "TEST-ORDER-ID")]
    pub order_id: String,
    /// Amount charged
    pub value: Money,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        date: DateTime<Utc>,
        status: TransactionStatus,
        order_id: impl Into<String>,
        value: Money,
    ) -> Self {
        Self {
            id,
            date,
            status,
            order_id: order_id.into(),
            value,
        }
    }

    /// The lightweight projection returned to callers.
    pub fn reference(&self) -> TransactionReference {
        TransactionReference {
            id: self.id,
            date: self.date,
            status: self.status,
        }
    }
}

/// External-facing handle for a transaction. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionReference {
    pub id: TransactionId,
    #[schema(value_type = String, example = "2024-01-01T00:00:00Z")]
    pub date: DateTime<Utc>,
    pub status: TransactionStatus,
}
