//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use rust_decimal::Decimal;
use sqlx::FromRow;

use payments_types::{Money, RepoError, Transaction, TransactionId, TransactionStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

pub const TRANSACTION_COLUMNS: &str = "id, created_at, status, order_id, amount, currency";

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Transaction row from database.
#[derive(FromRow)]
pub struct DbTransaction {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    pub status: String,
    pub order_id: String,

    #[cfg(not(feature = "sqlite"))]
    pub amount: Decimal,
    #[cfg(feature = "sqlite")]
    pub amount: String,

    pub currency: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

fn corrupt(e: impl std::fmt::Display) -> RepoError {
    RepoError::Database(e.to_string())
}

pub fn parse_status(s: &str) -> Result<TransactionStatus, RepoError> {
    s.parse().map_err(corrupt)
}

/// Maps a sqlx error, turning unique-key violations into `Conflict`.
pub fn map_write_error(e: sqlx::Error) -> RepoError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => RepoError::Conflict(db.message().to_string()),
        _ => RepoError::Database(e.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion (feature-gated implementations)
// ─────────────────────────────────────────────────────────────────────────────

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let status = parse_status(&self.status)?;
        let currency = self.currency.parse().map_err(corrupt)?;

        #[cfg(not(feature = "sqlite"))]
        let (id, date, amount) = (TransactionId::from_uuid(self.id), self.created_at, self.amount);

        #[cfg(feature = "sqlite")]
        let (id, date, amount) = {
            let uuid = uuid::Uuid::parse_str(&self.id).map_err(corrupt)?;
            let dt = chrono::DateTime::parse_from_rfc3339(&self.created_at)
                .map_err(corrupt)?
                .with_timezone(&chrono::Utc);
            let amount: Decimal = self.amount.parse().map_err(corrupt)?;
            (TransactionId::from_uuid(uuid), dt, amount)
        };

        let value = Money::new(amount, currency)?;

        Ok(Transaction::new(id, date, status, self.order_id, value))
    }
}
