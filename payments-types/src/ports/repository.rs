//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, InMemory) will implement this trait.

use crate::domain::{Transaction, TransactionId};
use crate::error::RepoError;

/// Persistence for transaction records.
///
/// Both the transaction id and the order id are unique. Saving a record
/// that collides on either returns [`RepoError::Conflict`].
#[async_trait::async_trait]
pub trait TransactionRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError>;

    /// Saves all records atomically.
    async fn save_all(&self, txs: &[Transaction]) -> Result<Vec<Transaction>, RepoError>;

    /// Fails with [`RepoError::NotFound`] when no record has this id.
    async fn delete_by_id(&self, id: TransactionId) -> Result<(), RepoError>;

    /// Deletes whichever of the ids exist. Returns how many rows went.
    async fn delete_all_by_ids(&self, ids: &[TransactionId]) -> Result<u64, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Lookups by id
    // ─────────────────────────────────────────────────────────────────────────────

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError>;

    async fn exists_by_id(&self, id: TransactionId) -> Result<bool, RepoError>;

    async fn find_all(&self) -> Result<Vec<Transaction>, RepoError>;

    async fn find_all_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<Transaction>, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Lookups by order
    // ─────────────────────────────────────────────────────────────────────────────

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, RepoError>;

    async fn find_by_transaction_id_and_order_id(
        &self,
        id: TransactionId,
        order_id: &str,
    ) -> Result<Option<Transaction>, RepoError>;

    async fn find_all_by_order_ids(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<Transaction>, RepoError>;
}
