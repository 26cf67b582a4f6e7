//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;

use payments_types::{RepoError, Transaction, TransactionId, TransactionRepository};

use crate::types::{DbTransaction, TRANSACTION_COLUMNS, map_write_error};

const MIGRATION: &str = include_str!("../migrations/0001_create_transactions.sql");

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// Amounts are stored as TEXT so decimal precision survives the round trip.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every in-memory connection is its own database.
        let max_connections = if in_memory { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        sqlx::query(MIGRATION)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        Ok(())
    }

    async fn insert<'e, E>(executor: E, tx: &Transaction) -> Result<(), RepoError>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO transactions (id, created_at, status, order_id, amount, currency)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.id.to_string())
        .bind(tx.date.to_rfc3339())
        .bind(tx.status.as_str())
        .bind(tx.order_id.clone())
        .bind(tx.value.amount().to_string())
        .bind(tx.value.currency().to_string())
        .execute(executor)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    /// Builds `SELECT ... WHERE <column> IN (?, ?, ...)`.
    fn select_in<'a>(column: &str, values: &'a [String]) -> QueryBuilder<'a, Sqlite> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE {} IN (",
            TRANSACTION_COLUMNS, column
        ));
        let mut separated = qb.separated(", ");
        for value in values {
            separated.push_bind(value.as_str());
        }
        separated.push_unseparated(") ORDER BY created_at");
        qb
    }

    async fn fetch_in(
        &self,
        column: &str,
        values: &[String],
    ) -> Result<Vec<Transaction>, RepoError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = Self::select_in(column, values);
        let rows: Vec<DbTransaction> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }
}

fn id_strings(ids: &[TransactionId]) -> Vec<String> {
    ids.iter().map(TransactionId::to_string).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionRepository for SqliteRepo {
    async fn save(&self, tx: &Transaction) -> Result<Transaction, RepoError> {
        Self::insert(&self.pool, tx).await?;
        tracing::debug!(transaction_id = %tx.id, order_id = %tx.order_id, "Transaction saved");
        Ok(tx.clone())
    }

    async fn save_all(&self, txs: &[Transaction]) -> Result<Vec<Transaction>, RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        for tx in txs {
            Self::insert(&mut *db_tx, tx).await?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(txs.to_vec())
    }

    async fn delete_by_id(&self, id: TransactionId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_by_ids(&self, ids: &[TransactionId]) -> Result<u64, RepoError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let ids = id_strings(ids);
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("DELETE FROM transactions WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in &ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn exists_by_id(&self, id: TransactionId) -> Result<bool, RepoError> {
        let found: Option<i64> = sqlx::query_scalar(r#"SELECT 1 FROM transactions WHERE id = ?"#)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    async fn find_all(&self) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions ORDER BY created_at",
            TRANSACTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn find_all_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<Transaction>, RepoError> {
        self.fetch_in("id", &id_strings(ids)).await
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM transactions"#)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(count as u64)
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE order_id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn find_by_transaction_id_and_order_id(
        &self,
        id: TransactionId,
        order_id: &str,
    ) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = ? AND order_id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id.to_string())
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn find_all_by_order_ids(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<Transaction>, RepoError> {
        self.fetch_in("order_id", order_ids).await
    }
}
