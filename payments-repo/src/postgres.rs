//! PostgreSQL repository adapter.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use payments_types::{RepoError, Transaction, TransactionId, TransactionRepository};

use crate::types::{DbTransaction, TRANSACTION_COLUMNS, map_write_error};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository. Amounts are stored as NUMERIC.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_transactions_pg.sql"),
        "0001",
    )
    .await
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        run_migrations(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))
    }

    async fn insert<'e, E>(executor: E, tx: &Transaction) -> Result<(), RepoError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"INSERT INTO transactions (id, created_at, status, order_id, amount, currency)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(tx.id.into_uuid())
        .bind(tx.date)
        .bind(tx.status.as_str())
        .bind(tx.order_id.clone())
        .bind(tx.value.amount())
        .bind(tx.value.currency().to_string())
        .execute(executor)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }
}

fn uuids(ids: &[TransactionId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransactionRepository for PostgresRepo {
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
        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = $1"#)
            .bind(id.into_uuid())
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

        let result = sqlx::query(r#"DELETE FROM transactions WHERE id = ANY($1)"#)
            .bind(uuids(ids))
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, RepoError> {
        let row: Option<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        ))
        .bind(id.into_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbTransaction::into_domain).transpose()
    }

    async fn exists_by_id(&self, id: TransactionId) -> Result<bool, RepoError> {
        let exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1)"#)
                .bind(id.into_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(exists)
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
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE id = ANY($1) ORDER BY created_at",
            TRANSACTION_COLUMNS
        ))
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
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
            "SELECT {} FROM transactions WHERE order_id = $1",
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
            "SELECT {} FROM transactions WHERE id = $1 AND order_id = $2",
            TRANSACTION_COLUMNS
        ))
        .bind(id.into_uuid())
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
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {} FROM transactions WHERE order_id = ANY($1) ORDER BY created_at",
            TRANSACTION_COLUMNS
        ))
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }
}
