//! Payment Application Service
//!
//! Orchestrates the fraud check and persistence through the ports.
//! Contains NO infrastructure logic - pure business orchestration.

use chrono::Utc;

use payments_types::{
    AppError, CreditCard, FraudChecker, IdGenerator, Order, Transaction, TransactionId,
    TransactionReference, TransactionRepository, UuidGenerator,
};

/// Application service for payment operations.
///
/// Generic over `R: TransactionRepository` and `F: FraudChecker` - the adapters
/// are injected at compile time. This enables:
/// - Swapping repositories or resiliency strategies without code changes
/// - Testing with in-memory repo and scripted fraud checkers
/// - Compile-time checks for port implementation
pub struct PaymentService<R: TransactionRepository, F: FraudChecker> {
    repo: R,
    fraud_checker: F,
    ids: Box<dyn IdGenerator>,
}

impl<R: TransactionRepository, F: FraudChecker> PaymentService<R, F> {
    /// Creates a new payment service. Transaction ids are random UUIDs.
    pub fn new(repo: R, fraud_checker: F) -> Self {
        Self {
            repo,
            fraud_checker,
            ids: Box::new(UuidGenerator),
        }
    }

    /// Replaces the transaction id source.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn fraud_checker(&self) -> &F {
        &self.fraud_checker
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    /// Checks the order total with the fraud checker and records the outcome.
    ///
    /// Returns `None` when the verdict reached no decision. Nothing is
    /// persisted in that case.
    #[tracing::instrument(skip(self, order, credit_card), fields(order_id = %order.id(), amount = %order.amount()))]
    pub async fn make_payment(
        &self,
        order: &Order,
        credit_card: &CreditCard,
    ) -> Result<Option<TransactionReference>, AppError> {
        let amount = order.amount();
        let status = self.fraud_checker.check_fraud(credit_card, amount).await?;

        let Some(tx) =
            status.make_transaction(self.ids.next_id(), Utc::now(), order.id(), amount)
        else {
            tracing::warn!(verdict = %status, "No fraud decision, transaction not recorded");
            return Ok(None);
        };

        let saved = self.repo.save(&tx).await?;
        tracing::info!(transaction_id = %saved.id, status = %saved.status, "Payment recorded");
        Ok(Some(saved.reference()))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Transaction History
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, AppError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Transaction {}", id))))
    }

    /// Gets the transaction recorded for an order.
    pub async fn find_by_order_id(&self, order_id: &str) -> Result<Transaction, AppError> {
        self.repo
            .find_by_order_id(order_id)
            .await
            .map_err(Into::into)
            .and_then(|opt| {
                opt.ok_or_else(|| AppError::NotFound(format!("Transaction for order {}", order_id)))
            })
    }

    /// Gets the transactions recorded for any of the given orders.
    pub async fn find_by_order_ids(&self, order_ids: &[String]) -> Result<Vec<Transaction>, AppError> {
        self.repo
            .find_all_by_order_ids(order_ids)
            .await
            .map_err(Into::into)
    }
}
