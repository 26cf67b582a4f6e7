//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CreditCard, Item, Money, Order};
use crate::error::DomainError;

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Order as sent by the caller. The total is computed server-side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderRequest {
    #[schema(example = "TEST-ORDER-ID")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl From<&Order> for OrderRequest {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().to_string(),
            items: order.items().to_vec(),
        }
    }
}

/// Request to pay for an order with a credit card.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order: OrderRequest,
    pub credit_card: CreditCard,
}

impl PaymentRequest {
    /// Validates the order and splits the request into domain values.
    pub fn into_parts(self) -> Result<(Order, CreditCard), DomainError> {
        if self.order.id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "order id must not be empty".into(),
            ));
        }
        let order = Order::new(self.order.id, self.order.items)?;
        Ok((order, self.credit_card))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fraud checker wire DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /check` on the remote fraud checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheckRequest {
    pub credit_card: CreditCard,
    pub charge: Money,
}

/// Error body returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Not found: Transaction not found")]
    pub error: String,
    #[schema(example = 404)]
    pub code: u16,
}
