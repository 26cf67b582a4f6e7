//! Line item of an order.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::money::Money;
use crate::error::DomainError;

/// A purchased product with its unit price and quantity.
///
/// Items are identified by `id` alone: two items with the same id are
/// equal even if name, price or quantity differ.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Item {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Dant Kanti Toothpaste")]
    pub name: String,
    pub price: Money,
    #[schema(example = 10)]
    pub quantity: u32,
}

impl Item {
    pub fn new(id: u64, name: impl Into<String>, price: Money, quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity,
        }
    }

    /// Unit price multiplied by quantity. Fails with `AmountOverflow` when
    /// the product does not fit a decimal.
    pub fn total_price(&self) -> Result<Money, DomainError> {
        self.price.times(self.quantity)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Item {}

impl std::hash::Hash for Item {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
