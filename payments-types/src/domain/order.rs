//! Order aggregate.

use serde::Serialize;

use super::item::Item;
use super::money::Money;
use crate::error::DomainError;

/// A customer order. The total amount is computed once, at construction.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    id: String,
    items: Vec<Item>,
    amount: Money,
}

impl Order {
    /// Builds an order and sums its item totals.
    ///
    /// Fails with `CurrencyMismatch` when items are priced in different
    /// currencies, or `AmountOverflow` when the total does not fit. An empty
    /// order is worth [`Money::ZERO`].
    pub fn new(id: impl Into<String>, items: Vec<Item>) -> Result<Self, DomainError> {
        let amount = items
            .iter()
            .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.total_price()?))?;

        Ok(Self {
            id: id.into(),
            items,
            amount,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn total_items(&self) -> usize {
        self.items.len()
    }
}
