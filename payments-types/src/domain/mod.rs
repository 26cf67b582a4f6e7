//! Domain models for the payment service.

pub mod credit_card;
pub mod fraud_status;
pub mod item;
pub mod money;
pub mod order;
pub mod transaction;

pub use credit_card::CreditCard;
pub use fraud_status::FraudStatus;
pub use item::Item;
pub use money::{Currency, Money};
pub use order::Order;
pub use transaction::{Transaction, TransactionId, TransactionReference, TransactionStatus};
