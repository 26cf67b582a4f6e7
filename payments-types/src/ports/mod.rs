//! Port traits (interfaces for adapters).
//!
//! These are the contracts that adapters must implement.
//! The application layer depends on these traits, not concrete implementations.

mod fraud_checker;
mod id_generator;
mod repository;

pub use fraud_checker::{FraudCheckError, FraudChecker};
pub use id_generator::{IdGenerator, UuidGenerator};
pub use repository::TransactionRepository;
