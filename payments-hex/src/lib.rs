//! # Payments Hex
//!
//! Application service layer and adapters for the payments service.
//!
//! ## Architecture
//!
//! - `service/` - Application service (orchestrates domain operations)
//! - `inbound/` - HTTP adapter (Axum server)
//! - `outbound/` - Fraud checker client and its resiliency policies
//!
//! The service is generic over `R: TransactionRepository` and
//! `F: FraudChecker`, allowing different adapters to be injected.

pub mod inbound;
pub mod openapi;
pub mod outbound;
pub mod service;


pub use outbound::{FraudCheckerClient, FraudCheckerSettings, ResiliencyStrategy};
pub use service::PaymentService;
