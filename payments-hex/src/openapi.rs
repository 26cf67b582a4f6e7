//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use payments_types::domain::{
    CreditCard, Currency, Item, Money, Transaction, TransactionId, TransactionReference,
    TransactionStatus,
};
use payments_types::dto::{ErrorResponse, OrderRequest, PaymentRequest};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Liveness check
#[utoipa::path(
    get,
    path = "/ping",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = String, example = "pong")
    )
)]
async fn ping() {}

/// Pay for an order
#[utoipa::path(
    post,
    path = "/pay",
    tag = "payments",
    request_body = PaymentRequest,
    params(
        ("X-Client-Id" = Option<String>, Header, description = "Client identifier used for rate limiting")
    ),
    responses(
        (status = 200, description = "Fraud check decided, transaction recorded", body = TransactionReference),
        (status = 400, description = "Invalid order or card", body = ErrorResponse),
        (status = 409, description = "Order already paid", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "No fraud decision reached (empty body), or fraud checker failed (error body)", body = ErrorResponse)
    )
)]
async fn pay() {}

/// Get a transaction by ID
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = TransactionId, Path, description = "Transaction ID (UUID)")
    ),
    responses(
        (status = 200, description = "Transaction details", body = Transaction),
        (status = 400, description = "Malformed transaction ID", body = ErrorResponse),
        (status = 404, description = "Transaction not found", body = ErrorResponse)
    )
)]
async fn get_transaction() {}

/// Get the transaction recorded for an order
#[utoipa::path(
    get,
    path = "/orders/{order_id}/transaction",
    tag = "transactions",
    params(
        ("order_id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Transaction details", body = Transaction),
        (status = 404, description = "No transaction for this order", body = ErrorResponse)
    )
)]
async fn get_order_transaction() {}

/// OpenAPI documentation for the Payments API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payments Service API",
        version = "1.0.0",
        description = "Accepts an order and a credit card, asks a remote fraud checker for a verdict and records the resulting transaction.\n\nRequests are rate limited per `X-Client-Id` header value.",
        license(name = "MIT"),
    ),
    paths(ping, pay, get_transaction, get_order_transaction),
    components(
        schemas(
            PaymentRequest,
            OrderRequest,
            Item,
            Money,
            Currency,
            CreditCard,
            Transaction,
            TransactionId,
            TransactionReference,
            TransactionStatus,
            ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "payments", description = "Order payment"),
        (name = "transactions", description = "Recorded transactions"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_all_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in ["/ping", "/pay", "/transactions/{id}", "/orders/{order_id}/transaction"] {
            assert!(paths.iter().any(|p| p.as_str() == expected), "missing {expected}");
        }
    }
}
