//! HTTP-level tests for the payments API.
//!
//! These tests drive the full router (rate limiting, JSON extraction,
//! error mapping) against an in-memory SQLite repository.
//!
//! This test requires the `sqlite` feature flag.

#![cfg(feature = "sqlite")]

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use payments_hex::outbound::HttpFraudChecker;
use payments_hex::{PaymentService, inbound::HttpServer};
use payments_repo::SqliteRepo;
use payments_types::{CreditCard, FraudCheckError, FraudChecker, FraudStatus, Money};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Fraud checker that answers every check with the same verdict.
struct FixedVerdict(FraudStatus);

impl FixedVerdict {
    fn new(overall: &str) -> Self {
        Self(FraudStatus::new(overall))
    }
}

#[async_trait]
impl FraudChecker for FixedVerdict {
    async fn check_fraud(
        &self,
        _credit_card: &CreditCard,
        _amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        Ok(self.0.clone())
    }

    async fn fallback(
        &self,
        _credit_card: &CreditCard,
        _amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        Err(FraudCheckError::FallbackUnsupported)
    }

    async fn ping(&self) -> Result<String, FraudCheckError> {
        Ok("pong".into())
    }
}

async fn app_with<F: FraudChecker>(checker: F, requests_per_minute: u32) -> Router {
    let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
    let service = PaymentService::new(repo, checker);
    HttpServer::with_rate_limit(service, requests_per_minute).router()
}

async fn app(overall: &str) -> Router {
    app_with(FixedVerdict::new(overall), 100).await
}

fn payment_body(order_id: &str, price: &str) -> Value {
    json!({
        "order": {
            "id": order_id,
            "items": [
                { "id": 1, "name": "Book", "price": { "currency": "INR", "amount": price }, "quantity": 2 },
                { "id": 2, "name": "Pen", "price": { "currency": "INR", "amount": "5.25" }, "quantity": 1 }
            ]
        },
        "creditCard": {
            "number": "4111111111111111",
            "holderName": "Test Holder",
            "issuingBank": "Test Bank",
            "validUntil": "2030-01-31T00:00:00Z",
            "cvv": 123
        }
    })
}

fn pay_request(body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/pay")
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

// ─────────────────────────────────────────────────────────────────────────────
// Ping
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_returns_pong() {
    let app = app("pass").await;

    let response = app.oneshot(get("/ping")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"pong");
}

// ─────────────────────────────────────────────────────────────────────────────
// Pay
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pay_accepted_returns_reference() {
    let app = app("pass").await;

    let response = app
        .oneshot(pay_request(&payment_body("ORDER-1", "10.50")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "accepted");
    assert!(json["id"].as_str().is_some());
    assert!(json["date"].as_str().is_some());
}

#[tokio::test]
async fn test_pay_failed_check_is_rejected() {
    let app = app("fail").await;

    let response = app
        .oneshot(pay_request(&payment_body("ORDER-1", "10.50")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "rejected");
}

#[tokio::test]
async fn test_pay_unknown_verdict_is_bad_gateway_without_body() {
    let app = app("suspicious").await;

    let response = app
        .clone()
        .oneshot(pay_request(&payment_body("ORDER-1", "10.50")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_bytes(response).await.is_empty());

    // Nothing was recorded for the order
    let response = app
        .oneshot(get("/orders/ORDER-1/transaction"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pay_twice_for_same_order_conflicts() {
    let app = app("pass").await;
    let body = payment_body("ORDER-1", "10.50");

    let first = app.clone().oneshot(pay_request(&body)).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(pay_request(&body)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["code"], 409);
}

#[tokio::test]
async fn test_pay_malformed_json_is_bad_request() {
    let app = app("pass").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/pay")
        .header("Content-Type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], 400);
}

#[tokio::test]
async fn test_pay_negative_price_is_bad_request() {
    let app = app("pass").await;

    let response = app
        .oneshot(pay_request(&payment_body("ORDER-1", "-1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pay_overflowing_total_is_bad_request() {
    let app = app("pass").await;

    let response = app
        .oneshot(pay_request(&payment_body(
            "ORDER-1",
            "79228162514264337593543950335",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], 400);
    assert!(json["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_pay_mixed_currencies_is_bad_request() {
    let app = app("pass").await;
    let mut body = payment_body("ORDER-1", "10.50");
    body["order"]["items"][1]["price"]["currency"] = json!("USD");

    let response = app
        .clone()
        .oneshot(pay_request(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Currency mismatch"));

    // Nothing was recorded for the order
    let response = app
        .oneshot(get("/orders/ORDER-1/transaction"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pay_blank_order_id_is_bad_request() {
    let app = app("pass").await;

    let response = app
        .oneshot(pay_request(&payment_body("   ", "1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pay_through_remote_fraud_checker() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/check")
        .match_body(mockito::Matcher::PartialJson(json!({
            "charge": { "currency": "INR", "amount": "26.25" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"overall":"pass"}"#)
        .create_async()
        .await;

    let checker =
        HttpFraudChecker::new(server.url(), Duration::from_secs(1), Duration::from_secs(2))
            .unwrap();
    let app = app_with(checker, 100).await;

    let response = app
        .oneshot(pay_request(&payment_body("ORDER-1", "10.50")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "accepted");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_pay_remote_server_error_is_bad_gateway_with_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/check")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let checker =
        HttpFraudChecker::new(server.url(), Duration::from_secs(1), Duration::from_secs(2))
            .unwrap();
    let app = app_with(checker, 100).await;

    let response = app
        .oneshot(pay_request(&payment_body("ORDER-1", "10.50")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], 502);
}

// ─────────────────────────────────────────────────────────────────────────────
// Transaction lookups
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_recorded_transaction_is_readable_by_id_and_order() {
    let app = app("pass").await;

    let response = app
        .clone()
        .oneshot(pay_request(&payment_body("ORDER-7", "10.50")))
        .await
        .unwrap();
    let reference = body_json(response).await;
    let id = reference["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/transactions/{id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tx = body_json(response).await;
    assert_eq!(tx["orderId"], "ORDER-7");
    assert_eq!(tx["status"], "accepted");
    assert_eq!(tx["value"]["currency"], "INR");
    assert_eq!(tx["value"]["amount"], "26.25");

    let response = app
        .oneshot(get("/orders/ORDER-7/transaction"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], id.as_str());
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let app = app("pass").await;

    let response = app
        .oneshot(get("/transactions/00000000-0000-0000-0000-000000000001"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_transaction_id_is_bad_request() {
    let app = app("pass").await;

    let response = app.oneshot(get("/transactions/not-a-uuid")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limiting
// ─────────────────────────────────────────────────────────────────────────────

fn client_request(uri: &str, client_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Client-Id", client_id)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limiting_returns_429_when_exceeded() {
    let app = app_with(FixedVerdict::new("pass"), 3).await;

    for i in 1..=3 {
        let response = app
            .clone()
            .oneshot(client_request("/orders/none/transaction", "client-a"))
            .await
            .unwrap();
        assert_ne!(
            response.status(),
            StatusCode::TOO_MANY_REQUESTS,
            "Request {} should not be rate limited",
            i
        );
    }

    let response = app
        .clone()
        .oneshot(client_request("/orders/none/transaction", "client-a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], 429);
    assert!(json["error"].as_str().unwrap().contains("Rate limit"));

    // Another client has its own quota
    let response = app
        .oneshot(client_request("/orders/none/transaction", "client-b"))
        .await
        .unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_ping_is_never_rate_limited() {
    let app = app_with(FixedVerdict::new("pass"), 1).await;

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(client_request("/ping", "client-a"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAPI
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app("pass").await;

    let response = app.oneshot(get("/api-docs/openapi.json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/pay"]["post"].is_object());
    assert!(json["components"]["schemas"]["PaymentRequest"].is_object());
}
