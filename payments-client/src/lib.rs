//! # Payments Client SDK
//!
//! A typed Rust client for the Payments API.

use payments_types::{
    CreditCard, Order, OrderRequest, PaymentRequest, Transaction, TransactionId,
    TransactionReference,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Payments API client.
pub struct PaymentsClient {
    base_url: String,
    client_id: Option<String>,
    http: Client,
}

impl PaymentsClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: None,
            http: Client::new(),
        }
    }

    /// Sets the `X-Client-Id` sent with every request. The server rate
    /// limits per client id.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Calls `/ping` and returns the reply.
    pub async fn ping(&self) -> Result<String, ClientError> {
        let resp = self.request(reqwest::Method::GET, "/ping").send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }

    /// Pays for an order.
    ///
    /// Returns `None` when the service reached no fraud decision, which it
    /// reports as a `502` without a body.
    pub async fn pay(
        &self,
        order: &Order,
        credit_card: &CreditCard,
    ) -> Result<Option<TransactionReference>, ClientError> {
        let req = PaymentRequest {
            order: OrderRequest::from(order),
            credit_card: credit_card.clone(),
        };
        self.pay_request(&req).await
    }

    /// Sends an already-built payment request.
    pub async fn pay_request(
        &self,
        req: &PaymentRequest,
    ) -> Result<Option<TransactionReference>, ClientError> {
        let resp = self
            .request(reqwest::Method::POST, "/pay")
            .json(req)
            .send()
            .await?;

        if resp.status() == StatusCode::BAD_GATEWAY {
            let body = resp.text().await?;
            if body.trim().is_empty() {
                return Ok(None);
            }
            return Err(api_error(StatusCode::BAD_GATEWAY, body));
        }

        self.handle_response(resp).await.map(Some)
    }

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Transaction, ClientError> {
        self.get(&format!("/transactions/{}", id)).await
    }

    /// Gets the transaction recorded for an order.
    pub async fn transaction_for_order(&self, order_id: &str) -> Result<Transaction, ClientError> {
        self.get(&format!("/orders/{}/transaction", order_id)).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(id) = &self.client_id {
            req = req.header("X-Client-Id", id);
        }
        req
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.request(reqwest::Method::GET, path).send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(api_error(status, body))
        }
    }
}

fn api_error(status: StatusCode, body: String) -> ClientError {
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or(body);
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;
    use payments_types::{Currency, Item, Money, TransactionStatus};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn order() -> Order {
        let price = Money::new(Decimal::new(1050, 2), Currency::INR).unwrap();
        Order::new(
            "ORDER-1",
            vec![Item {
                id: 1,
                name: "Book".into(),
                price,
                quantity: 2,
            }],
        )
        .unwrap()
    }

    fn card() -> CreditCard {
        CreditCard {
            number: "4111111111111111".into(),
            holder_name: "Test Holder".into(),
            issuing_bank: "Test Bank".into(),
            valid_until: Utc.with_ymd_and_hms(2030, 1, 31, 0, 0, 0).unwrap(),
            cvv: 123,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = PaymentsClient::new("http://localhost:3000");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_trailing_slash() {
        let client = PaymentsClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_client_with_client_id() {
        let client = PaymentsClient::new("http://localhost:3000").with_client_id("shop-1");
        assert_eq!(client.client_id, Some("shop-1".to_string()));
    }

    #[tokio::test]
    async fn test_ping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/ping")
            .with_body("pong")
            .create_async()
            .await;

        let client = PaymentsClient::new(server.url());
        assert_eq!(client.ping().await.unwrap(), "pong");
    }

    #[tokio::test]
    async fn test_pay_returns_reference() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pay")
            .match_header("X-Client-Id", "shop-1")
            .match_body(Matcher::PartialJson(json!({
                "order": { "id": "ORDER-1" },
                "creditCard": { "holderName": "Test Holder" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"00000000-0000-0000-0000-000000000007","date":"2026-01-01T00:00:00Z","status":"accepted"}"#,
            )
            .create_async()
            .await;

        let client = PaymentsClient::new(server.url()).with_client_id("shop-1");
        let reference = client.pay(&order(), &card()).await.unwrap().unwrap();

        assert_eq!(reference.status, TransactionStatus::Accepted);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pay_without_decision_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/pay")
            .with_status(502)
            .create_async()
            .await;

        let client = PaymentsClient::new(server.url());
        assert!(client.pay(&order(), &card()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pay_upstream_failure_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/pay")
            .with_status(502)
            .with_body(r#"{"error":"Fraud checker returned 500: boom","code":502}"#)
            .create_async()
            .await;

        let client = PaymentsClient::new(server.url());
        match client.pay(&order(), &card()).await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 502);
                assert!(message.contains("boom"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transaction_for_order_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/orders/ORDER-9/transaction")
            .with_status(404)
            .with_body(r#"{"error":"No transaction for order ORDER-9","code":404}"#)
            .create_async()
            .await;

        let client = PaymentsClient::new(server.url());
        match client.transaction_for_order("ORDER-9").await {
            Err(ClientError::Api { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "No transaction for order ORDER-9");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
