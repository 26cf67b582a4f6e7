//! HTTP fraud checker.
//!
//! Plain client for the remote service: one call, no retries and no
//! fallback. Resiliency is layered on top by the decorators in
//! [`super::retry`] and [`super::circuit_breaker`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use payments_types::{CreditCard, FraudCheckError, FraudCheckRequest, FraudChecker, FraudStatus, Money};

/// Fraud checker that talks to `POST {base_url}/check`.
#[derive(Debug, Clone)]
pub struct HttpFraudChecker {
    client: Client,
    base_url: String,
}

impl HttpFraudChecker {
    /// Builds a client with bounded connect and request timeouts.
    pub fn new(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Only timeouts and failures to connect are transient. Anything that went
/// wrong after the remote answered (body, decode, redirect) is not.
fn transport_error(e: reqwest::Error) -> FraudCheckError {
    if e.is_timeout() {
        FraudCheckError::Timeout(e.to_string())
    } else if e.is_connect() {
        FraudCheckError::Connect(e.to_string())
    } else {
        FraudCheckError::InvalidResponse(e.to_string())
    }
}

#[async_trait]
impl FraudChecker for HttpFraudChecker {
    #[tracing::instrument(skip(self, credit_card), fields(base_url = %self.base_url, %amount))]
    async fn check_fraud(
        &self,
        credit_card: &CreditCard,
        amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        let body = FraudCheckRequest {
            credit_card: credit_card.clone(),
            charge: amount,
        };

        let response = self
            .client
            .post(format!("{}/check", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FraudCheckError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let verdict: FraudStatus = response.json().await.map_err(transport_error)?;
        tracing::debug!(overall = %verdict.overall, "Fraud check completed");
        Ok(verdict)
    }

    async fn fallback(
        &self,
        _credit_card: &CreditCard,
        _amount: Money,
    ) -> Result<FraudStatus, FraudCheckError> {
        Err(FraudCheckError::FallbackUnsupported)
    }

    async fn ping(&self) -> Result<String, FraudCheckError> {
        let response = self
            .client
            .get(format!("{}/ping", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(FraudCheckError::Server {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
