//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use payments_types::{
    AppError, ErrorResponse, FraudChecker, PaymentRequest, TransactionId, TransactionRepository,
};

use crate::PaymentService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<R: TransactionRepository, F: FraudChecker> {
    pub service: PaymentService<R, F>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Request failed");
        }

        let body = ErrorResponse {
            error: message,
            code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// Liveness endpoint.
pub async fn ping() -> &'static str {
    "pong"
}

/// Pay for an order.
///
/// `200` with the transaction reference, or a bare `502` when the fraud
/// check reached no decision.
#[tracing::instrument(skip(state, payload))]
pub async fn pay<R: TransactionRepository, F: FraudChecker>(
    State(state): State<Arc<AppState<R, F>>>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let (order, credit_card) = req.into_parts().map_err(AppError::from)?;

    tracing::info!(order_id = %order.id(), items = order.total_items(), card = ?credit_card, "Payment requested");

    match state.service.make_payment(&order, &credit_card).await? {
        Some(reference) => Ok(Json(reference).into_response()),
        None => Ok(StatusCode::BAD_GATEWAY.into_response()),
    }
}

/// Get a transaction by ID.
#[tracing::instrument(skip(state), fields(transaction_id = %id))]
pub async fn get_transaction<R: TransactionRepository, F: FraudChecker>(
    State(state): State<Arc<AppState<R, F>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid transaction ID".into()))?;

    let tx = state.service.get_transaction(transaction_id).await?;
    Ok(Json(tx))
}

/// Get the transaction recorded for an order.
#[tracing::instrument(skip(state))]
pub async fn get_order_transaction<R: TransactionRepository, F: FraudChecker>(
    State(state): State<Arc<AppState<R, F>>>,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = state.service.find_by_order_id(&order_id).await?;
    Ok(Json(tx))
}

/// Serves the OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
