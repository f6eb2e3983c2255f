use super::responses::{ApiError, HealthResponse};
use crate::application::service::LedgerService;
use crate::domain::account::{Account, AccountId, NewAccount};
use crate::domain::transfer::{TransferOrder, TransferReceipt, TransferStatus};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// POST /user
pub async fn create_account(
    State(service): State<LedgerService>,
    body: Result<Json<NewAccount>, JsonRejection>,
) -> Result<Json<Account>, ApiError> {
    let Json(initial) = body?;
    let account = service.create_account(initial).await?;
    Ok(Json(account))
}

/// GET /user
pub async fn list_accounts(
    State(service): State<LedgerService>,
) -> Result<Json<BTreeMap<AccountId, Account>>, ApiError> {
    Ok(Json(service.list_accounts().await?))
}

/// POST /transaction
///
/// Only decodes and queues the order; the caller polls the returned token
/// for the outcome.
pub async fn submit_transfer(
    State(service): State<LedgerService>,
    body: Result<Json<TransferOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<TransferReceipt>), ApiError> {
    let Json(order) = body.inspect_err(|e| debug!(error = %e, "rejected transfer body"))?;
    let receipt = service.submit_transfer(order).await?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

/// GET /transaction/:token
pub async fn transfer_status(
    State(service): State<LedgerService>,
    Path(token): Path<Uuid>,
) -> Result<Json<TransferStatus>, ApiError> {
    Ok(Json(service.transfer_status(token).await?))
}

/// GET /health
pub async fn health(State(service): State<LedgerService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        queues: service.queue_depths(),
    })
}
