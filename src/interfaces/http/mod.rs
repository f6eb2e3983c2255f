//! Axum adapter exposing the ledger service over HTTP.
//!
//! Handlers decode requests, call [`LedgerService`] and serialize what it
//! returns; no ledger logic lives here.

pub mod handlers;
pub mod responses;

use crate::application::service::LedgerService;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router(service: LedgerService) -> Router {
    Router::new()
        .route(
            "/user",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route("/transaction", post(handlers::submit_transfer))
        .route("/transaction/:token", get(handlers::transfer_status))
        .route("/health", get(handlers::health))
        .with_state(service)
}
