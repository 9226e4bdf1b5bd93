pub mod error;
pub mod handler;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::engine::ledger::Ledger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
}

/// HTTP routes of the ledger.
pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route(
            "/accounts",
            get(handler::list_accounts).post(handler::create_account),
        )
        .route(
            "/accounts/:iban",
            get(handler::get_account)
                .put(handler::update_account)
                .delete(handler::delete_account),
        )
        .route(
            "/accounts/transfer/:amount/from/:iban_from/to/:iban_to",
            get(handler::transfer),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { ledger })
}
