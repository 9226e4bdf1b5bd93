use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::model::account::Iban;
use crate::model::amount::Amount;
use crate::model::record::{AccountRecord, BalanceUpdate, NewAccount, TransferReceipt};

pub async fn list_accounts(State(state): State<AppState>) -> Json<Vec<AccountRecord>> {
    Json(state.ledger.list())
}

pub async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<NewAccount>,
) -> Result<(StatusCode, Json<AccountRecord>), ApiError> {
    let record = state.ledger.create(payload)?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(iban): Path<Iban>,
) -> Result<Json<AccountRecord>, ApiError> {
    Ok(Json(state.ledger.account(&iban)?))
}

pub async fn update_account(
    State(state): State<AppState>,
    Path(iban): Path<Iban>,
    Json(payload): Json<BalanceUpdate>,
) -> Result<Json<AccountRecord>, ApiError> {
    Ok(Json(state.ledger.update(&iban, payload.balance)?))
}

pub async fn delete_account(State(state): State<AppState>, Path(iban): Path<Iban>) -> StatusCode {
    state.ledger.remove(&iban);

    StatusCode::NO_CONTENT
}

/// `GET /accounts/transfer/:amount/from/:iban_from/to/:iban_to`
pub async fn transfer(
    State(state): State<AppState>,
    Path((amount, iban_from, iban_to)): Path<(Amount, Iban, Iban)>,
) -> Result<Json<TransferReceipt>, ApiError> {
    Ok(Json(state.ledger.transfer(&iban_from, &iban_to, amount)?))
}
