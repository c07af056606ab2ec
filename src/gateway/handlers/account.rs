//! Account query handlers

use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiError;
use crate::core_types::{AccountId, Amount};
use crate::engine::TransferError;
use crate::user_auth::AuthenticatedAccount;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: Amount,
}

/// Account balance endpoint
///
/// GET /account/balance
#[utoipa::path(
    get,
    path = "/account/balance",
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "Account not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Account"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<AuthenticatedAccount>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .accounts
        .get(subject.account_id)
        .await
        .map_err(TransferError::from)?;
    Ok(Json(BalanceResponse {
        account_id: account.id,
        balance: account.balance,
    }))
}
