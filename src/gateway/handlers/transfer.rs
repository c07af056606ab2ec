//! Transfer endpoints: create a transfer, read transfer history.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::super::state::AppState;
use super::super::types::ApiError;
use crate::core_types::{AccountId, Amount};
use crate::ledger::{Cursor, Transaction};
use crate::user_auth::AuthenticatedAccount;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// Transfer request body.
///
/// Amounts are integer minor units; fractional values are rejected at
/// deserialization. The recipient is an account id or an email resolved
/// through the directory.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferApiRequest {
    #[schema(example = 2)]
    pub to_account_id: Option<AccountId>,
    #[schema(example = "bob@example.com")]
    pub to_email: Option<String>,
    /// Amount in minor units (e.g. cents)
    #[schema(example = 2500)]
    pub amount: Amount,
    #[schema(example = "rent")]
    pub narration: Option<String>,
    /// Client idempotency key; retries with the same key are not
    /// executed twice
    #[schema(example = "c4a1d8e0-req-001")]
    pub request_key: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transaction_id: String,
    pub from_balance: Amount,
    pub to_balance: Amount,
}

/// Create transfer endpoint
///
/// POST /transfers
///
/// The sender is the authenticated account; it is never taken from the
/// request body. Returns 201 for a newly executed transfer and 200 when
/// an idempotent replay returns the original outcome.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferApiRequest,
    responses(
        (status = 201, description = "Transfer committed", body = TransferResponse),
        (status = 200, description = "Idempotent replay of a prior transfer", body = TransferResponse),
        (status = 400, description = "Invalid amount, self transfer or insufficient funds"),
        (status = 401, description = "Authentication failed"),
        (status = 404, description = "Recipient not found"),
        (status = 409, description = "Contention or duplicate request still in flight"),
        (status = 503, description = "Durable store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<AuthenticatedAccount>,
    Json(req): Json<TransferApiRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let to = resolve_recipient(&state, &req).await?;

    let outcome = state
        .engine
        .transfer(
            subject.account_id,
            to,
            req.amount,
            req.narration,
            Some(req.request_key),
        )
        .await?;

    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        Json(TransferResponse {
            transaction_id: outcome.transaction_id.to_string(),
            from_balance: outcome.from_balance,
            to_balance: outcome.to_balance,
        }),
    ))
}

async fn resolve_recipient(
    state: &AppState,
    req: &TransferApiRequest,
) -> Result<AccountId, ApiError> {
    if let Some(id) = req.to_account_id {
        return Ok(id);
    }
    let email = req
        .to_email
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("Missing recipient: toAccountId or toEmail"))?;
    state
        .directory
        .resolve(email)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Recipient not found: {email}")))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    /// Page size, capped at 100
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartDto {
    pub account_id: AccountId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub transaction_id: String,
    /// "outgoing" when the authenticated account is the sender
    pub direction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterpart: Option<CounterpartDto>,
    pub amount: Amount,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    pub status: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub items: Vec<HistoryItem>,
    /// Absent when the history is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Transfer history endpoint
///
/// GET /transfers/history?cursor=&limit=
///
/// Newest-first entries where the authenticated account is sender or
/// recipient, with a restartable opaque cursor.
#[utoipa::path(
    get,
    path = "/transfers/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "One page of transfer history", body = HistoryResponse),
        (status = 400, description = "Invalid cursor"),
        (status = 401, description = "Authentication failed"),
        (status = 503, description = "Durable store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Transfer"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(subject): Extension<AuthenticatedAccount>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let cursor = match query.cursor.as_deref() {
        Some(raw) => {
            Some(Cursor::decode(raw).ok_or_else(|| ApiError::bad_request("Invalid cursor"))?)
        }
        None => None,
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let page = state
        .ledger
        .list_by_account(subject.account_id, cursor, limit)
        .await
        .map_err(crate::engine::TransferError::from)?;

    let mut items = Vec::with_capacity(page.items.len());
    for tx in &page.items {
        items.push(history_item(&state, subject.account_id, tx).await);
    }

    Ok(Json(HistoryResponse {
        items,
        next_cursor: page.next_cursor.map(|c| c.encode()),
    }))
}

async fn history_item(state: &AppState, me: AccountId, tx: &Transaction) -> HistoryItem {
    let (direction, counterpart_id) = if tx.from == me {
        ("outgoing", tx.to)
    } else {
        ("incoming", tx.from)
    };
    let counterpart = state
        .directory
        .entry(counterpart_id)
        .await
        .map(|e| CounterpartDto {
            account_id: e.account_id,
            name: e.name,
            email: e.email,
        });

    HistoryItem {
        transaction_id: tx.id.to_string(),
        direction: direction.to_string(),
        counterpart,
        amount: tx.amount,
        narration: tx.narration.clone(),
        status: tx.status.as_str().to_string(),
        created_at: tx.created_at,
        completed_at: tx.completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{Account, MemAccountStore};
    use crate::config::RetryConfig;
    use crate::directory::{DirectoryEntry, MemDirectory};
    use crate::engine::TransferEngine;
    use crate::ledger::MemLedgerStore;
    use crate::user_auth::AuthVerifier;

    fn test_state() -> Arc<AppState> {
        let accounts = Arc::new(MemAccountStore::new());
        accounts.insert(Account::new(1, 100));
        accounts.insert(Account::new(2, 50));

        let directory = Arc::new(MemDirectory::new());
        directory.register(DirectoryEntry {
            account_id: 1,
            name: "Alice".into(),
            email: "alice@example.com".into(),
        });
        directory.register(DirectoryEntry {
            account_id: 2,
            name: "Bob".into(),
            email: "bob@example.com".into(),
        });

        let ledger = Arc::new(MemLedgerStore::new());
        let engine = Arc::new(TransferEngine::new(
            accounts.clone(),
            ledger.clone(),
            RetryConfig::default(),
        ));
        Arc::new(AppState::new(
            engine,
            accounts,
            ledger,
            directory,
            Arc::new(AuthVerifier::new("test-secret".into())),
        ))
    }

    fn subject(account_id: u64) -> Extension<AuthenticatedAccount> {
        Extension(AuthenticatedAccount { account_id })
    }

    #[tokio::test]
    async fn test_create_transfer_by_email() {
        let state = test_state();
        let (status, Json(resp)) = create_transfer(
            State(state.clone()),
            subject(1),
            Json(TransferApiRequest {
                to_account_id: None,
                to_email: Some("bob@example.com".into()),
                amount: 30,
                narration: Some("rent".into()),
                request_key: "k1".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.from_balance, 70);
        assert_eq!(resp.to_balance, 80);
    }

    #[tokio::test]
    async fn test_replay_answers_200() {
        let state = test_state();
        let req = || TransferApiRequest {
            to_account_id: Some(2),
            to_email: None,
            amount: 30,
            narration: None,
            request_key: "k1".into(),
        };
        let (first, Json(first_resp)) =
            create_transfer(State(state.clone()), subject(1), Json(req()))
                .await
                .unwrap();
        let (second, Json(second_resp)) =
            create_transfer(State(state.clone()), subject(1), Json(req()))
                .await
                .unwrap();

        assert_eq!(first, StatusCode::CREATED);
        assert_eq!(second, StatusCode::OK);
        assert_eq!(first_resp.transaction_id, second_resp.transaction_id);
        assert_eq!(second_resp.from_balance, 70);
    }

    #[tokio::test]
    async fn test_unknown_recipient_email_404() {
        let state = test_state();
        let err = create_transfer(
            State(state),
            subject(1),
            Json(TransferApiRequest {
                to_account_id: None,
                to_email: Some("nobody@example.com".into()),
                amount: 30,
                narration: None,
                request_key: "k1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_recipient_400() {
        let state = test_state();
        let err = create_transfer(
            State(state),
            subject(1),
            Json(TransferApiRequest {
                to_account_id: None,
                to_email: None,
                amount: 30,
                narration: None,
                request_key: "k1".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_directions_and_counterparts() {
        let state = test_state();
        create_transfer(
            State(state.clone()),
            subject(1),
            Json(TransferApiRequest {
                to_account_id: Some(2),
                to_email: None,
                amount: 30,
                narration: Some("rent".into()),
                request_key: "k1".into(),
            }),
        )
        .await
        .unwrap();

        // Bob sees an incoming entry from Alice
        let Json(resp) = get_history(
            State(state.clone()),
            subject(2),
            Query(HistoryQuery {
                cursor: None,
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.items.len(), 1);
        assert_eq!(resp.items[0].direction, "incoming");
        assert_eq!(
            resp.items[0].counterpart.as_ref().unwrap().email,
            "alice@example.com"
        );
        assert!(resp.next_cursor.is_none());

        // Alice sees the same entry as outgoing
        let Json(resp) = get_history(
            State(state),
            subject(1),
            Query(HistoryQuery {
                cursor: None,
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.items[0].direction, "outgoing");
        assert_eq!(resp.items[0].status, "success");
    }

    #[tokio::test]
    async fn test_history_pagination_cursor() {
        let state = test_state();
        for i in 0..5 {
            create_transfer(
                State(state.clone()),
                subject(1),
                Json(TransferApiRequest {
                    to_account_id: Some(2),
                    to_email: None,
                    amount: 10,
                    narration: None,
                    request_key: format!("k{i}"),
                }),
            )
            .await
            .unwrap();
        }

        let Json(page1) = get_history(
            State(state.clone()),
            subject(1),
            Query(HistoryQuery {
                cursor: None,
                limit: Some(3),
            }),
        )
        .await
        .unwrap();
        assert_eq!(page1.items.len(), 3);
        let cursor = page1.next_cursor.expect("more pages");

        let Json(page2) = get_history(
            State(state),
            subject(1),
            Query(HistoryQuery {
                cursor: Some(cursor),
                limit: Some(3),
            }),
        )
        .await
        .unwrap();
        assert_eq!(page2.items.len(), 2);
        assert!(page2.next_cursor.is_none());

        // No overlap between pages
        let ids1: Vec<_> = page1.items.iter().map(|i| &i.transaction_id).collect();
        assert!(!ids1.contains(&&page2.items[0].transaction_id));
    }

    #[test]
    fn test_request_body_is_camel_case_on_the_wire() {
        let req: TransferApiRequest = serde_json::from_value(serde_json::json!({
            "toEmail": "bob@example.com",
            "amount": 2500,
            "narration": "rent",
            "requestKey": "req-001"
        }))
        .unwrap();
        assert_eq!(req.to_email.as_deref(), Some("bob@example.com"));
        assert_eq!(req.amount, 2500);
        assert_eq!(req.request_key, "req-001");

        // Fractional amounts never deserialize
        assert!(
            serde_json::from_value::<TransferApiRequest>(serde_json::json!({
                "toAccountId": 2,
                "amount": 25.5,
                "requestKey": "req-002"
            }))
            .is_err()
        );
    }

    #[tokio::test]
    async fn test_invalid_cursor_rejected() {
        let state = test_state();
        let err = get_history(
            State(state),
            subject(1),
            Query(HistoryQuery {
                cursor: Some("!!not-a-cursor!!".into()),
                limit: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
