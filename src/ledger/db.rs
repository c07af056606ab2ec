//! PostgreSQL-backed ledger store.
//!
//! Request-key uniqueness is enforced by a partial unique index over
//! non-failed entries; the one-shot finalize is a conditional UPDATE
//! guarded on the pending state. Timestamps are stored as epoch millis
//! so cursor comparisons are exact.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::cursor::Cursor;
use super::store::{LedgerError, LedgerStore, TransactionPage};
use super::types::{Transaction, TxStatus};
use crate::core_types::{AccountId, Amount, TransactionId, now_millis};

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the transfers table and its indexes if they do not exist.
    ///
    /// Failed entries are excluded from the unique index so a client can
    /// retry a failed request key.
    pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transfers_tb (
                seq           BIGSERIAL PRIMARY KEY,
                tx_id         VARCHAR(26) NOT NULL UNIQUE,
                from_account  BIGINT NOT NULL,
                to_account    BIGINT NOT NULL,
                amount        BIGINT NOT NULL CHECK (amount > 0),
                narration     TEXT,
                status        SMALLINT NOT NULL DEFAULT 0,
                request_key   TEXT,
                created_at    BIGINT NOT NULL,
                completed_at  BIGINT
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_transfers_request_key
            ON transfers_tb (request_key)
            WHERE request_key IS NOT NULL AND status <> 2
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transfers_from_account
            ON transfers_tb (from_account, created_at DESC, seq DESC)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_transfers_to_account
            ON transfers_tb (to_account, created_at DESC, seq DESC)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn row_to_tx(row: &sqlx::postgres::PgRow) -> Result<Transaction, LedgerError> {
        let id_str: String = row.get("tx_id");
        let id: TransactionId = id_str
            .parse()
            .map_err(|_| LedgerError::Unavailable(format!("Invalid tx_id format: {}", id_str)))?;

        let status_id: i16 = row.get("status");
        let status = TxStatus::from_id(status_id)
            .ok_or_else(|| LedgerError::Unavailable(format!("Invalid status ID: {}", status_id)))?;

        Ok(Transaction {
            id,
            from: row.get::<i64, _>("from_account") as AccountId,
            to: row.get::<i64, _>("to_account") as AccountId,
            amount: row.get::<i64, _>("amount") as Amount,
            narration: row.get("narration"),
            status,
            request_key: row.get("request_key"),
            created_at: row.get("created_at"),
            completed_at: row.get("completed_at"),
            seq: row.get("seq"),
        })
    }
}

const TX_COLUMNS: &str = "tx_id, from_account, to_account, amount, narration, status, \
                          request_key, created_at, completed_at, seq";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn append(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        debug_assert_eq!(tx.status, TxStatus::Pending);

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO transfers_tb
                (tx_id, from_account, to_account, amount, narration, status, request_key, created_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TX_COLUMNS}
            "#,
        ))
        .bind(tx.id.to_string())
        .bind(tx.from as i64)
        .bind(tx.to as i64)
        .bind(tx.amount as i64)
        .bind(&tx.narration)
        .bind(tx.status.id())
        .bind(&tx.request_key)
        .bind(tx.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Self::row_to_tx(&row),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                // The partial unique index fired: surface the entry that
                // holds the key.
                let key = tx.request_key.as_deref().unwrap_or_default();
                match self.find_by_request_key(key).await? {
                    Some(existing) => Err(LedgerError::DuplicateRequestKey(Box::new(existing))),
                    None => Err(LedgerError::Unavailable(
                        "unique violation without a holder entry".to_string(),
                    )),
                }
            }
            Err(e) => Err(LedgerError::Unavailable(e.to_string())),
        }
    }

    async fn finalize(
        &self,
        id: TransactionId,
        status: TxStatus,
    ) -> Result<Transaction, LedgerError> {
        debug_assert!(status.is_terminal());

        let row = sqlx::query(&format!(
            r#"
            UPDATE transfers_tb
            SET status = $1, completed_at = $2
            WHERE tx_id = $3 AND status = $4
            RETURNING {TX_COLUMNS}
            "#,
        ))
        .bind(status.id())
        .bind(now_millis())
        .bind(id.to_string())
        .bind(TxStatus::Pending.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        if let Some(row) = row {
            return Self::row_to_tx(&row);
        }

        // Zero rows: missing entry or already terminal.
        let row = sqlx::query(&format!(
            "SELECT {TX_COLUMNS} FROM transfers_tb WHERE tx_id = $1",
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let existing = Self::row_to_tx(&row)?;
                Err(LedgerError::AlreadyFinalized {
                    id,
                    status: existing.status,
                })
            }
            None => Err(LedgerError::NotFound(id)),
        }
    }

    async fn find_by_request_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        // Prefer the non-failed holder of the key; fall back to the most
        // recent failed attempt.
        let row = sqlx::query(&format!(
            r#"
            SELECT {TX_COLUMNS} FROM transfers_tb
            WHERE request_key = $1
            ORDER BY (status <> $2) DESC, seq DESC
            LIMIT 1
            "#,
        ))
        .bind(key)
        .bind(TxStatus::Failed.id())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::row_to_tx(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_account(
        &self,
        account: AccountId,
        cursor: Option<Cursor>,
        limit: usize,
    ) -> Result<TransactionPage, LedgerError> {
        // Fetch one extra row to know whether a next page exists.
        let fetch = (limit + 1) as i64;

        let rows = match cursor {
            Some(c) => {
                sqlx::query(&format!(
                    r#"
                    SELECT {TX_COLUMNS} FROM transfers_tb
                    WHERE (from_account = $1 OR to_account = $1)
                      AND (created_at, seq) < ($2, $3)
                    ORDER BY created_at DESC, seq DESC
                    LIMIT $4
                    "#,
                ))
                .bind(account as i64)
                .bind(c.created_at)
                .bind(c.seq)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    r#"
                    SELECT {TX_COLUMNS} FROM transfers_tb
                    WHERE from_account = $1 OR to_account = $1
                    ORDER BY created_at DESC, seq DESC
                    LIMIT $2
                    "#,
                ))
                .bind(account as i64)
                .bind(fetch)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len().min(limit));
        for row in rows.iter().take(limit) {
            items.push(Self::row_to_tx(row)?);
        }

        let next_cursor = if rows.len() > limit {
            items.last().map(|t| Cursor {
                created_at: t.created_at,
                seq: t.seq,
            })
        } else {
            None
        };

        Ok(TransactionPage { items, next_cursor })
    }
}
