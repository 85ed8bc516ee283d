//! Transfer request persistence: insert and list.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::transfers::{Transfer, TransferKind, TransferStatus};

fn kind_to_str(kind: TransferKind) -> &'static str {
    match kind {
        TransferKind::Deposit => "deposit",
        TransferKind::Withdrawal => "withdrawal",
    }
}

fn str_to_kind(s: &str) -> Option<TransferKind> {
    match s {
        "deposit" => Some(TransferKind::Deposit),
        "withdrawal" => Some(TransferKind::Withdrawal),
        _ => None,
    }
}

fn status_to_str(status: TransferStatus) -> &'static str {
    match status {
        TransferStatus::Approved => "approved",
        TransferStatus::Declined => "declined",
    }
}

fn str_to_status(s: &str) -> Option<TransferStatus> {
    match s {
        "approved" => Some(TransferStatus::Approved),
        "declined" => Some(TransferStatus::Declined),
        _ => None,
    }
}

#[derive(Debug, FromRow)]
struct TransferRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    amount: f64,
    status: String,
    created_at: DateTime<Utc>,
}

fn row_to_transfer(row: TransferRow) -> Option<Transfer> {
    Some(Transfer {
        id: row.id,
        user_id: row.user_id,
        kind: str_to_kind(&row.kind)?,
        amount: row.amount,
        status: str_to_status(&row.status)?,
        created_at: row.created_at,
    })
}

/// Insert a transfer request row (deposits and withdrawals, declined ones
/// included).
pub async fn insert_transfer(pool: &PgPool, transfer: &Transfer) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transfers (id, user_id, kind, amount, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(transfer.id)
    .bind(transfer.user_id)
    .bind(kind_to_str(transfer.kind))
    .bind(transfer.amount)
    .bind(status_to_str(transfer.status))
    .bind(transfer.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Recent transfer requests for a user, newest first.
pub async fn list_transfers_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: usize,
) -> Result<Vec<Transfer>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransferRow>(
        "SELECT id, user_id, kind, amount, status, created_at \
         FROM transfers WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(row_to_transfer).collect())
}
