//! Cash transfers: deposits credit immediately, withdrawals debit with a
//! simulated ~2% decline. The decline models real-world payment failures in
//! a platform with no payment rail behind it; it is product behavior, not an
//! error path. Live accounts only; demo mode has no transfers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::TradeError;
use crate::persistence;

/// Fraction of withdrawal requests that are declined.
pub const WITHDRAWAL_DECLINE_RATE: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Approved,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransferKind,
    pub amount: f64,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
}

/// Whether a uniform roll in `[0, 1)` falls in the decline band.
pub fn roll_declines(roll: f64) -> bool {
    roll < WITHDRAWAL_DECLINE_RATE
}

fn new_transfer(user_id: Uuid, kind: TransferKind, amount: f64, status: TransferStatus) -> Transfer {
    Transfer {
        id: Uuid::new_v4(),
        user_id,
        kind,
        amount,
        status,
        created_at: Utc::now(),
    }
}

/// Credit the cash balance and journal the deposit.
pub async fn deposit(pool: &PgPool, user_id: Uuid, amount: f64) -> Result<Transfer, TradeError> {
    if !(amount > 0.0) {
        return Err(TradeError::NonPositiveAmount);
    }
    let balance = persistence::get_balance(pool, user_id).await?;
    let transfer = new_transfer(user_id, TransferKind::Deposit, amount, TransferStatus::Approved);
    persistence::insert_transfer(pool, &transfer).await?;
    persistence::update_balance(pool, user_id, balance + amount).await?;
    tracing::info!(%user_id, amount, "deposit credited");
    Ok(transfer)
}

/// Debit the cash balance, or decline. `roll` is a uniform value in `[0, 1)`
/// injected by the caller so tests can force either outcome. A declined
/// request is journaled and leaves the balance untouched.
pub async fn withdraw(
    pool: &PgPool,
    user_id: Uuid,
    amount: f64,
    roll: f64,
) -> Result<Transfer, TradeError> {
    if !(amount > 0.0) {
        return Err(TradeError::NonPositiveAmount);
    }
    let balance = persistence::get_balance(pool, user_id).await?;
    if balance < amount {
        return Err(TradeError::InsufficientBalance {
            needed: amount,
            available: balance,
        });
    }

    let status = if roll_declines(roll) {
        TransferStatus::Declined
    } else {
        TransferStatus::Approved
    };
    let transfer = new_transfer(user_id, TransferKind::Withdrawal, amount, status);
    persistence::insert_transfer(pool, &transfer).await?;
    if status == TransferStatus::Approved {
        persistence::update_balance(pool, user_id, balance - amount).await?;
        tracing::info!(%user_id, amount, "withdrawal approved");
    } else {
        tracing::info!(%user_id, amount, "withdrawal declined");
    }
    Ok(transfer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decline_band_matches_rate() {
        assert!(roll_declines(0.0));
        assert!(roll_declines(0.0199));
        assert!(!roll_declines(0.02));
        assert!(!roll_declines(0.97));
    }
}
