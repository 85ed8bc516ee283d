//! Trade journal persistence: append-only insert, list for display.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::asset::AssetClass;
use crate::types::trade::{Trade, TradeSide};

fn side_to_str(side: TradeSide) -> &'static str {
    match side {
        TradeSide::Buy => "buy",
        TradeSide::Sell => "sell",
    }
}

fn str_to_side(s: &str) -> Option<TradeSide> {
    match s {
        "buy" => Some(TradeSide::Buy),
        "sell" => Some(TradeSide::Sell),
        _ => None,
    }
}

fn class_to_str(class: AssetClass) -> &'static str {
    match class {
        AssetClass::Stock => "stock",
        AssetClass::Crypto => "crypto",
        AssetClass::Tamg => "tamg",
    }
}

fn str_to_class(s: &str) -> Option<AssetClass> {
    match s {
        "stock" => Some(AssetClass::Stock),
        "crypto" => Some(AssetClass::Crypto),
        "tamg" => Some(AssetClass::Tamg),
        _ => None,
    }
}

#[derive(Debug, FromRow)]
struct TradeRow {
    id: Uuid,
    user_id: Uuid,
    symbol: String,
    side: String,
    asset_class: String,
    shares: f64,
    price_per_share: f64,
    fee: f64,
    total_amount: f64,
    created_at: DateTime<Utc>,
}

fn row_to_trade(row: TradeRow) -> Option<Trade> {
    Some(Trade {
        id: row.id,
        user_id: row.user_id,
        side: str_to_side(&row.side)?,
        asset_class: str_to_class(&row.asset_class)?,
        symbol: row.symbol,
        shares: row.shares,
        price_per_share: row.price_per_share,
        fee: row.fee,
        total_amount: row.total_amount,
        created_at: row.created_at,
    })
}

/// Append a journal entry. Rows are never updated or deleted afterwards.
pub async fn insert_trade(pool: &PgPool, trade: &Trade) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO trades (id, user_id, symbol, side, asset_class, shares, price_per_share, fee, total_amount, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(trade.id)
    .bind(trade.user_id)
    .bind(&trade.symbol)
    .bind(side_to_str(trade.side))
    .bind(class_to_str(trade.asset_class))
    .bind(trade.shares)
    .bind(trade.price_per_share)
    .bind(trade.fee)
    .bind(trade.total_amount)
    .bind(trade.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Most recent trades for a user, newest first. Rows with unknown side or
/// class strings are skipped.
pub async fn list_trades_for_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: usize,
) -> Result<Vec<Trade>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TradeRow>(
        "SELECT id, user_id, symbol, side, asset_class, shares, price_per_share, fee, total_amount, created_at \
         FROM trades WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().filter_map(row_to_trade).collect())
}
