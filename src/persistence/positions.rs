//! Position persistence: get, upsert, delete, list.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::position::Position;

#[derive(Debug, FromRow)]
struct PositionRow {
    user_id: Uuid,
    symbol: String,
    shares: f64,
    average_price: f64,
}

fn row_to_position(row: PositionRow) -> Position {
    Position {
        user_id: row.user_id,
        symbol: row.symbol,
        shares: row.shares,
        average_price: row.average_price,
    }
}

/// Get one position, if held.
pub async fn get_position(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Position>, sqlx::Error> {
    let row = sqlx::query_as::<_, PositionRow>(
        "SELECT user_id, symbol, shares, average_price FROM positions \
         WHERE user_id = $1 AND symbol = $2",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(row_to_position))
}

/// Upsert a position (insert or update on conflict).
pub async fn upsert_position(pool: &PgPool, position: &Position) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO positions (user_id, symbol, shares, average_price) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, symbol) DO UPDATE SET shares = $3, average_price = $4",
    )
    .bind(position.user_id)
    .bind(&position.symbol)
    .bind(position.shares)
    .bind(position.average_price)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a position row on full liquidation.
pub async fn delete_position(pool: &PgPool, user_id: Uuid, symbol: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM positions WHERE user_id = $1 AND symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .execute(pool)
        .await?;
    Ok(())
}

/// List a user's portfolio (for GET /portfolio).
pub async fn list_positions_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Position>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PositionRow>(
        "SELECT user_id, symbol, shares, average_price FROM positions \
         WHERE user_id = $1 ORDER BY symbol",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(row_to_position).collect())
}
