//! Profile persistence: credentials plus the single cash balance scalar.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Row from the profiles table (username is stored lowercase). The balance
/// column carries no non-negativity constraint; affordability is checked
/// client-side before every trade.
#[derive(Debug, FromRow)]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

/// Insert a profile. Username must already be lowercase.
pub async fn insert_profile(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    password_hash: &str,
    balance: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO profiles (id, username, password_hash, balance, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind(username)
    .bind(password_hash)
    .bind(balance)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

/// Get a profile by username (lowercase). For login.
pub async fn get_profile_by_username(
    pool: &PgPool,
    username_lowercase: &str,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, username, password_hash, balance, created_at FROM profiles WHERE username = $1",
    )
    .bind(username_lowercase)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// List all profiles, for hydrating the in-memory credential store.
pub async fn list_profiles(pool: &PgPool) -> Result<Vec<ProfileRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, username, password_hash, balance, created_at FROM profiles",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Current cash balance. Missing profile reads as zero.
pub async fn get_balance(pool: &PgPool, user_id: Uuid) -> Result<f64, sqlx::Error> {
    let row: Option<(f64,)> = sqlx::query_as("SELECT balance FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(balance,)| balance).unwrap_or(0.0))
}

/// Overwrite the cash balance. Plain single-row update, no version check:
/// a concurrent writer that read the same prior balance wins last.
pub async fn update_balance(pool: &PgPool, user_id: Uuid, balance: f64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE profiles SET balance = $1 WHERE id = $2")
        .bind(balance)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}
