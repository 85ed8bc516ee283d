use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::asset::AssetClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed order. Rows are append-only: never updated or deleted once
/// written. `total_amount` is the signed cash delta applied to the balance,
/// fee included (negative for buys, positive for sells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub side: TradeSide,
    pub asset_class: AssetClass,
    pub shares: f64,
    pub price_per_share: f64,
    pub fee: f64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}
