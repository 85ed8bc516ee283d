use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Holding per (user, symbol). Shares are fractional (crypto and TAMG allow
/// sub-unit quantities). A position only exists while `shares > 0`; selling
/// a holding down to zero deletes it rather than leaving a zero row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub user_id: Uuid,
    pub symbol: String,
    pub shares: f64,
    pub average_price: f64,
}

impl Position {
    /// Market value at the given price.
    pub fn market_value(&self, current_price: f64) -> f64 {
        self.shares * current_price
    }

    /// Unrealized P&L against the weighted average cost basis.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.average_price) * self.shares
    }
}
