//! The pure accounting law. One place computes fees, affordability, the
//! weighted-average cost basis, and the balance delta; live mode, demo mode,
//! and TAMG all go through here.

use chrono::Utc;
use uuid::Uuid;

use crate::error::TradeError;
use crate::settlement::TradeIntent;
use crate::types::position::Position;
use crate::types::trade::{Trade, TradeSide};

/// Shares below this are treated as a fully liquidated holding.
const DUST_SHARES: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub subtotal: f64,
    pub fee: f64,
    /// Cash the trade moves: subtotal + fee for a buy, subtotal - fee for a
    /// sell. Always non-negative; the sign lives on `Trade::total_amount`.
    pub grand_total: f64,
}

/// Fee and total for a prospective trade. Computed before any affordability
/// or holdings check.
pub fn cost_breakdown(side: TradeSide, shares: f64, price_per_share: f64, fee_rate: f64) -> CostBreakdown {
    let subtotal = shares * price_per_share;
    let fee = subtotal * fee_rate;
    let grand_total = match side {
        TradeSide::Buy => subtotal + fee,
        TradeSide::Sell => subtotal - fee,
    };
    CostBreakdown {
        subtotal,
        fee,
        grand_total,
    }
}

/// Outcome of a settled trade: the surviving position (`None` when a sell
/// empties the holding), the new cash balance, and the journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Settled {
    pub position: Option<Position>,
    pub balance: f64,
    pub trade: Trade,
}

/// Apply one trade to a snapshot of (position, balance). Pure: no clock
/// dependence beyond stamping the journal entry, no storage. Errors reject
/// the trade with the snapshot untouched.
pub fn apply_trade(
    position: Option<&Position>,
    balance: f64,
    intent: &TradeIntent,
) -> Result<Settled, TradeError> {
    // `!(x > 0.0)` also catches NaN.
    if !(intent.shares > 0.0) {
        return Err(TradeError::NonPositiveQuantity);
    }
    if !(intent.price_per_share > 0.0) {
        return Err(TradeError::NonPositivePrice);
    }

    let costs = cost_breakdown(
        intent.side,
        intent.shares,
        intent.price_per_share,
        intent.asset_class.fee_rate(),
    );

    let (new_position, new_balance, total_amount) = match intent.side {
        TradeSide::Buy => {
            if balance < costs.grand_total {
                return Err(TradeError::InsufficientBalance {
                    needed: costs.grand_total,
                    available: balance,
                });
            }
            let pos = match position {
                Some(pos) => {
                    let new_shares = pos.shares + intent.shares;
                    let new_average = (pos.shares * pos.average_price
                        + intent.shares * intent.price_per_share)
                        / new_shares;
                    Position {
                        user_id: intent.user_id,
                        symbol: intent.symbol.clone(),
                        shares: new_shares,
                        average_price: new_average,
                    }
                }
                None => Position {
                    user_id: intent.user_id,
                    symbol: intent.symbol.clone(),
                    shares: intent.shares,
                    average_price: intent.price_per_share,
                },
            };
            (Some(pos), balance - costs.grand_total, -costs.grand_total)
        }
        TradeSide::Sell => {
            let pos = position.ok_or_else(|| TradeError::NoPosition(intent.symbol.clone()))?;
            if pos.shares < intent.shares {
                return Err(TradeError::InsufficientShares {
                    requested: intent.shares,
                    held: pos.shares,
                });
            }
            let remaining = pos.shares - intent.shares;
            // Average cost is never recomputed on a sell; realized P/L is
            // implicitly sale price minus the unchanged basis.
            let pos = if remaining <= DUST_SHARES {
                None
            } else {
                Some(Position {
                    user_id: intent.user_id,
                    symbol: intent.symbol.clone(),
                    shares: remaining,
                    average_price: pos.average_price,
                })
            };
            (pos, balance + costs.grand_total, costs.grand_total)
        }
    };

    let trade = Trade {
        id: Uuid::new_v4(),
        user_id: intent.user_id,
        symbol: intent.symbol.clone(),
        side: intent.side,
        asset_class: intent.asset_class,
        shares: intent.shares,
        price_per_share: intent.price_per_share,
        fee: costs.fee,
        total_amount,
        created_at: Utc::now(),
    };

    Ok(Settled {
        position: new_position,
        balance: new_balance,
        trade,
    })
}
