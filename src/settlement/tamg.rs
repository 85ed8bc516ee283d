//! TAMG subscription and liquidation. TAMG is a single synthetic share whose
//! unit price is an admin-configured setting, not a market quote. Both paths
//! delegate to the shared settlement pipeline, so the cost-basis math lives
//! in one place.

use uuid::Uuid;

use crate::error::TradeError;
use crate::settlement::accounting::Settled;
use crate::settlement::simulator::SettlementSimulator;
use crate::settlement::workflow::settle_trade;
use crate::settlement::{TradeIntent, TradeStore};
use crate::types::asset::AssetClass;
use crate::types::trade::TradeSide;

pub const TAMG_SYMBOL: &str = "TAMG";

/// Unit price used until an admin configures one.
pub const DEFAULT_TAMG_PRICE: f64 = 10.0;

fn intent(user_id: Uuid, side: TradeSide, shares: f64, unit_price: f64) -> TradeIntent {
    TradeIntent {
        user_id,
        symbol: TAMG_SYMBOL.to_string(),
        side,
        asset_class: AssetClass::Tamg,
        shares,
        price_per_share: unit_price,
    }
}

/// Buy TAMG shares at the admin-set unit price.
pub async fn subscribe<S, M>(
    store: &S,
    simulator: &M,
    user_id: Uuid,
    shares: f64,
    unit_price: f64,
) -> Result<Settled, TradeError>
where
    S: TradeStore,
    M: SettlementSimulator,
{
    settle_trade(store, simulator, &intent(user_id, TradeSide::Buy, shares, unit_price)).await
}

/// Sell TAMG shares, partially or in full. A full liquidation deletes the
/// holding; proceeds are credited to the cash balance.
pub async fn liquidate<S, M>(
    store: &S,
    simulator: &M,
    user_id: Uuid,
    shares: f64,
    unit_price: f64,
) -> Result<Settled, TradeError>
where
    S: TradeStore,
    M: SettlementSimulator,
{
    settle_trade(store, simulator, &intent(user_id, TradeSide::Sell, shares, unit_price)).await
}
