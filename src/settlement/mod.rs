//! Trade settlement: the pure accounting law, the phase pipeline that runs
//! it, and the storage strategy the pipeline writes through.

pub mod accounting;
pub mod simulator;
pub mod tamg;
pub mod workflow;

pub use accounting::{apply_trade, cost_breakdown, CostBreakdown, Settled};
pub use simulator::{InstantSimulator, SettlementSimulator, TimerSimulator};
pub use workflow::{settle_trade, SettlementPhase};

use uuid::Uuid;

use crate::error::TradeError;
use crate::types::asset::AssetClass;
use crate::types::position::Position;
use crate::types::trade::{Trade, TradeSide};

/// An order as captured in the input phase, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeIntent {
    pub user_id: Uuid,
    pub symbol: String,
    pub side: TradeSide,
    pub asset_class: AssetClass,
    pub shares: f64,
    pub price_per_share: f64,
}

/// Storage strategy the settlement workflow writes through. The live
/// implementation lands every step in Postgres as its own statement; the
/// demo session keeps everything in memory. Both run the same accounting
/// law, so live and demo trades stay in lockstep.
#[allow(async_fn_in_trait)]
pub trait TradeStore {
    async fn balance(&self, user_id: Uuid) -> Result<f64, TradeError>;
    async fn set_balance(&self, user_id: Uuid, balance: f64) -> Result<(), TradeError>;
    async fn position(&self, user_id: Uuid, symbol: &str) -> Result<Option<Position>, TradeError>;
    async fn upsert_position(&self, position: &Position) -> Result<(), TradeError>;
    async fn delete_position(&self, user_id: Uuid, symbol: &str) -> Result<(), TradeError>;
    async fn insert_trade(&self, trade: &Trade) -> Result<(), TradeError>;
    async fn recent_trades(&self, user_id: Uuid, limit: usize) -> Result<Vec<Trade>, TradeError>;
    async fn positions(&self, user_id: Uuid) -> Result<Vec<Position>, TradeError>;
}
