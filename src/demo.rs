//! Demo-mode session: a device-local practice account. Runs the exact same
//! settlement pipeline as the live account against in-memory state, with a
//! user-chosen starting balance and no contact with the database.
//!
//! Persistence is an explicit save/load boundary: `save` serializes the
//! whole session to a JSON blob, `load` restores it. Nothing is written as
//! a side effect of trading.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::TradeError;
use crate::settlement::TradeStore;
use crate::types::position::Position;
use crate::types::trade::Trade;

/// Demo trade history keeps only the most recent entries.
pub const DEMO_TRADE_CAP: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
struct DemoState {
    user_id: Uuid,
    starting_balance: f64,
    balance: f64,
    positions: HashMap<String, Position>,
    /// Newest first, capped at [`DEMO_TRADE_CAP`].
    trades: VecDeque<Trade>,
}

/// One practice session. Single-profile by construction, so the lock is
/// only there to satisfy `&self` store access from async handlers.
#[derive(Debug)]
pub struct DemoSession {
    state: RwLock<DemoState>,
}

impl DemoSession {
    pub fn new(user_id: Uuid, starting_balance: f64) -> Self {
        Self {
            state: RwLock::new(DemoState {
                user_id,
                starting_balance,
                balance: starting_balance,
                positions: HashMap::new(),
                trades: VecDeque::new(),
            }),
        }
    }

    pub async fn user_id(&self) -> Uuid {
        self.state.read().await.user_id
    }

    /// Wipe positions and history and restore the starting balance, as on
    /// exiting demo mode.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.balance = state.starting_balance;
        state.positions.clear();
        state.trades.clear();
    }

    /// Re-key the session to a new profile and starting balance.
    pub async fn start_over(&self, user_id: Uuid, starting_balance: f64) {
        let mut state = self.state.write().await;
        state.user_id = user_id;
        state.starting_balance = starting_balance;
        state.balance = starting_balance;
        state.positions.clear();
        state.trades.clear();
    }

    /// Serialize the session to a JSON blob for local persistence.
    pub async fn save(&self) -> Result<String, serde_json::Error> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
    }

    /// Restore a session from a blob produced by [`DemoSession::save`].
    pub fn load(blob: &str) -> Result<Self, serde_json::Error> {
        let mut state: DemoState = serde_json::from_str(blob)?;
        state.trades.truncate(DEMO_TRADE_CAP);
        Ok(Self {
            state: RwLock::new(state),
        })
    }
}

impl TradeStore for DemoSession {
    // The session holds exactly one profile; the user_id arguments exist to
    // match the live store's shape.

    async fn balance(&self, _user_id: Uuid) -> Result<f64, TradeError> {
        Ok(self.state.read().await.balance)
    }

    async fn set_balance(&self, _user_id: Uuid, balance: f64) -> Result<(), TradeError> {
        self.state.write().await.balance = balance;
        Ok(())
    }

    async fn position(&self, _user_id: Uuid, symbol: &str) -> Result<Option<Position>, TradeError> {
        Ok(self.state.read().await.positions.get(symbol).cloned())
    }

    async fn upsert_position(&self, position: &Position) -> Result<(), TradeError> {
        self.state
            .write()
            .await
            .positions
            .insert(position.symbol.clone(), position.clone());
        Ok(())
    }

    async fn delete_position(&self, _user_id: Uuid, symbol: &str) -> Result<(), TradeError> {
        self.state.write().await.positions.remove(symbol);
        Ok(())
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), TradeError> {
        let mut state = self.state.write().await;
        state.trades.push_front(trade.clone());
        state.trades.truncate(DEMO_TRADE_CAP);
        Ok(())
    }

    async fn recent_trades(&self, _user_id: Uuid, limit: usize) -> Result<Vec<Trade>, TradeError> {
        Ok(self
            .state
            .read()
            .await
            .trades
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn positions(&self, _user_id: Uuid) -> Result<Vec<Position>, TradeError> {
        let mut positions: Vec<Position> =
            self.state.read().await.positions.values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(positions)
    }
}
