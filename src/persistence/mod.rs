//! Database layer: pool, migrations, and access for profiles, positions,
//! trades, transfers, and settings. Also the live [`TradeStore`]
//! implementation the settlement workflow writes through.

mod positions;
mod profiles;
mod settings;
mod trades;
mod transfers;

pub use positions::{delete_position, get_position, list_positions_for_user, upsert_position};
pub use profiles::{
    get_balance, get_profile_by_username, insert_profile, list_profiles, update_balance,
    ProfileRow,
};
pub use settings::{get_setting, set_setting};
pub use sqlx::PgPool;
pub use trades::{insert_trade, list_trades_for_user};
pub use transfers::{insert_transfer, list_transfers_for_user};

use uuid::Uuid;

use crate::error::TradeError;
use crate::settlement::TradeStore;
use crate::types::position::Position;
use crate::types::trade::Trade;

/// Live storage strategy: every settlement step lands in Postgres as its own
/// statement. The journal, ledger, and balance writes are not wrapped in a
/// transaction, and reads carry no version, so concurrent trades on the same
/// position can lose updates.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres, size the pool, and bring the schema up to date
    /// before serving anything.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl TradeStore for PgStore {
    async fn balance(&self, user_id: Uuid) -> Result<f64, TradeError> {
        Ok(get_balance(&self.pool, user_id).await?)
    }

    async fn set_balance(&self, user_id: Uuid, balance: f64) -> Result<(), TradeError> {
        Ok(update_balance(&self.pool, user_id, balance).await?)
    }

    async fn position(&self, user_id: Uuid, symbol: &str) -> Result<Option<Position>, TradeError> {
        Ok(get_position(&self.pool, user_id, symbol).await?)
    }

    async fn upsert_position(&self, position: &Position) -> Result<(), TradeError> {
        Ok(upsert_position(&self.pool, position).await?)
    }

    async fn delete_position(&self, user_id: Uuid, symbol: &str) -> Result<(), TradeError> {
        Ok(delete_position(&self.pool, user_id, symbol).await?)
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), TradeError> {
        Ok(insert_trade(&self.pool, trade).await?)
    }

    async fn recent_trades(&self, user_id: Uuid, limit: usize) -> Result<Vec<Trade>, TradeError> {
        Ok(list_trades_for_user(&self.pool, user_id, limit).await?)
    }

    async fn positions(&self, user_id: Uuid) -> Result<Vec<Position>, TradeError> {
        Ok(list_positions_for_user(&self.pool, user_id).await?)
    }
}
