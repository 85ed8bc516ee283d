//! The settlement pipeline: input → processing → verifying → (waiting) →
//! complete. Linear and non-resumable; nothing is persisted between phases.

use std::time::Duration;

use tokio::time::Instant;

use crate::error::TradeError;
use crate::settlement::accounting::{apply_trade, Settled};
use crate::settlement::simulator::SettlementSimulator;
use crate::settlement::{TradeIntent, TradeStore};
use crate::types::asset::AssetClass;

/// Phases of one settlement run, in order. `Input` validation failures exit
/// back to the caller before any other phase is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementPhase {
    Input,
    Processing,
    Verifying,
    Waiting,
    Complete,
}

/// Elapsed time past which the crypto waiting phase logs a backlog hint.
const BACKLOG_HINT_AFTER: Duration = Duration::from_secs(5);

/// Run one trade through the full pipeline against the given store.
///
/// Validation happens against a snapshot read up front; the delay phases run
/// on the already-computed outcome. The journal insert comes first, then the
/// ledger upsert/delete, then the balance write. These are three separate
/// statements, not one transaction. A failure after the journal insert leaves the
/// journal ahead of the ledger, and two concurrent trades on the same
/// position can both settle from the same snapshot (lost update).
pub async fn settle_trade<S, M>(
    store: &S,
    simulator: &M,
    intent: &TradeIntent,
) -> Result<Settled, TradeError>
where
    S: TradeStore,
    M: SettlementSimulator,
{
    let started = Instant::now();

    // input: snapshot, fee math, affordability / holdings checks.
    let balance = store.balance(intent.user_id).await?;
    let position = store.position(intent.user_id, &intent.symbol).await?;
    let settled = apply_trade(position.as_ref(), balance, intent)?;
    tracing::debug!(
        symbol = %intent.symbol,
        side = ?intent.side,
        shares = intent.shares,
        price = intent.price_per_share,
        fee = settled.trade.fee,
        "order accepted, entering settlement"
    );

    tracing::debug!(phase = ?SettlementPhase::Processing, "settlement phase");
    simulator.processing().await;

    tracing::debug!(phase = ?SettlementPhase::Verifying, "settlement phase");
    simulator.verifying().await;

    if intent.asset_class == AssetClass::Crypto {
        tracing::debug!(phase = ?SettlementPhase::Waiting, "settlement phase");
        simulator.waiting().await;
        if started.elapsed() > BACKLOG_HINT_AFTER {
            tracing::info!(
                symbol = %intent.symbol,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "confirmation queue running slow"
            );
        }
    }

    store.insert_trade(&settled.trade).await?;
    match &settled.position {
        Some(position) => store.upsert_position(position).await?,
        None => store.delete_position(intent.user_id, &intent.symbol).await?,
    }
    store.set_balance(intent.user_id, settled.balance).await?;

    tracing::info!(
        trade_id = %settled.trade.id,
        symbol = %intent.symbol,
        side = ?intent.side,
        total = settled.trade.total_amount,
        balance = settled.balance,
        phase = ?SettlementPhase::Complete,
        "trade settled"
    );
    Ok(settled)
}
