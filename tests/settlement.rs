//! Settlement workflow tests: the pipeline run end to end against the
//! in-memory store with a no-op delay simulator.

use simbroker::demo::DemoSession;
use simbroker::error::TradeError;
use simbroker::settlement::tamg;
use simbroker::settlement::{
    apply_trade, settle_trade, InstantSimulator, TradeIntent, TradeStore,
};
use simbroker::types::asset::AssetClass;
use simbroker::types::position::Position;
use simbroker::types::trade::TradeSide;
use uuid::Uuid;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn intent(
    user_id: Uuid,
    symbol: &str,
    side: TradeSide,
    class: AssetClass,
    shares: f64,
    price: f64,
) -> TradeIntent {
    TradeIntent {
        user_id,
        symbol: symbol.to_string(),
        side,
        asset_class: class,
        shares,
        price_per_share: price,
    }
}

#[tokio::test]
async fn buy_writes_journal_ledger_and_balance() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 1000.0);

    let settled = settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 2.0, 100.0),
    )
    .await
    .unwrap();

    assert!(approx(settled.balance, 799.80));
    assert!(approx(session.balance(user_id).await.unwrap(), 799.80));

    let pos = session.position(user_id, "AAPL").await.unwrap().unwrap();
    assert!(approx(pos.shares, 2.0));
    assert!(approx(pos.average_price, 100.0));

    let journal = session.recent_trades(user_id, 50).await.unwrap();
    assert_eq!(journal.len(), 1);
    assert_eq!(journal[0].symbol, "AAPL");
    assert!(approx(journal[0].total_amount, -200.20));
}

#[tokio::test]
async fn journal_is_newest_first() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 10_000.0);

    for price in [100.0, 110.0, 120.0] {
        settle_trade(
            &session,
            &InstantSimulator,
            &intent(user_id, "MSFT", TradeSide::Buy, AssetClass::Stock, 1.0, price),
        )
        .await
        .unwrap();
    }

    let journal = session.recent_trades(user_id, 50).await.unwrap();
    assert_eq!(journal.len(), 3);
    assert!(approx(journal[0].price_per_share, 120.0));
    assert!(approx(journal[2].price_per_share, 100.0));
}

#[tokio::test]
async fn rejected_trade_leaves_no_trace() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 50.0);

    let err = settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 1.0, 100.0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientBalance { .. }));

    assert!(approx(session.balance(user_id).await.unwrap(), 50.0));
    assert!(session.position(user_id, "AAPL").await.unwrap().is_none());
    assert!(session.recent_trades(user_id, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn oversell_rejected_without_mutation() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 1000.0);

    settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 2.0, 100.0),
    )
    .await
    .unwrap();

    let err = settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Sell, AssetClass::Stock, 5.0, 100.0),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, TradeError::InsufficientShares { .. }));

    let pos = session.position(user_id, "AAPL").await.unwrap().unwrap();
    assert!(approx(pos.shares, 2.0));
    assert_eq!(session.recent_trades(user_id, 50).await.unwrap().len(), 1);
}

#[tokio::test]
async fn full_liquidation_deletes_position() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 1000.0);

    settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 2.0, 100.0),
    )
    .await
    .unwrap();
    let settled = settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "AAPL", TradeSide::Sell, AssetClass::Stock, 2.0, 130.0),
    )
    .await
    .unwrap();

    assert!(settled.position.is_none());
    assert!(session.position(user_id, "AAPL").await.unwrap().is_none());
    assert!(session.positions(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn crypto_path_settles_through_waiting_phase() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 100_000.0);

    let settled = settle_trade(
        &session,
        &InstantSimulator,
        &intent(user_id, "BTC", TradeSide::Buy, AssetClass::Crypto, 0.5, 64_000.0),
    )
    .await
    .unwrap();

    assert!(approx(settled.trade.fee, 32_000.0 * 0.0015));
    let pos = session.position(user_id, "BTC").await.unwrap().unwrap();
    assert!(approx(pos.shares, 0.5));
}

#[tokio::test]
async fn tamg_subscribe_and_liquidate() {
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 500.0);

    let bought = tamg::subscribe(&session, &InstantSimulator, user_id, 12.5, 10.0)
        .await
        .unwrap();
    // No commission on TAMG: exactly shares * unit price moves.
    assert!(approx(bought.trade.fee, 0.0));
    assert!(approx(bought.balance, 500.0 - 125.0));
    let pos = session.position(user_id, "TAMG").await.unwrap().unwrap();
    assert!(approx(pos.shares, 12.5));
    assert!(approx(pos.average_price, 10.0));

    // Partial liquidation keeps the basis, full liquidation deletes the row.
    let partial = tamg::liquidate(&session, &InstantSimulator, user_id, 2.5, 12.0)
        .await
        .unwrap();
    let pos = partial.position.unwrap();
    assert!(approx(pos.shares, 10.0));
    assert!(approx(pos.average_price, 10.0));

    let full = tamg::liquidate(&session, &InstantSimulator, user_id, 10.0, 12.0)
        .await
        .unwrap();
    assert!(full.position.is_none());
    assert!(approx(full.balance, 500.0 - 125.0 + 30.0 + 120.0));
    assert!(session.position(user_id, "TAMG").await.unwrap().is_none());
}

#[tokio::test]
async fn pipeline_matches_pure_law() {
    // The workflow must apply exactly the accounting law, whatever the
    // storage strategy. Fold the same sequence through apply_trade and
    // through settle_trade and compare outcomes.
    let user_id = Uuid::new_v4();
    let session = DemoSession::new(user_id, 25_000.0);
    let sequence = [
        intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 2.0, 100.0),
        intent(user_id, "AAPL", TradeSide::Buy, AssetClass::Stock, 3.0, 120.0),
        intent(user_id, "ETH", TradeSide::Buy, AssetClass::Crypto, 1.5, 3_000.0),
        intent(user_id, "AAPL", TradeSide::Sell, AssetClass::Stock, 4.0, 130.0),
        intent(user_id, "ETH", TradeSide::Sell, AssetClass::Crypto, 1.5, 3_100.0),
    ];

    let mut balance = 25_000.0;
    let mut positions: std::collections::HashMap<String, Position> = Default::default();
    for intent in &sequence {
        let settled = apply_trade(positions.get(&intent.symbol), balance, intent).unwrap();
        balance = settled.balance;
        match settled.position {
            Some(pos) => {
                positions.insert(intent.symbol.clone(), pos);
            }
            None => {
                positions.remove(&intent.symbol);
            }
        }

        settle_trade(&session, &InstantSimulator, intent).await.unwrap();
    }

    assert!(approx(session.balance(user_id).await.unwrap(), balance));
    let stored = session.positions(user_id).await.unwrap();
    assert_eq!(stored.len(), positions.len());
    for pos in stored {
        let expected = &positions[&pos.symbol];
        assert!(approx(pos.shares, expected.shares));
        assert!(approx(pos.average_price, expected.average_price));
    }
}
