//! Pure accounting law tests: weighted average cost, fees, affordability,
//! balance conservation.

use simbroker::error::TradeError;
use simbroker::settlement::{apply_trade, cost_breakdown, TradeIntent};
use simbroker::types::asset::AssetClass;
use simbroker::types::position::Position;
use simbroker::types::trade::TradeSide;
use uuid::Uuid;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn intent(side: TradeSide, class: AssetClass, shares: f64, price: f64) -> TradeIntent {
    TradeIntent {
        user_id: Uuid::nil(),
        symbol: "AAPL".to_string(),
        side,
        asset_class: class,
        shares,
        price_per_share: price,
    }
}

fn buy(shares: f64, price: f64) -> TradeIntent {
    intent(TradeSide::Buy, AssetClass::Stock, shares, price)
}

fn sell(shares: f64, price: f64) -> TradeIntent {
    intent(TradeSide::Sell, AssetClass::Stock, shares, price)
}

// --- Fee rates ---

#[test]
fn equity_fee_is_ten_bps() {
    let costs = cost_breakdown(TradeSide::Buy, 2.0, 100.0, AssetClass::Stock.fee_rate());
    assert!(approx(costs.subtotal, 200.0));
    assert!(approx(costs.fee, 0.20));
    assert!(approx(costs.grand_total, 200.20));
}

#[test]
fn crypto_fee_is_fifteen_bps() {
    let costs = cost_breakdown(TradeSide::Buy, 1.0, 10_000.0, AssetClass::Crypto.fee_rate());
    assert!(approx(costs.fee, 15.0));
    assert!(approx(costs.grand_total, 10_015.0));
}

#[test]
fn sell_grand_total_subtracts_fee() {
    let costs = cost_breakdown(TradeSide::Sell, 5.0, 130.0, AssetClass::Stock.fee_rate());
    assert!(approx(costs.subtotal, 650.0));
    assert!(approx(costs.fee, 0.65));
    assert!(approx(costs.grand_total, 649.35));
}

#[test]
fn tamg_carries_no_fee() {
    let costs = cost_breakdown(TradeSide::Buy, 3.0, 10.0, AssetClass::Tamg.fee_rate());
    assert!(approx(costs.fee, 0.0));
    assert!(approx(costs.grand_total, 30.0));
}

// --- End-to-end scenarios ---

#[test]
fn scenario_a_first_buy() {
    let settled = apply_trade(None, 1000.0, &buy(2.0, 100.0)).unwrap();
    assert!(approx(settled.trade.fee, 0.20));
    assert!(approx(settled.trade.total_amount, -200.20));
    assert!(approx(settled.balance, 799.80));
    let pos = settled.position.unwrap();
    assert!(approx(pos.shares, 2.0));
    assert!(approx(pos.average_price, 100.0));
}

#[test]
fn scenario_b_weighted_average_on_second_buy() {
    let a = apply_trade(None, 1000.0, &buy(2.0, 100.0)).unwrap();
    let b = apply_trade(a.position.as_ref(), a.balance, &buy(3.0, 120.0)).unwrap();
    let pos = b.position.unwrap();
    assert!(approx(pos.shares, 5.0));
    assert!(approx(pos.average_price, 112.0));
}

#[test]
fn scenario_c_full_liquidation() {
    let a = apply_trade(None, 1000.0, &buy(2.0, 100.0)).unwrap();
    let b = apply_trade(a.position.as_ref(), a.balance, &buy(3.0, 120.0)).unwrap();
    let c = apply_trade(b.position.as_ref(), b.balance, &sell(5.0, 130.0)).unwrap();
    assert!(approx(c.trade.fee, 0.65));
    assert!(approx(c.trade.total_amount, 649.35));
    assert!(approx(c.balance, b.balance + 649.35));
    assert!(c.position.is_none());
}

#[test]
fn insufficient_funds_rejected_without_mutation() {
    let err = apply_trade(None, 50.0, &buy(1.0, 100.0)).unwrap_err();
    assert!(matches!(err, TradeError::InsufficientBalance { .. }));
}

// --- Invariants ---

#[test]
fn weighted_average_is_order_independent() {
    let lots = [(2.0, 100.0), (3.0, 120.0), (0.5, 95.0), (10.0, 101.25)];
    let mut reversed = lots;
    reversed.reverse();

    let run = |seq: &[(f64, f64)]| {
        let mut position: Option<Position> = None;
        let mut balance = 1_000_000.0;
        for (shares, price) in seq {
            let settled = apply_trade(position.as_ref(), balance, &buy(*shares, *price)).unwrap();
            position = settled.position;
            balance = settled.balance;
        }
        position.unwrap()
    };

    let forward = run(&lots);
    let backward = run(&reversed);

    let total_shares: f64 = lots.iter().map(|(q, _)| q).sum();
    let expected_avg: f64 = lots.iter().map(|(q, p)| q * p).sum::<f64>() / total_shares;
    assert!(approx(forward.shares, total_shares));
    assert!(approx(forward.average_price, expected_avg));
    assert!(approx(backward.average_price, expected_avg));
}

#[test]
fn sell_never_changes_average_cost() {
    let a = apply_trade(None, 10_000.0, &buy(10.0, 50.0)).unwrap();
    let b = apply_trade(a.position.as_ref(), a.balance, &buy(10.0, 70.0)).unwrap();
    let before = b.position.as_ref().unwrap().average_price;
    let c = apply_trade(b.position.as_ref(), b.balance, &sell(5.0, 90.0)).unwrap();
    let pos = c.position.unwrap();
    assert!(approx(pos.average_price, before));
    assert!(approx(pos.shares, 15.0));
}

#[test]
fn selling_more_than_held_is_rejected() {
    let a = apply_trade(None, 1000.0, &buy(2.0, 100.0)).unwrap();
    let err = apply_trade(a.position.as_ref(), a.balance, &sell(3.0, 100.0)).unwrap_err();
    assert!(matches!(
        err,
        TradeError::InsufficientShares {
            requested,
            held
        } if approx(requested, 3.0) && approx(held, 2.0)
    ));
}

#[test]
fn selling_without_position_is_rejected() {
    let err = apply_trade(None, 1000.0, &sell(1.0, 100.0)).unwrap_err();
    assert!(matches!(err, TradeError::NoPosition(_)));
}

#[test]
fn non_positive_quantity_rejected_for_all_classes() {
    for class in [AssetClass::Stock, AssetClass::Crypto, AssetClass::Tamg] {
        for shares in [0.0, -1.0, f64::NAN] {
            let err =
                apply_trade(None, 1000.0, &intent(TradeSide::Buy, class, shares, 10.0)).unwrap_err();
            assert!(matches!(err, TradeError::NonPositiveQuantity));
        }
    }
}

#[test]
fn non_positive_price_rejected() {
    let err = apply_trade(None, 1000.0, &buy(1.0, 0.0)).unwrap_err();
    assert!(matches!(err, TradeError::NonPositivePrice));
}

#[test]
fn balance_conservation_round_trip() {
    let start = 5000.0;
    let a = apply_trade(None, start, &buy(4.0, 250.0)).unwrap();
    assert!(approx(a.balance, start - (1000.0 + 1.0)));
    let b = apply_trade(a.position.as_ref(), a.balance, &sell(4.0, 250.0)).unwrap();
    assert!(approx(b.balance, a.balance + (1000.0 - 1.0)));
    // Round trip at an unchanged price costs exactly the two fees.
    assert!(approx(start - b.balance, 2.0));
}

#[test]
fn unrealized_pnl_tracks_cost_basis() {
    let settled = apply_trade(None, 10_000.0, &buy(10.0, 50.0)).unwrap();
    let pos = settled.position.unwrap();
    assert!(approx(pos.unrealized_pnl(52.0), 20.0));
    assert!(approx(pos.unrealized_pnl(48.0), -20.0));
    assert!(approx(pos.market_value(52.0), 520.0));
}

#[test]
fn fractional_crypto_shares_settle() {
    let settled = apply_trade(
        None,
        1000.0,
        &intent(TradeSide::Buy, AssetClass::Crypto, 0.015, 64_000.0),
    )
    .unwrap();
    let pos = settled.position.unwrap();
    assert!(approx(pos.shares, 0.015));
    assert!(approx(settled.trade.fee, 960.0 * 0.0015));
}
