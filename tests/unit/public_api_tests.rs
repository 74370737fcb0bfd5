//! End-to-end flows through the public crate surface.

use matchbook_rs::prelude::*;

#[test]
fn test_continuous_trading_session() {
    let mut market = Market::new();

    market.place_limit_order(Side::Buy, "ACME", 10, 100.0).unwrap();
    market.place_limit_order(Side::Buy, "ACME", 10, 110.0).unwrap();
    market.place_limit_order(Side::Sell, "ACME", 10, 120.0).unwrap();

    // Nothing crosses yet.
    assert!(market.execute().is_empty());

    let executions = market
        .execute_limit_order(Side::Sell, "ACME", 10, 110.0)
        .unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].quantity, 10);
    assert_eq!(executions[0].price, Some(110.0));

    let product = market.product("ACME").unwrap();
    assert_eq!(product.bid_price(), Some(100.0));
    assert_eq!(product.ask_price(), Some(120.0));
    assert_eq!(product.last_price(), Some(110.0));
}

#[test]
fn test_cancel_with_bare_order_id() {
    let mut market = Market::new();
    market
        .place(Order::limit(Side::Buy, "ACME", 10, 120.0).with_id("order1"))
        .unwrap();

    // A fresh order carrying only the id is enough to cancel.
    let bare = Order::market(Side::Buy, "ACME", 1).with_id("order1");
    market.cancel(&bare).unwrap();

    assert_eq!(
        market.entry(&"order1".into()).unwrap().state(),
        OrderState::Cancelled
    );
}

#[test]
fn test_error_display_messages() {
    let mut market = Market::new();

    let err = market.cancel_by_id(&"missing".into()).unwrap_err();
    assert_eq!(err.to_string(), "no such order id: missing");

    market
        .place(Order::market(Side::Buy, "ACME", 10).with_id("dup"))
        .unwrap();
    let err = market
        .place(Order::market(Side::Buy, "ACME", 10).with_id("dup"))
        .unwrap_err();
    assert_eq!(err.to_string(), "duplicate order id: dup");

    let err = market.ensure_product("").unwrap_err();
    assert_eq!(err.to_string(), "symbol must be specified");

    let err = "sideways".parse::<Side>().unwrap_err();
    assert_eq!(err.to_string(), "invalid side name: sideways");
}

#[test]
fn test_side_round_trips() {
    assert_eq!(Side::try_from(Side::Buy.ordinal()).unwrap(), Side::Buy);
    assert_eq!(Side::try_from(Side::Sell.ordinal()).unwrap(), Side::Sell);
    assert_eq!(Side::Buy.to_string().parse::<Side>().unwrap(), Side::Buy);
    assert_eq!(Side::Sell.to_string().parse::<Side>().unwrap(), Side::Sell);
}

#[test]
fn test_execution_payload_serializes() {
    let mut market = Market::new();
    market
        .place(Order::limit(Side::Buy, "ACME", 10, 120.0).with_time(1.0).with_id("bid"))
        .unwrap();
    let executions = market
        .execute_order(Order::market(Side::Sell, "ACME", 10).with_time(2.0).with_id("ask"))
        .unwrap();

    let json = serde_json::to_value(&executions).unwrap();
    assert_eq!(json[0]["quantity"], 10);
    assert_eq!(json[0]["price"], 120.0);
    assert_eq!(json[0]["bid_fill"]["order_id"], "bid");
    assert_eq!(json[0]["ask_fill"]["order_id"], "ask");
    assert_eq!(json[0]["ask_fill"]["cumulative_quantity"], 10);
}

#[test]
fn test_injected_clock_orders_share_a_bucket() {
    use std::sync::Arc;

    // A frozen clock puts every unstamped order in the same time bucket,
    // so a crossing market order is split pro-rata.
    let mut market = Market::with_time_source(Arc::new(|| 42.0));
    market.place_limit_order(Side::Sell, "ACME", 10, 120.0).unwrap();
    market.place_limit_order(Side::Sell, "ACME", 30, 120.0).unwrap();

    let executions = market.execute_market_order(Side::Buy, "ACME", 20).unwrap();
    let quantities: Vec<u64> = executions.iter().map(|e| e.quantity).collect();
    assert_eq!(quantities, vec![5, 15]);
    assert!(executions.iter().all(|e| e.price == Some(120.0)));
}

#[test]
fn test_products_are_isolated() {
    let mut market = Market::new();
    market.place_limit_order(Side::Buy, "ACME", 10, 120.0).unwrap();
    market.place_limit_order(Side::Sell, "WIDG", 10, 100.0).unwrap();

    // Orders on different symbols never meet.
    assert!(market.execute().is_empty());
    assert_eq!(market.product("ACME").unwrap().order_queue(Side::Buy).volume(), 10);
    assert_eq!(market.product("WIDG").unwrap().order_queue(Side::Sell).volume(), 10);
}
