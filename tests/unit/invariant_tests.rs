//! Property-based tests for book and allocator invariants.
//!
//! These tests use proptest to verify that the aggregate statistics, the
//! uniform clearing price and the pro-rata allocator hold up across
//! randomly generated order streams.

use matchbook_rs::prelude::*;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Generate a side.
fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

/// Generate a price: market, or a limit on a 5-unit grid around 100.
fn price_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        4 => (19u32..=28).prop_map(|tick| Some(tick as f64 * 5.0)),
    ]
}

/// Generate a quantity.
fn quantity_strategy() -> impl Strategy<Value = u64> {
    1u64..=50
}

/// Generate an arrival timestamp from a small set so that same-time
/// buckets actually occur.
fn time_strategy() -> impl Strategy<Value = f64> {
    (0u8..3).prop_map(f64::from)
}

fn order_strategy() -> impl Strategy<Value = (Side, Option<f64>, u64, f64)> {
    (
        side_strategy(),
        price_strategy(),
        quantity_strategy(),
        time_strategy(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// After an auction round: every entry's open quantity accounts for
    /// its fills, the aggregate stats are mutually consistent, all
    /// executions share one price, and a second round is a no-op.
    #[test]
    fn book_invariants_hold_after_auction(
        orders in prop::collection::vec(order_strategy(), 1..40)
    ) {
        let mut market = Market::new();
        let mut placed: Vec<(OrderId, u64)> = Vec::new();

        for (index, (side, price, quantity, time)) in orders.into_iter().enumerate() {
            let order = Order::new(side, "abc", quantity, OrderPrice::from(price))
                .with_time(time)
                .with_id(format!("order-{index}"));
            let order_id = market.place(order).unwrap();
            placed.push((order_id, quantity));
        }

        let product = market.product("abc").unwrap();
        let pre_bid_volume = product.order_queue(Side::Buy).volume();
        let pre_ask_volume = product.order_queue(Side::Sell).volume();

        let executions = market.execute();

        // One uniform clearing price per round.
        if let Some(first) = executions.first() {
            prop_assert!(first.price.is_some());
            for execution in &executions {
                prop_assert_eq!(execution.price, first.price);
                prop_assert_eq!(execution.bid_fill.price, first.price);
                prop_assert_eq!(execution.ask_fill.price, first.price);
                prop_assert_eq!(execution.bid_fill.quantity, execution.quantity);
                prop_assert_eq!(execution.ask_fill.quantity, execution.quantity);
            }
        }

        // Per-order fill accounting.
        let mut filled: HashMap<OrderId, u64> = HashMap::new();
        for execution in &executions {
            *filled.entry(execution.bid_fill.order_id.clone()).or_default() += execution.quantity;
            *filled.entry(execution.ask_fill.order_id.clone()).or_default() += execution.quantity;
        }
        for (order_id, quantity) in &placed {
            let entry = market.entry(order_id).unwrap();
            let total = filled.get(order_id).copied().unwrap_or(0);
            prop_assert_eq!(entry.remaining(), quantity - total);
        }

        // Aggregate stats agree with each other and with the depth.
        for side in [Side::Buy, Side::Sell] {
            let queue = market.product("abc").unwrap().order_queue(side);
            prop_assert_eq!(
                queue.count(),
                queue.market_order_count() + queue.limit_order_count()
            );
            prop_assert_eq!(
                queue.volume(),
                queue.market_order_volume() + queue.limit_order_volume()
            );

            let depth = queue.order_book();
            prop_assert_eq!(depth.iter().map(|stat| stat.volume).sum::<u64>(), queue.volume());
            prop_assert_eq!(depth.iter().map(|stat| stat.count).sum::<u64>(), queue.count());

            // Marketability order: the market level (if any) leads, then
            // strictly improving limit prices.
            let limits: Vec<f64> = depth.iter().filter_map(|stat| stat.price.limit()).collect();
            if depth.len() > limits.len() {
                prop_assert!(depth[0].price.is_market());
            }
            for pair in limits.windows(2) {
                match side {
                    Side::Buy => prop_assert!(pair[0] > pair[1]),
                    Side::Sell => prop_assert!(pair[0] < pair[1]),
                }
            }
        }

        // Executed volume is bounded by what each side brought in.
        let total: u64 = executions.iter().map(|execution| execution.quantity).sum();
        prop_assert!(total <= pre_bid_volume);
        prop_assert!(total <= pre_ask_volume);

        // The round left nothing crossed behind.
        prop_assert!(market.execute().is_empty());
    }

    /// The allocator hits the target exactly, covers every live entry,
    /// and is deterministic.
    #[test]
    fn allocator_conserves_target(
        quantities in prop::collection::vec(1u64..1000, 1..20),
        target_ratio in 0.0f64..=1.0
    ) {
        let mut entries = OrderEntryStore::new();
        let mut queue = TimeOrderQueue::new(0.0);
        for (index, quantity) in quantities.iter().enumerate() {
            let order = Order::limit(Side::Buy, "abc", *quantity, 100.0)
                .with_time(0.0)
                .with_id(format!("order-{index}"));
            let entry = OrderEntry::with_time(Arc::new(order), 0.0);
            queue.push(&entry);
            entries.insert(entry.order_id().clone(), entry);
        }

        let volume: u64 = quantities.iter().sum();
        let target = (volume as f64 * target_ratio) as u64;

        let allocations = queue.allocate(target, &entries);
        prop_assert_eq!(allocations.len(), quantities.len());
        prop_assert_eq!(
            allocations.iter().map(|allocation| allocation.quantity).sum::<u64>(),
            target
        );

        let again = queue.allocate(target, &entries);
        prop_assert_eq!(allocations, again);
    }

    /// Allocating the full bucket volume hands every entry exactly its
    /// open quantity.
    #[test]
    fn allocator_full_volume_is_identity(
        quantities in prop::collection::vec(1u64..1000, 1..20)
    ) {
        let mut entries = OrderEntryStore::new();
        let mut queue = TimeOrderQueue::new(0.0);
        for (index, quantity) in quantities.iter().enumerate() {
            let order = Order::limit(Side::Sell, "abc", *quantity, 100.0)
                .with_time(0.0)
                .with_id(format!("order-{index}"));
            let entry = OrderEntry::with_time(Arc::new(order), 0.0);
            queue.push(&entry);
            entries.insert(entry.order_id().clone(), entry);
        }

        let volume: u64 = quantities.iter().sum();
        let allocations = queue.allocate(volume, &entries);
        let allocated: Vec<u64> = allocations.iter().map(|allocation| allocation.quantity).collect();
        prop_assert_eq!(allocated, quantities);
    }
}

#[test]
fn place_then_cancel_restores_side_book_stats() {
    let mut market = Market::new();
    market
        .place(Order::limit(Side::Buy, "abc", 10, 110.0).with_id("resting"))
        .unwrap();

    let stats_before = |market: &Market| {
        let queue = market.product("abc").unwrap().order_queue(Side::Buy);
        (
            queue.count(),
            queue.volume(),
            queue.market_order_count(),
            queue.market_order_volume(),
            queue.limit_order_count(),
            queue.limit_order_volume(),
        )
    };

    let before = stats_before(&market);
    market
        .place(Order::limit(Side::Buy, "abc", 25, 115.0).with_id("transient"))
        .unwrap();
    market.cancel_by_id(&"transient".into()).unwrap();

    assert_eq!(stats_before(&market), before);
    assert_eq!(
        market.entry(&"transient".into()).unwrap().state(),
        OrderState::Cancelled
    );
}
