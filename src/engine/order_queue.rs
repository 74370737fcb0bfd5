//! One side of a product's book: price levels ordered by marketability.

use crate::engine::entry::{OrderEntry, OrderEntryStore};
use crate::engine::execution::{Execution, OrderStat};
use crate::engine::keyed_heap::KeyedHeap;
use crate::engine::order::{OrderPrice, PriceKey};
use crate::engine::price_queue::PriceOrderQueue;
use tracing::debug;

/// A side book: every price level on one side, most marketable on top.
///
/// The market-order level (if any) always outranks the limit levels; among
/// limit levels, higher bids and lower asks come first. Aggregate counts
/// and volumes are kept both as grand totals and split into market/limit
/// subtotals, which the auction-feasibility predicate relies on.
#[derive(Debug, Clone)]
pub struct OrderQueue {
    heap: KeyedHeap<PriceKey, PriceOrderQueue>,
    count: u64,
    volume: u64,
    market_order_count: u64,
    market_order_volume: u64,
    limit_order_count: u64,
    limit_order_volume: u64,
    next_price: Option<f64>,
}

impl Default for OrderQueue {
    fn default() -> Self {
        OrderQueue::new()
    }
}

impl OrderQueue {
    /// Creates an empty side book.
    pub fn new() -> Self {
        OrderQueue {
            heap: KeyedHeap::new(),
            count: 0,
            volume: 0,
            market_order_count: 0,
            market_order_volume: 0,
            limit_order_count: 0,
            limit_order_volume: 0,
            next_price: None,
        }
    }

    /// Live order count across all levels.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Open quantity across all levels.
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// Live market-order count.
    pub fn market_order_count(&self) -> u64 {
        self.market_order_count
    }

    /// Open market-order quantity.
    pub fn market_order_volume(&self) -> u64 {
        self.market_order_volume
    }

    /// Live limit-order count.
    pub fn limit_order_count(&self) -> u64 {
        self.limit_order_count
    }

    /// Open limit-order quantity.
    pub fn limit_order_volume(&self) -> u64 {
        self.limit_order_volume
    }

    /// The price of the top limit level, ignoring the market-order level.
    pub fn next_price(&self) -> Option<f64> {
        self.next_price
    }

    /// `true` when the book holds no levels.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The underlying level heap, most marketable level on top.
    pub fn heap(&self) -> &KeyedHeap<PriceKey, PriceOrderQueue> {
        &self.heap
    }

    fn update_stats(&mut self, delta_count: i64, delta_volume: i64, is_market_order: bool) {
        self.count = self
            .count
            .checked_add_signed(delta_count)
            .expect("order count must not go negative");
        self.volume = self
            .volume
            .checked_add_signed(delta_volume)
            .expect("order volume must not go negative");
        if is_market_order {
            self.market_order_count = self
                .market_order_count
                .checked_add_signed(delta_count)
                .expect("market order count must not go negative");
            self.market_order_volume = self
                .market_order_volume
                .checked_add_signed(delta_volume)
                .expect("market order volume must not go negative");
        } else {
            self.limit_order_count = self
                .limit_order_count
                .checked_add_signed(delta_count)
                .expect("limit order count must not go negative");
            self.limit_order_volume = self
                .limit_order_volume
                .checked_add_signed(delta_volume)
                .expect("limit order volume must not go negative");
        }
    }

    fn update_next_price(&mut self) {
        if self.heap.is_empty() {
            self.next_price = None;
        } else {
            let top_price = self
                .heap
                .peek_value()
                .expect("heap is non-empty")
                .price();
            if let Some(price) = top_price.limit() {
                self.next_price = Some(price);
            } else {
                // The market-order level hides the best limit; set it aside
                // to look one level deeper, then restore it.
                let (key, child) = self.heap.pop().expect("heap is non-empty");
                self.next_price = self
                    .heap
                    .peek_value()
                    .ok()
                    .and_then(|next| next.price().limit());
                self.heap
                    .push(key, child)
                    .expect("key was just popped off the heap");
            }
        }
    }

    /// Drops exhausted levels off the top of the heap.
    pub fn pop_empty_values(&mut self) {
        while let Ok(child) = self.heap.peek_value() {
            if child.is_empty() || child.volume() == 0 {
                let _ = self.heap.pop();
            } else {
                break;
            }
        }
    }

    /// Books `entry` into the level for its price, creating the level if
    /// needed, and refreshes the aggregate stats and `next_price`.
    pub fn push(&mut self, entry: &OrderEntry) {
        let price_key = PriceKey::new(entry.side(), entry.price());

        if let Some(child) = self.heap.get_mut(&price_key) {
            child.push(entry);
        } else {
            let mut child = PriceOrderQueue::new(entry.price());
            child.push(entry);
            self.heap
                .push(price_key, child)
                .expect("price key was just checked vacant");
        }

        self.update_stats(1, entry.remaining() as i64, entry.price().is_market());
        self.update_next_price();
    }

    /// Cancels `entry` in its level.
    ///
    /// Stats are deducted before delegating, while the entry still carries
    /// its open quantity. The vacated level is left in place until the next
    /// match round drains it.
    pub fn cancel(&mut self, entry: &mut OrderEntry) {
        let price_key = PriceKey::new(entry.side(), entry.price());

        self.update_stats(-1, -(entry.remaining() as i64), entry.price().is_market());
        self.update_next_price();

        let child = self
            .heap
            .get_mut(&price_key)
            .expect("order entry must have a level for its price key");
        child.cancel(entry);
    }

    /// Whether a match round between this (bid) book and `ask_queue` could
    /// determine an execution price.
    ///
    /// Market orders alone cannot anchor a price. With equal market-order
    /// volume on both sides, each side needs limit volume and the best
    /// limits must cross. With surplus market-order volume on one side,
    /// the other side must hold limit volume to absorb the surplus.
    pub fn can_execute(&self, ask_queue: &OrderQueue) -> bool {
        let bid_queue = self;

        if bid_queue.market_order_volume == ask_queue.market_order_volume {
            if bid_queue.limit_order_volume == 0 || ask_queue.limit_order_volume == 0 {
                return false;
            }
            match (bid_queue.next_price, ask_queue.next_price) {
                (Some(bid_price), Some(ask_price)) => {
                    if bid_price < ask_price {
                        return false;
                    }
                }
                // No limit anchor visible on one of the sides.
                _ => return false,
            }
        } else if bid_queue.market_order_volume < ask_queue.market_order_volume {
            if bid_queue.limit_order_volume == 0 {
                return false;
            }
        } else if ask_queue.limit_order_volume == 0 {
            return false;
        }

        true
    }

    /// Matches this (bid) book against `ask_queue`.
    ///
    /// Walks the tops of both books while they cross, collecting the
    /// executions each level pair produces, then rewrites every execution
    /// to the round's uniform clearing price: the counter-side limit when
    /// the last pair involved a market order, otherwise the midpoint of
    /// the last crossed limits.
    pub fn execute(
        &mut self,
        ask_queue: &mut OrderQueue,
        entries: &mut OrderEntryStore,
    ) -> Vec<Execution> {
        let bid_queue = self;

        if !bid_queue.can_execute(ask_queue) {
            return Vec::new();
        }

        let mut executions: Vec<Execution> = Vec::new();

        while !bid_queue.heap.is_empty() && !ask_queue.heap.is_empty() {
            let bid_level_price = bid_queue
                .heap
                .peek_value()
                .expect("non-empty heap has a top level")
                .price();
            let ask_level_price = ask_queue
                .heap
                .peek_value()
                .expect("non-empty heap has a top level")
                .price();
            if let (OrderPrice::Limit(bid_price), OrderPrice::Limit(ask_price)) =
                (bid_level_price, ask_level_price)
            {
                if bid_price < ask_price {
                    break;
                }
            }

            let bid_child = bid_queue
                .heap
                .peek_value_mut()
                .expect("non-empty heap has a top level");
            let ask_child = ask_queue
                .heap
                .peek_value_mut()
                .expect("non-empty heap has a top level");

            let child_executions = bid_child.execute(ask_child, entries);

            bid_queue.pop_empty_values();
            ask_queue.pop_empty_values();

            executions.extend(child_executions);
        }

        assert!(
            !executions.is_empty(),
            "feasible book produced no executions; can_execute is out of step"
        );

        let last = executions.last().expect("at least one execution");
        let price = match (last.bid_fill.price, last.ask_fill.price) {
            (None, ask_price) => ask_price,
            (bid_price, None) => bid_price,
            (Some(bid_price), Some(ask_price)) => Some((bid_price + ask_price) / 2.0),
        }
        .expect("uniform clearing price must be determined");

        debug!(
            "clearing round: {} executions at uniform price {}",
            executions.len(),
            price
        );

        for execution in executions.iter_mut() {
            let bid_delta = if execution.bid_fill.completes_order() { -1 } else { 0 };
            let ask_delta = if execution.ask_fill.completes_order() { -1 } else { 0 };
            bid_queue.update_stats(
                bid_delta,
                -(execution.quantity as i64),
                execution.bid_fill.order_price.is_market(),
            );
            ask_queue.update_stats(
                ask_delta,
                -(execution.quantity as i64),
                execution.ask_fill.order_price.is_market(),
            );
            execution.set_uniform_price(price);
        }

        bid_queue.update_next_price();
        ask_queue.update_next_price();

        executions
    }

    /// Depth of book in marketability order, skipping exhausted levels.
    pub fn order_book(&self) -> Vec<OrderStat> {
        self.heap
            .values()
            .filter(|child| child.volume() > 0)
            .map(|child| OrderStat::new(child.price(), child.volume(), child.count()))
            .collect()
    }
}
