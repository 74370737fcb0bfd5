//! Price levels: time buckets grouped under one price.

use crate::engine::entry::{OrderEntry, OrderEntryStore};
use crate::engine::execution::Execution;
use crate::engine::keyed_heap::KeyedHeap;
use crate::engine::order::OrderPrice;
use crate::engine::time_queue::TimeOrderQueue;
use ordered_float::OrderedFloat;

/// All orders on one side at one price, bucketed by arrival time.
///
/// Buckets are kept in a keyed heap ordered by timestamp, so the earliest
/// bucket is always on top. `count` and `volume` aggregate the live buckets.
#[derive(Debug, Clone)]
pub struct PriceOrderQueue {
    price: OrderPrice,
    heap: KeyedHeap<OrderedFloat<f64>, TimeOrderQueue>,
    count: u64,
    volume: u64,
}

impl PriceOrderQueue {
    /// Creates an empty level for `price`.
    pub fn new(price: OrderPrice) -> Self {
        PriceOrderQueue {
            price,
            heap: KeyedHeap::new(),
            count: 0,
            volume: 0,
        }
    }

    /// The level price (`Market` for the market-order level).
    pub fn price(&self) -> OrderPrice {
        self.price
    }

    /// Live order count at the level.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Open quantity at the level.
    pub fn volume(&self) -> u64 {
        self.volume
    }

    /// `true` when the level holds no buckets.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// The underlying bucket heap, earliest timestamp on top.
    pub fn heap(&self) -> &KeyedHeap<OrderedFloat<f64>, TimeOrderQueue> {
        &self.heap
    }

    /// Routes `entry` to the bucket for its timestamp, creating it if
    /// needed.
    pub fn push(&mut self, entry: &OrderEntry) {
        let time_key = OrderedFloat(entry.time());

        if let Some(child) = self.heap.get_mut(&time_key) {
            child.push(entry);
        } else {
            let mut child = TimeOrderQueue::new(entry.time());
            child.push(entry);
            self.heap
                .push(time_key, child)
                .expect("time key was just checked vacant");
        }

        self.count += 1;
        self.volume += entry.remaining();
    }

    /// Cancels `entry` in its bucket.
    ///
    /// Stats are deducted before delegating, while the entry still carries
    /// its open quantity.
    pub fn cancel(&mut self, entry: &mut OrderEntry) {
        let time_key = OrderedFloat(entry.time());

        self.count -= 1;
        self.volume -= entry.remaining();

        let child = self
            .heap
            .get_mut(&time_key)
            .expect("order entry must have a bucket for its time key");
        child.cancel(entry);
    }

    /// Drops exhausted buckets off the top of the heap.
    pub fn pop_empty_values(&mut self) {
        while let Ok(child) = self.heap.peek_value() {
            if child.is_empty() || child.volume() == 0 {
                let _ = self.heap.pop();
            } else {
                break;
            }
        }
    }

    /// Matches this level (bid side) against `ask_queue` bucket by bucket,
    /// earliest timestamps first, until either side runs out.
    pub fn execute(
        &mut self,
        ask_queue: &mut PriceOrderQueue,
        entries: &mut OrderEntryStore,
    ) -> Vec<Execution> {
        let mut executions = Vec::new();

        while !self.heap.is_empty() && !ask_queue.heap.is_empty() {
            let bid_child = self
                .heap
                .peek_value_mut()
                .expect("non-empty heap has a top bucket");
            let ask_child = ask_queue
                .heap
                .peek_value_mut()
                .expect("non-empty heap has a top bucket");

            let bid_count_before = bid_child.count();
            let ask_count_before = ask_child.count();

            let child_executions = bid_child.execute(ask_child, entries);

            let bid_count_delta = bid_count_before - bid_child.count();
            let ask_count_delta = ask_count_before - ask_child.count();
            self.count -= bid_count_delta;
            ask_queue.count -= ask_count_delta;

            self.pop_empty_values();
            ask_queue.pop_empty_values();

            for execution in &child_executions {
                self.volume -= execution.quantity;
                ask_queue.volume -= execution.quantity;
            }

            executions.extend(child_executions);
        }

        executions
    }
}
