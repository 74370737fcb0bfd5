//! Mutable per-order book state.

use crate::engine::execution::{Execution, Fill};
use crate::engine::order::{Order, OrderId, OrderPrice, OrderState, Side};
use crate::utils::current_time_secs;
use std::collections::HashMap;
use std::sync::Arc;

/// The entry store owned by a product: order id to live book record.
///
/// Time buckets hold [`OrderId`] handles into this map rather than the
/// entries themselves, so the product stays the single owner.
pub type OrderEntryStore = HashMap<OrderId, OrderEntry>;

/// A booked order: a snapshot of the request plus its live fill state.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    order: Arc<Order>,
    time: f64,
    remaining: u64,
    state: OrderState,
}

impl OrderEntry {
    /// Books `order`, stamping it with the current wall-clock time when the
    /// order carries no explicit time.
    pub fn new(order: Arc<Order>) -> Self {
        let time = order.time().unwrap_or_else(current_time_secs);
        OrderEntry::with_time(order, time)
    }

    /// Books `order` with an explicit arrival timestamp.
    ///
    /// The timestamp is only used when the order itself has none.
    pub fn with_time(order: Arc<Order>, time: f64) -> Self {
        let time = order.time().unwrap_or(time);
        let remaining = order.quantity();
        OrderEntry {
            order,
            time,
            remaining,
            state: OrderState::New,
        }
    }

    /// The originating order.
    pub fn order(&self) -> &Arc<Order> {
        &self.order
    }

    /// The order side.
    pub fn side(&self) -> Side {
        self.order.side()
    }

    /// The traded symbol.
    pub fn symbol(&self) -> &str {
        self.order.symbol()
    }

    /// The requested quantity.
    pub fn quantity(&self) -> u64 {
        self.order.quantity()
    }

    /// The order price variant.
    pub fn price(&self) -> OrderPrice {
        self.order.price()
    }

    /// The arrival timestamp the entry was booked under.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The order id.
    pub fn order_id(&self) -> &OrderId {
        self.order.id()
    }

    /// Quantity still open.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// The lifecycle state.
    pub fn state(&self) -> OrderState {
        self.state
    }

    /// Quantity filled so far.
    pub fn filled_quantity(&self) -> u64 {
        self.quantity() - self.remaining
    }

    /// Cancels the entry: zeroes the open quantity and marks it terminal.
    ///
    /// Not idempotent; callers must not cancel an entry that is already
    /// fully filled or cancelled.
    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.state = OrderState::Cancelled;
    }

    /// Applies a fill of `quantity` and returns the resulting [`Fill`]
    /// record, with the cumulative quantity captured after the decrement.
    pub(crate) fn fill(&mut self, quantity: u64) -> Fill {
        self.remaining -= quantity;
        self.state = if self.remaining == 0 {
            OrderState::FullyFilled
        } else {
            OrderState::PartiallyFilled
        };
        Fill::from_entry(self, quantity)
    }

    /// Matches the receiver (bid) against `ask_entry` for `quantity` units,
    /// or for `min(remaining, remaining)` when no quantity is given.
    ///
    /// The produced execution carries each side's own limit price as a
    /// provisional fill price; the side book rewrites both to the uniform
    /// clearing price at the end of the match round.
    pub fn execute(&mut self, ask_entry: &mut OrderEntry, quantity: Option<u64>) -> Execution {
        let quantity = quantity.unwrap_or_else(|| self.remaining.min(ask_entry.remaining));
        let bid_fill = self.fill(quantity);
        let ask_fill = ask_entry.fill(quantity);
        Execution::new(quantity, bid_fill, ask_fill)
    }
}
