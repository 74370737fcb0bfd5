//! Immutable records produced by matching.

use crate::engine::entry::OrderEntry;
use crate::engine::order::{Order, OrderId, OrderPrice, Side};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One side of an execution: how much of which order traded, at what price.
///
/// `price` is provisional (the order's own limit bound, or `None` for a
/// market order) until the side book rewrites it to the round's uniform
/// clearing price.
#[derive(Debug, Clone, Serialize)]
pub struct Fill {
    /// The originating order.
    pub order: Arc<Order>,
    /// The side the fill occurred on.
    pub side: Side,
    /// The traded symbol.
    pub symbol: String,
    /// Quantity traded in this fill.
    pub quantity: u64,
    /// Execution price; `None` until the uniform-price rewrite.
    pub price: Option<f64>,
    /// The order's total requested quantity.
    pub order_quantity: u64,
    /// The order's own price variant.
    pub order_price: OrderPrice,
    /// The arrival timestamp the order was booked under.
    pub order_time: f64,
    /// The order id.
    pub order_id: OrderId,
    /// Quantity filled across the order's lifetime, captured after this
    /// fill was applied.
    pub cumulative_quantity: u64,
}

impl Fill {
    pub(crate) fn from_entry(entry: &OrderEntry, quantity: u64) -> Self {
        Fill {
            order: Arc::clone(entry.order()),
            side: entry.side(),
            symbol: entry.symbol().to_string(),
            quantity,
            price: entry.price().limit(),
            order_quantity: entry.quantity(),
            order_price: entry.price(),
            order_time: entry.time(),
            order_id: entry.order_id().clone(),
            cumulative_quantity: entry.filled_quantity(),
        }
    }

    /// `true` when this fill completed its order.
    pub fn completes_order(&self) -> bool {
        self.cumulative_quantity == self.order_quantity
    }
}

/// A matched trade: one bid fill and one ask fill of the same quantity.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    /// The traded quantity.
    pub quantity: u64,
    /// The clearing price; `None` until the uniform-price rewrite.
    pub price: Option<f64>,
    /// The buy-side fill.
    pub bid_fill: Fill,
    /// The sell-side fill.
    pub ask_fill: Fill,
}

impl Execution {
    pub(crate) fn new(quantity: u64, bid_fill: Fill, ask_fill: Fill) -> Self {
        Execution {
            quantity,
            price: None,
            bid_fill,
            ask_fill,
        }
    }

    /// The fill on the given side.
    pub fn fill(&self, side: Side) -> &Fill {
        match side {
            Side::Buy => &self.bid_fill,
            Side::Sell => &self.ask_fill,
        }
    }

    pub(crate) fn set_uniform_price(&mut self, price: f64) {
        self.price = Some(price);
        self.bid_fill.price = Some(price);
        self.ask_fill.price = Some(price);
    }
}

/// Pro-rata allocator output: how much of the batch one entry receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The allocated entry's order id.
    pub order_id: OrderId,
    /// The allocated quantity; may be zero when rounding produced zero.
    pub quantity: u64,
}

/// Depth-of-book summary of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderStat {
    /// The level price; `Market` for the market-order level.
    pub price: OrderPrice,
    /// Open quantity at the level.
    pub volume: u64,
    /// Live order count at the level.
    pub count: u64,
}

impl OrderStat {
    /// Builds a depth entry.
    pub fn new(price: OrderPrice, volume: u64, count: u64) -> Self {
        OrderStat {
            price,
            volume,
            count,
        }
    }
}
