//! A single traded symbol: both side books plus the entry index.

use crate::engine::entry::{OrderEntry, OrderEntryStore};
use crate::engine::error::MarketError;
use crate::engine::execution::{Execution, OrderStat};
use crate::engine::order::{Order, OrderId, OrderPrice, OrderState, Side};
use crate::engine::order_queue::OrderQueue;
use crate::utils::current_time_secs;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// Injected wall clock used to stamp orders that carry no explicit time.
pub type TimeSource = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Serializable depth-of-book snapshot of one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// The product symbol.
    pub symbol: String,
    /// Price of the last execution, if any.
    pub last_price: Option<f64>,
    /// Bid levels in marketability order.
    pub bids: Vec<OrderStat>,
    /// Ask levels in marketability order.
    pub asks: Vec<OrderStat>,
}

/// The order books and entry index for one symbol.
///
/// The product is the single owner of its [`OrderEntry`] records; the side
/// books reference them by id. Entries stay indexed after they terminate,
/// so cancelled and filled orders remain discoverable by id.
pub struct Product {
    symbol: String,
    bid_queue: OrderQueue,
    ask_queue: OrderQueue,
    entries: OrderEntryStore,
    last_price: Option<f64>,
    time_source: TimeSource,
}

impl Product {
    /// Creates an empty product using the system clock.
    pub fn new(symbol: impl Into<String>) -> Self {
        Product::with_time_source(symbol, Arc::new(current_time_secs))
    }

    /// Creates an empty product with an injected time source.
    pub fn with_time_source(symbol: impl Into<String>, time_source: TimeSource) -> Self {
        Product {
            symbol: symbol.into(),
            bid_queue: OrderQueue::new(),
            ask_queue: OrderQueue::new(),
            entries: OrderEntryStore::new(),
            last_price: None,
            time_source,
        }
    }

    /// The product symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The side book for `side`.
    pub fn order_queue(&self, side: Side) -> &OrderQueue {
        match side {
            Side::Buy => &self.bid_queue,
            Side::Sell => &self.ask_queue,
        }
    }

    /// The side book for a side given in any normalizable form
    /// (ordinal or name).
    ///
    /// # Errors
    /// Returns the side normalization error for unrecognized values.
    pub fn side_queue<S>(&self, side: S) -> Result<&OrderQueue, MarketError>
    where
        S: TryInto<Side, Error = MarketError>,
    {
        Ok(self.order_queue(side.try_into()?))
    }

    /// Price of the top bid limit level.
    pub fn bid_price(&self) -> Option<f64> {
        self.bid_queue.next_price()
    }

    /// Price of the top ask limit level.
    pub fn ask_price(&self) -> Option<f64> {
        self.ask_queue.next_price()
    }

    /// Price of the last execution on this product.
    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    /// Overrides the last execution price (e.g. a reference price seeded
    /// before the open).
    pub fn set_last_price(&mut self, last_price: f64) {
        self.last_price = Some(last_price);
    }

    /// Books `order` into the matching side.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicateOrderId`] when the id is already
    /// indexed.
    pub fn place(&mut self, order: Order) -> Result<OrderId, MarketError> {
        self.place_shared(Arc::new(order))
    }

    pub(crate) fn place_shared(&mut self, order: Arc<Order>) -> Result<OrderId, MarketError> {
        if self.entries.contains_key(order.id()) {
            return Err(MarketError::DuplicateOrderId {
                order_id: order.id().clone(),
            });
        }

        let time = order.time().unwrap_or_else(|| (self.time_source)());
        let entry = OrderEntry::with_time(Arc::clone(&order), time);
        trace!(
            "placing order {} {} {} {} on {}",
            order.id(),
            order.side(),
            order.quantity(),
            order.price(),
            self.symbol
        );

        match entry.side() {
            Side::Buy => self.bid_queue.push(&entry),
            Side::Sell => self.ask_queue.push(&entry),
        }

        let order_id = order.id().clone();
        self.entries.insert(order_id.clone(), entry);
        Ok(order_id)
    }

    /// Cancels the order with the given id.
    ///
    /// # Errors
    /// Returns [`MarketError::NoSuchOrderId`] for an unknown id,
    /// [`MarketError::AlreadyFullyFilled`] or
    /// [`MarketError::AlreadyCancelled`] for a terminal entry.
    pub fn cancel_by_id(&mut self, order_id: &OrderId) -> Result<(), MarketError> {
        let entry = self
            .entries
            .get_mut(order_id)
            .ok_or_else(|| MarketError::NoSuchOrderId {
                order_id: order_id.clone(),
            })?;

        match entry.state() {
            OrderState::FullyFilled => {
                return Err(MarketError::AlreadyFullyFilled {
                    order_id: order_id.clone(),
                });
            }
            OrderState::Cancelled => {
                return Err(MarketError::AlreadyCancelled {
                    order_id: order_id.clone(),
                });
            }
            _ => {}
        }

        trace!("cancelling order {} on {}", order_id, self.symbol);

        let queue = match entry.side() {
            Side::Buy => &mut self.bid_queue,
            Side::Sell => &mut self.ask_queue,
        };
        queue.cancel(entry);
        Ok(())
    }

    /// Cancels by the id carried on `order`.
    ///
    /// Only the id is consulted, so a bare order constructed around an id
    /// is sufficient.
    pub fn cancel(&mut self, order: &Order) -> Result<(), MarketError> {
        self.cancel_by_id(order.id())
    }

    /// Runs a match round between the two side books and tracks the last
    /// execution price.
    pub fn execute(&mut self) -> Vec<Execution> {
        let executions = self
            .bid_queue
            .execute(&mut self.ask_queue, &mut self.entries);

        if let Some(last) = executions.last() {
            self.last_price = last.price;
        }

        executions
    }

    /// Books `order`, then runs a match round.
    ///
    /// # Errors
    /// Returns the placement error without matching when booking fails.
    pub fn execute_order(&mut self, order: Order) -> Result<Vec<Execution>, MarketError> {
        self.place(order)?;
        Ok(self.execute())
    }

    /// Looks up the original order behind an id, including terminal ones.
    pub fn get_order_by_id(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        self.entries
            .get(order_id)
            .map(|entry| Arc::clone(entry.order()))
    }

    /// The live book record behind an id, including terminal ones.
    pub fn entry(&self, order_id: &OrderId) -> Option<&OrderEntry> {
        self.entries.get(order_id)
    }

    /// Depth of book on `side` in marketability order.
    pub fn order_book(&self, side: Side) -> Vec<OrderStat> {
        self.order_queue(side).order_book()
    }

    /// Serializable depth snapshot of both sides.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            symbol: self.symbol.clone(),
            last_price: self.last_price,
            bids: self.bid_queue.order_book(),
            asks: self.ask_queue.order_book(),
        }
    }

    /// Renders both sides as a `BID | PRICE | ASK` table.
    ///
    /// Cells read `"<volume> (<count>)"`; prices are sorted descending with
    /// the market-order level (if present) above them all, labelled `MKT`.
    /// Column widths equal the widest cell of each column and the header is
    /// underlined with an `=` separator row.
    pub fn format_order_book(&self) -> String {
        let books = [
            self.bid_queue.order_book(),
            self.ask_queue.order_book(),
        ];

        let mut limit_rows: BTreeMap<OrderedFloat<f64>, [String; 2]> = BTreeMap::new();
        let mut market_cells: [String; 2] = [String::new(), String::new()];
        let mut has_market_level = false;

        for (column, book) in books.iter().enumerate() {
            for stat in book {
                let cell = format!("{} ({})", stat.volume, stat.count);
                match stat.price {
                    OrderPrice::Limit(price) => {
                        limit_rows.entry(OrderedFloat(price)).or_default()[column] = cell;
                    }
                    OrderPrice::Market => {
                        market_cells[column] = cell;
                        has_market_level = true;
                    }
                }
            }
        }

        let mut rows: Vec<[String; 3]> = Vec::new();
        rows.push(["BID".to_string(), "PRICE".to_string(), "ASK".to_string()]);
        if has_market_level {
            let [bid_cell, ask_cell] = market_cells;
            rows.push([bid_cell, "MKT".to_string(), ask_cell]);
        }
        for (price, cells) in limit_rows.iter().rev() {
            rows.push([
                cells[0].clone(),
                format!("{}", price.into_inner()),
                cells[1].clone(),
            ]);
        }

        let widths: [usize; 3] = std::array::from_fn(|column| {
            rows.iter().map(|row| row[column].len()).max().unwrap_or(0)
        });

        let mut lines: Vec<String> = rows
            .iter()
            .map(|row| {
                format!(
                    "| {:<bid$} | {:<price$} | {:<ask$} |",
                    row[0],
                    row[1],
                    row[2],
                    bid = widths[0],
                    price = widths[1],
                    ask = widths[2],
                )
            })
            .collect();

        lines.insert(
            1,
            format!(
                "|{}|{}|{}|",
                "=".repeat(widths[0] + 2),
                "=".repeat(widths[1] + 2),
                "=".repeat(widths[2] + 2),
            ),
        );

        lines.join("\n")
    }
}

impl std::fmt::Debug for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Product")
            .field("symbol", &self.symbol)
            .field("bid_queue", &self.bid_queue)
            .field("ask_queue", &self.ask_queue)
            .field("last_price", &self.last_price)
            .finish_non_exhaustive()
    }
}
