//! Order requests and the value types they are built from.

use crate::engine::error::MarketError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The side of an order or a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Bid side.
    Buy = 1,
    /// Ask side.
    Sell = 2,
}

impl Side {
    /// The wire ordinal of the side (`1` for buy, `2` for sell).
    pub fn ordinal(&self) -> i64 {
        *self as i64
    }

    /// The opposite side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl TryFrom<i64> for Side {
    type Error = MarketError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Buy),
            2 => Ok(Side::Sell),
            _ => Err(MarketError::InvalidSideValue { value }),
        }
    }
}

impl FromStr for Side {
    type Err = MarketError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(MarketError::InvalidSideName {
                name: name.to_string(),
            }),
        }
    }
}

impl TryFrom<&str> for Side {
    type Error = MarketError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        name.parse()
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// The price of an order: a limit bound, or none at all.
///
/// Market orders trade at whatever the opposing side offers, so they carry
/// no number. Keeping the distinction in the type means the price-key
/// ordering, the auction-feasibility predicate and the uniform-price rule
/// are total functions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum OrderPrice {
    /// No price bound; trades at any available opposing price.
    Market,
    /// A limit bound: maximum for buys, minimum for sells.
    Limit(f64),
}

impl OrderPrice {
    /// `true` for market orders.
    pub fn is_market(&self) -> bool {
        matches!(self, OrderPrice::Market)
    }

    /// The limit bound, if any.
    pub fn limit(&self) -> Option<f64> {
        match self {
            OrderPrice::Market => None,
            OrderPrice::Limit(price) => Some(*price),
        }
    }
}

impl From<f64> for OrderPrice {
    fn from(price: f64) -> Self {
        OrderPrice::Limit(price)
    }
}

impl From<Option<f64>> for OrderPrice {
    fn from(price: Option<f64>) -> Self {
        match price {
            Some(price) => OrderPrice::Limit(price),
            None => OrderPrice::Market,
        }
    }
}

impl fmt::Display for OrderPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderPrice::Market => write!(f, "MKT"),
            OrderPrice::Limit(price) => write!(f, "{price}"),
        }
    }
}

/// Heap key ordering price levels by marketability.
///
/// Market levels sort ahead of every limit level. Buy limits are stored
/// negated so that higher bids rank first; sell limits are stored as-is so
/// that lower asks rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum PriceKey {
    Market,
    Limit(OrderedFloat<f64>),
}

impl PriceKey {
    pub(crate) fn new(side: Side, price: OrderPrice) -> Self {
        match price {
            OrderPrice::Market => PriceKey::Market,
            OrderPrice::Limit(price) => match side {
                Side::Buy => PriceKey::Limit(OrderedFloat(-price)),
                Side::Sell => PriceKey::Limit(OrderedFloat(price)),
            },
        }
    }
}

/// Opaque order identity.
///
/// Callers may supply any string; when an order is built without an id, a
/// process-unique one is generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh process-unique id.
    pub fn generate() -> Self {
        OrderId(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        OrderId(id.to_string())
    }
}

impl From<String> for OrderId {
    fn from(id: String) -> Self {
        OrderId(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a booked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Booked, nothing filled yet.
    New,
    /// Some quantity filled, some remaining.
    PartiallyFilled,
    /// Entire quantity filled.
    FullyFilled,
    /// Cancelled before completion.
    Cancelled,
}

/// An immutable order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    side: Side,
    symbol: String,
    quantity: u64,
    price: OrderPrice,
    time: Option<f64>,
    id: OrderId,
}

impl Order {
    /// Builds an order with an explicit price variant and a generated id.
    pub fn new(side: Side, symbol: impl Into<String>, quantity: u64, price: OrderPrice) -> Self {
        Order {
            side,
            symbol: symbol.into(),
            quantity,
            price,
            time: None,
            id: OrderId::generate(),
        }
    }

    /// Builds a limit order.
    pub fn limit(side: Side, symbol: impl Into<String>, quantity: u64, price: f64) -> Self {
        Order::new(side, symbol, quantity, OrderPrice::Limit(price))
    }

    /// Builds a market order.
    pub fn market(side: Side, symbol: impl Into<String>, quantity: u64) -> Self {
        Order::new(side, symbol, quantity, OrderPrice::Market)
    }

    /// Overrides the arrival timestamp (seconds since the epoch).
    ///
    /// Orders without an explicit time are stamped with the product's time
    /// source when booked.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    /// Overrides the generated id with a caller-chosen one.
    pub fn with_id(mut self, id: impl Into<OrderId>) -> Self {
        self.id = id.into();
        self
    }

    /// The order side.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The traded symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The requested quantity.
    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    /// The price variant.
    pub fn price(&self) -> OrderPrice {
        self.price
    }

    /// The explicit arrival time, if one was supplied.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// The order id.
    pub fn id(&self) -> &OrderId {
        &self.id
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order(side={}, symbol={}, quantity={}, price={})",
            self.side, self.symbol, self.quantity, self.price
        )
    }
}
