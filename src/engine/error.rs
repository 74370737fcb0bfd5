//! Matching engine error types

use crate::engine::order::OrderId;
use std::fmt;

/// Errors that can occur within the keyed priority queue.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KeyedHeapError {
    /// `peek` or `pop` was called on an empty queue.
    Empty,

    /// `push` was called with a key that is already present.
    DuplicateKey {
        /// Debug rendering of the offending key.
        key: String,
    },
}

impl fmt::Display for KeyedHeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyedHeapError::Empty => write!(f, "peek/pop from an empty queue"),
            KeyedHeapError::DuplicateKey { key } => {
                write!(f, "key already exists: {key}")
            }
        }
    }
}

impl std::error::Error for KeyedHeapError {}

/// Errors surfaced by the market, product and order-queue layers.
///
/// Every error is synchronous and aborts the originating call without
/// mutating engine state.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MarketError {
    /// Side normalization received an out-of-range ordinal.
    InvalidSideValue {
        /// The rejected ordinal.
        value: i64,
    },

    /// Side normalization received an unknown name.
    InvalidSideName {
        /// The rejected name.
        name: String,
    },

    /// A product was registered without a symbol.
    MissingSymbol,

    /// `place` received an order whose id is already indexed.
    DuplicateOrderId {
        /// The duplicated order id.
        order_id: OrderId,
    },

    /// `cancel` received an id that is not indexed.
    NoSuchOrderId {
        /// The unknown order id.
        order_id: OrderId,
    },

    /// `cancel` targeted an order that has already been fully filled.
    AlreadyFullyFilled {
        /// The order id.
        order_id: OrderId,
    },

    /// `cancel` targeted an order that has already been cancelled.
    AlreadyCancelled {
        /// The order id.
        order_id: OrderId,
    },

    /// A keyed-heap invariant violation escaped the queue layers.
    Heap(KeyedHeapError),
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::InvalidSideValue { value } => {
                write!(f, "invalid side: {value}")
            }
            MarketError::InvalidSideName { name } => {
                write!(f, "invalid side name: {name}")
            }
            MarketError::MissingSymbol => write!(f, "symbol must be specified"),
            MarketError::DuplicateOrderId { order_id } => {
                write!(f, "duplicate order id: {order_id}")
            }
            MarketError::NoSuchOrderId { order_id } => {
                write!(f, "no such order id: {order_id}")
            }
            MarketError::AlreadyFullyFilled { order_id } => {
                write!(f, "order {order_id} is already fully filled")
            }
            MarketError::AlreadyCancelled { order_id } => {
                write!(f, "order {order_id} is already cancelled")
            }
            MarketError::Heap(err) => write!(f, "priority queue error: {err}"),
        }
    }
}

impl std::error::Error for MarketError {}

impl From<KeyedHeapError> for MarketError {
    fn from(err: KeyedHeapError) -> Self {
        MarketError::Heap(err)
    }
}
