//! # In-Process Stock-Market Matching Engine
//!
//! A matching engine for one or more symbols, built as a passive,
//! synchronous state machine: each `place`, `cancel` or `execute` call runs
//! to completion before the next, with no I/O, callbacks or background
//! threads.
//!
//! ## Key Features
//!
//! - **Two matching modes**: continuous matching, triggered implicitly by
//!   each incoming order that can cross the book, and batched call
//!   auctions, triggered explicitly to clear the whole book at a single
//!   uniform price.
//! - **Price–time priority**: price levels are ordered by marketability,
//!   time buckets within a level by arrival timestamp, and entries within a
//!   bucket first-in-first-out.
//! - **Pro-rata allocation**: when several orders share a timestamp at the
//!   same price and a match crosses that bucket, the batch quantity is
//!   split proportionally to the orders' open quantities, with a
//!   deterministic front-add / back-subtract rounding adjustment.
//! - **Market and limit orders** are first-class on both sides; the
//!   auction-feasibility predicate guarantees a clearing price can always
//!   be anchored before any matching starts.
//! - **Uniform clearing price**: every execution of one match round carries
//!   the same price: the counter-side limit when one side is a market
//!   order, otherwise the midpoint of the last crossed pair of limits.
//!
//! ## Layering
//!
//! The book is a stack of keyed priority queues. Each side of a product is
//! an [`OrderQueue`] of price levels; each [`PriceOrderQueue`] groups time
//! buckets at one price; each [`TimeOrderQueue`] is a FIFO of orders that
//! arrived at the same timestamp. [`Product`] owns the order entries and
//! both side books for one symbol, and [`Market`] routes by symbol while
//! indexing every order id globally.
//!
//! ## Example
//!
//! ```
//! use matchbook_rs::prelude::*;
//!
//! let mut market = Market::new();
//! market.execute_limit_order(Side::Buy, "ACME", 10, 120.0).unwrap();
//! let executions = market.execute_market_order(Side::Sell, "ACME", 10).unwrap();
//!
//! assert_eq!(executions.len(), 1);
//! assert_eq!(executions[0].quantity, 10);
//! assert_eq!(executions[0].price, Some(120.0));
//! assert_eq!(market.product("ACME").unwrap().last_price(), Some(120.0));
//! ```
//!
//! ## Concurrency
//!
//! The engine performs no locking of its own. Share a [`Market`] across
//! threads only behind external mutual exclusion; [`Execution`] and
//! [`Fill`] records are immutable values and safe to hand out.

pub mod engine;

pub mod prelude;
mod utils;

pub use engine::{
    Allocation, Execution, Fill, KeyedHeap, KeyedHeapError, Market, MarketError, Order,
    OrderEntry, OrderEntryStore, OrderId, OrderPrice, OrderQueue, OrderStat, OrderState,
    PriceOrderQueue, Product, ProductSnapshot, Side, TimeOrderQueue, TimeSource,
};
pub use utils::current_time_secs;
