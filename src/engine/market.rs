//! The market façade: symbol routing and the global order-id index.

use crate::engine::entry::OrderEntry;
use crate::engine::error::MarketError;
use crate::engine::execution::Execution;
use crate::engine::order::{Order, OrderId, Side};
use crate::engine::product::{Product, TimeSource};
use crate::utils::current_time_secs;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes orders to per-symbol [`Product`]s and indexes every order id
/// across the whole market.
///
/// Products are created on first reference. The engine is a passive,
/// synchronous state machine: share it across threads only behind external
/// mutual exclusion.
pub struct Market {
    products: HashMap<String, Product>,
    index: HashMap<OrderId, String>,
    time_source: TimeSource,
}

impl Market {
    /// Creates an empty market using the system clock.
    pub fn new() -> Self {
        Market::with_time_source(Arc::new(current_time_secs))
    }

    /// Creates an empty market with an injected time source, shared by all
    /// products it creates.
    pub fn with_time_source(time_source: TimeSource) -> Self {
        Market {
            products: HashMap::new(),
            index: HashMap::new(),
            time_source,
        }
    }

    /// `true` when a product exists for `symbol`.
    pub fn has_product(&self, symbol: &str) -> bool {
        self.products.contains_key(symbol)
    }

    /// The product for `symbol`, if one exists.
    pub fn product(&self, symbol: &str) -> Option<&Product> {
        self.products.get(symbol)
    }

    /// Mutable access to the product for `symbol`, if one exists.
    pub fn product_mut(&mut self, symbol: &str) -> Option<&mut Product> {
        self.products.get_mut(symbol)
    }

    /// Registers a product under `symbol`, creating an empty one when
    /// `product` is `None`.
    ///
    /// # Errors
    /// Returns [`MarketError::MissingSymbol`] for an empty symbol.
    pub fn set_product(
        &mut self,
        symbol: &str,
        product: Option<Product>,
    ) -> Result<&mut Product, MarketError> {
        if symbol.is_empty() {
            return Err(MarketError::MissingSymbol);
        }
        let product = product
            .unwrap_or_else(|| Product::with_time_source(symbol, Arc::clone(&self.time_source)));
        self.products.insert(symbol.to_string(), product);
        Ok(self
            .products
            .get_mut(symbol)
            .expect("product was just inserted"))
    }

    /// The product for `symbol`, created on first reference.
    ///
    /// # Errors
    /// Returns [`MarketError::MissingSymbol`] for an empty symbol.
    pub fn ensure_product(&mut self, symbol: &str) -> Result<&mut Product, MarketError> {
        if symbol.is_empty() {
            return Err(MarketError::MissingSymbol);
        }
        let time_source = &self.time_source;
        Ok(self
            .products
            .entry(symbol.to_string())
            .or_insert_with(|| Product::with_time_source(symbol, Arc::clone(time_source))))
    }

    /// Iterates `(symbol, product)` pairs in unspecified order.
    pub fn products(&self) -> impl Iterator<Item = (&str, &Product)> {
        self.products
            .iter()
            .map(|(symbol, product)| (symbol.as_str(), product))
    }

    /// Iterates registered symbols in unspecified order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.products.keys().map(String::as_str)
    }

    /// Books `order` with the product for its symbol.
    ///
    /// # Errors
    /// Returns [`MarketError::DuplicateOrderId`] when the id is already
    /// indexed anywhere in the market, or
    /// [`MarketError::MissingSymbol`] for an empty symbol.
    pub fn place(&mut self, order: Order) -> Result<OrderId, MarketError> {
        if self.index.contains_key(order.id()) {
            return Err(MarketError::DuplicateOrderId {
                order_id: order.id().clone(),
            });
        }

        let symbol = order.symbol().to_string();
        let product = self.ensure_product(&symbol)?;
        let order_id = product.place_shared(Arc::new(order))?;
        self.index.insert(order_id.clone(), symbol);
        Ok(order_id)
    }

    /// Cancels the order with the given id, wherever it is booked.
    ///
    /// # Errors
    /// Returns [`MarketError::NoSuchOrderId`] for an unknown id, or the
    /// product-level terminal-state errors.
    pub fn cancel_by_id(&mut self, order_id: &OrderId) -> Result<(), MarketError> {
        let symbol = self
            .index
            .get(order_id)
            .ok_or_else(|| MarketError::NoSuchOrderId {
                order_id: order_id.clone(),
            })?;
        let product = self
            .products
            .get_mut(symbol)
            .expect("indexed symbol has a product");
        product.cancel_by_id(order_id)
    }

    /// Cancels by the id carried on `order`; only the id is consulted.
    pub fn cancel(&mut self, order: &Order) -> Result<(), MarketError> {
        self.cancel_by_id(order.id())
    }

    /// Runs a match round on every product and concatenates the resulting
    /// executions. Product order is not guaranteed.
    pub fn execute(&mut self) -> Vec<Execution> {
        let mut executions = Vec::new();
        for product in self.products.values_mut() {
            executions.extend(product.execute());
        }
        executions
    }

    /// Books `order`, then runs a match round on its product.
    ///
    /// # Errors
    /// Returns the placement error without matching when booking fails.
    pub fn execute_order(&mut self, order: Order) -> Result<Vec<Execution>, MarketError> {
        let symbol = order.symbol().to_string();
        self.place(order)?;
        let product = self
            .products
            .get_mut(&symbol)
            .expect("placed symbol has a product");
        Ok(product.execute())
    }

    /// Looks up the original order behind an id, including terminal ones.
    pub fn get_order_by_id(&self, order_id: &OrderId) -> Option<Arc<Order>> {
        let symbol = self.index.get(order_id)?;
        self.products.get(symbol)?.get_order_by_id(order_id)
    }

    /// The live book record behind an id, including terminal ones.
    pub fn entry(&self, order_id: &OrderId) -> Option<&OrderEntry> {
        let symbol = self.index.get(order_id)?;
        self.products.get(symbol)?.entry(order_id)
    }

    /// Books a limit order built from its parts.
    pub fn place_limit_order(
        &mut self,
        side: Side,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<OrderId, MarketError> {
        self.place(Order::limit(side, symbol, quantity, price))
    }

    /// Books a market order built from its parts.
    pub fn place_market_order(
        &mut self,
        side: Side,
        symbol: &str,
        quantity: u64,
    ) -> Result<OrderId, MarketError> {
        self.place(Order::market(side, symbol, quantity))
    }

    /// Books a limit order built from its parts, then runs a match round.
    pub fn execute_limit_order(
        &mut self,
        side: Side,
        symbol: &str,
        quantity: u64,
        price: f64,
    ) -> Result<Vec<Execution>, MarketError> {
        self.execute_order(Order::limit(side, symbol, quantity, price))
    }

    /// Books a market order built from its parts, then runs a match round.
    pub fn execute_market_order(
        &mut self,
        side: Side,
        symbol: &str,
        quantity: u64,
    ) -> Result<Vec<Execution>, MarketError> {
        self.execute_order(Order::market(side, symbol, quantity))
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::new()
    }
}

impl std::fmt::Debug for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Market")
            .field("products", &self.products)
            .field("indexed_orders", &self.index.len())
            .finish_non_exhaustive()
    }
}
