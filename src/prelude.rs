//! Prelude module that re-exports commonly used types.
//!
//! Instead of importing each type individually, you can use:
//!
//! ```rust
//! use matchbook_rs::prelude::*;
//! ```

// The market façade and per-symbol products
pub use crate::engine::{Market, Product, ProductSnapshot};

// Order construction types
pub use crate::engine::{Order, OrderId, OrderPrice, OrderState, Side};

// Matching output types
pub use crate::engine::{Allocation, Execution, Fill, OrderStat};

// The layered book structures
pub use crate::engine::{
    KeyedHeap, OrderEntry, OrderEntryStore, OrderQueue, PriceOrderQueue, TimeOrderQueue,
};

// Error types
pub use crate::engine::{KeyedHeapError, MarketError};

// Clock injection
pub use crate::engine::TimeSource;
pub use crate::utils::current_time_secs;
