//! # matchbook
//!
//! Central limit order book (CLOB) matching engine for a single instrument.
//!
//! ## Architecture
//!
//! - **Types**: orders, sides, order types, trades, depth snapshots
//! - **Book**: slab-backed order storage, per-side price ladders, an order
//!   id index and hash-keyed level aggregates, all kept in lockstep
//! - **Engine**: price-time priority matching with per-type admission
//!   policy (GTC, GFD, FAK/IOC, FOK, Market)
//! - **Orderbook**: the thread-safe monitor: one mutex around every public
//!   operation, plus a housekeeper thread that cancels good-for-day orders
//!   at the session close
//! - **Scenario**: the line-oriented command/result format used by the
//!   scripted test harness and the demo binary
//!
//! ## Design Principles
//!
//! 1. **Determinism**: matching is price-time priority with no tie-break
//!    randomness; identical inputs produce identical trade streams
//! 2. **Integer arithmetic**: prices are signed ticks, quantities unsigned
//!    integers; no floating point anywhere
//! 3. **Stable handles**: orders live in a slab; level queues and the id
//!    index share slab keys, so cancellation is O(1) from anywhere in a
//!    queue
//! 4. **One lock**: all mutation is serialized under a single mutex, making
//!    every operation a consistent, linearizable step
//!
//! ## Example
//!
//! ```
//! use matchbook::{Order, Orderbook, OrderType, Side};
//!
//! let orderbook = Orderbook::new();
//!
//! orderbook.add_order(Order::new(OrderType::GoodTillCancel, 1, Side::Sell, 101, 10));
//! let trades = orderbook.add_order(Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 101, 4));
//!
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].quantity(), 4);
//! assert_eq!(orderbook.size(), 1); // 6 lots of order 1 still resting
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: orders, trades, depth snapshots
pub mod types;

/// Order book data structures: slab nodes, price levels, ladders, aggregates
pub mod book;

/// Matching policy: admission pre-checks and the crossing loop
pub mod engine;

/// Thread-safe orderbook monitor
pub mod orderbook;

/// Engine configuration
pub mod config;

/// Scenario file format for scripted runs
pub mod scenario;

/// Good-for-day pruning thread
mod housekeeper;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use book::{Book, ConsistencyError};
pub use config::{ConfigError, EngineConfig};
pub use engine::MatchingEngine;
pub use orderbook::Orderbook;
pub use types::{
    LevelInfo, Order, OrderId, OrderType, OrderbookLevels, Price, Quantity, Side, Trade,
    TradeInfo,
};
