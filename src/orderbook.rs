//! Thread-safe orderbook façade.
//!
//! ## Concurrency model
//!
//! [`Orderbook`] is a monitor: every public operation acquires one
//! `parking_lot` mutex around the whole book for its full duration,
//! including matching, so the lock-grant order defines a total order over
//! operations and reads are consistent snapshots.
//!
//! A single housekeeper thread, started at construction, shares the same
//! mutex to cancel good-for-day orders at the session boundary. Dropping the
//! book signals the housekeeper through a condition variable and joins it.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::info;

use crate::book::Book;
use crate::config::{ConfigError, EngineConfig};
use crate::engine::MatchingEngine;
use crate::housekeeper;
use crate::types::{Order, OrderId, OrderbookLevels, Price, Quantity, Side, Trade};

/// State shared between the public façade and the housekeeper thread.
pub(crate) struct Shared {
    /// The book, guarded by the one engine-wide mutex
    pub(crate) book: Mutex<Book>,

    /// Stateless matching policy
    pub(crate) engine: MatchingEngine,

    /// Set once at shutdown, under its own small mutex so the housekeeper
    /// can sleep on it without holding the book
    pub(crate) shutdown: Mutex<bool>,

    /// Wakes the housekeeper early when shutdown is requested
    pub(crate) shutdown_signal: Condvar,

    pub(crate) config: EngineConfig,
}

/// A concurrently usable central limit order book.
///
/// ## Example
///
/// ```
/// use matchbook::{Order, Orderbook, OrderType, Side};
///
/// let orderbook = Orderbook::new();
///
/// orderbook.add_order(Order::new(OrderType::GoodTillCancel, 1, Side::Sell, 100, 10));
/// let trades = orderbook.add_order(Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 100, 10));
///
/// assert_eq!(trades.len(), 1);
/// assert_eq!(orderbook.size(), 0);
/// ```
pub struct Orderbook {
    shared: Arc<Shared>,
    housekeeper: Option<JoinHandle<()>>,
}

impl Orderbook {
    /// Create an orderbook with the default configuration (session close at
    /// 16:00 local time).
    pub fn new() -> Self {
        Self::start(EngineConfig::default())
    }

    /// Create an orderbook with a custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::start(config))
    }

    fn start(config: EngineConfig) -> Self {
        let shared = Arc::new(Shared {
            book: Mutex::new(Book::with_capacity(config.order_capacity)),
            engine: MatchingEngine::new(),
            shutdown: Mutex::new(false),
            shutdown_signal: Condvar::new(),
            config,
        });

        let worker = Arc::clone(&shared);
        let housekeeper = thread::spawn(move || housekeeper::run(&worker));

        Self {
            shared,
            housekeeper: Some(housekeeper),
        }
    }

    /// Submit a new order; returns the trades it produced.
    pub fn add_order(&self, order: Order) -> Vec<Trade> {
        let mut book = self.shared.book.lock();
        self.shared.engine.add_order(&mut book, order)
    }

    /// Cancel a resting order. No-ops when the id is unknown.
    pub fn cancel_order(&self, order_id: OrderId) {
        let mut book = self.shared.book.lock();
        self.shared.engine.cancel_order(&mut book, order_id);
    }

    /// Replace a resting order's side, price and quantity, preserving its
    /// type; the order loses time priority. Returns the trades produced by
    /// the re-add.
    pub fn modify_order(
        &self,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Vec<Trade> {
        let mut book = self.shared.book.lock();
        self.shared
            .engine
            .modify_order(&mut book, order_id, side, price, quantity)
    }

    /// Number of resting orders.
    pub fn size(&self) -> usize {
        self.shared.book.lock().size()
    }

    /// Best-first depth snapshot of both sides.
    pub fn levels(&self) -> OrderbookLevels {
        self.shared.book.lock().levels()
    }

    /// Cross-check the book's structural invariants (see
    /// [`Book::check_consistency`]). Intended for tests and diagnostics.
    pub fn check_consistency(&self) -> Result<(), crate::book::ConsistencyError> {
        self.shared.book.lock().check_consistency()
    }
}

impl Default for Orderbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Orderbook {
    fn drop(&mut self) {
        {
            let mut shutdown = self.shared.shutdown.lock();
            *shutdown = true;
        }
        self.shared.shutdown_signal.notify_all();

        if let Some(handle) = self.housekeeper.take() {
            if handle.join().is_err() {
                info!("housekeeper thread exited with a panic");
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
