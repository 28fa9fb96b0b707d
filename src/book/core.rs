//! The order book proper: ladders, index and aggregates.
//!
//! ## Architecture
//!
//! `Book` combines four structures that must move in lockstep:
//!
//! - **Slab**: owns every resting [`OrderNode`]; slab keys are the stable
//!   handles the index and the level queues share
//! - **BTreeMap ladders**: bid levels keyed by `Reverse(price)` (descending)
//!   and ask levels keyed by price (ascending), so the first entry of each
//!   map is the best level
//! - **HashMap index**: order id → slab key, for O(1) cancel and modify
//! - **LevelAggregates**: hash-keyed per-price totals for O(1)
//!   quantity-at-price lookup
//!
//! Every mutation here maintains all four together; [`Book::check_consistency`]
//! cross-verifies them and is exercised by the test suite after every
//! operation.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use slab::Slab;
use thiserror::Error;
use tracing::trace;

use crate::book::aggregates::{LevelAggregates, LevelAction};
use crate::book::level::PriceLevel;
use crate::book::node::OrderNode;
use crate::types::{
    LevelInfo, Order, OrderId, OrderType, OrderbookLevels, Price, Quantity, Side,
};

/// Result of filling a resting order by some quantity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fill {
    /// Id of the filled order
    pub order_id: OrderId,

    /// The filled order's displayed price
    pub price: Price,

    /// True when the fill consumed the order's entire remaining quantity
    /// (the order has been removed from the book)
    pub fully_filled: bool,
}

/// A violated book invariant, as found by [`Book::check_consistency`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsistencyError {
    #[error("index holds {index} orders but the ladders hold {ladders}")]
    IndexCount { index: usize, ladders: usize },

    #[error("empty level resting at price {0}")]
    EmptyLevel(Price),

    #[error("level {price}: queue holds {queue} orders, aggregate says {aggregate}")]
    CountMismatch { price: Price, queue: usize, aggregate: usize },

    #[error("level {price}: queue quantity {queue}, aggregate quantity {aggregate}")]
    QuantityMismatch { price: Price, queue: u64, aggregate: u64 },

    #[error("book crossed at rest: best bid {bid} >= best ask {ask}")]
    CrossedBook { bid: Price, ask: Price },

    #[error("order {0} resting with zero remaining quantity")]
    ZeroRemaining(OrderId),

    #[error("order {0} in a queue but not in the index")]
    Unindexed(OrderId),
}

/// Central limit order book for a single instrument.
///
/// `Book` is the passive data structure: it admits, removes and fills
/// resting orders while keeping its internal structures consistent. Matching
/// policy (pre-checks, the crossing loop, residual handling) lives in
/// [`crate::engine::MatchingEngine`]; serialized concurrent access lives in
/// [`crate::orderbook::Orderbook`].
#[derive(Debug, Default)]
pub struct Book {
    /// Storage for all resting orders
    orders: Slab<OrderNode>,

    /// Bid levels, best (highest) price first
    bids: BTreeMap<Reverse<Price>, PriceLevel>,

    /// Ask levels, best (lowest) price first
    asks: BTreeMap<Price, PriceLevel>,

    /// Order id → slab key
    index: HashMap<OrderId, usize>,

    /// Hash-keyed per-price totals
    aggregates: LevelAggregates,
}

impl Book {
    /// Create a new empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a book with pre-allocated order storage.
    pub fn with_capacity(order_capacity: usize) -> Self {
        Self {
            orders: Slab::with_capacity(order_capacity),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            index: HashMap::with_capacity(order_capacity),
            aggregates: LevelAggregates::new(),
        }
    }

    // ========================================================================
    // Size and lookup
    // ========================================================================

    /// Number of resting orders.
    #[inline]
    pub fn size(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// True when an order with this id is resting.
    #[inline]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// The resting order with this id, if any.
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        let key = *self.index.get(&order_id)?;
        self.orders.get(key).map(|node| &node.order)
    }

    /// Number of distinct bid prices.
    #[inline]
    pub fn bid_level_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of distinct ask prices.
    #[inline]
    pub fn ask_level_count(&self) -> usize {
        self.asks.len()
    }

    /// Best (highest) bid price.
    #[inline]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next().map(|r| r.0)
    }

    /// Best (lowest) ask price.
    #[inline]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Ids of all resting orders of the given type.
    pub fn orders_with_type(&self, order_type: OrderType) -> Vec<OrderId> {
        self.orders
            .iter()
            .filter(|(_, node)| node.order_type() == order_type)
            .map(|(_, node)| node.order_id())
            .collect()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Admit an order: append it to the tail of its side's queue at its
    /// price, record it in the index, and update the aggregates.
    ///
    /// The caller (the matching engine) has already vetted the order;
    /// duplicate-id and order-type policy are not this layer's concern.
    pub(crate) fn insert(&mut self, order: Order) -> usize {
        let order_id = order.id;
        let price = order.price;
        let side = order.side;
        let quantity = order.initial_quantity;

        let key = self.orders.insert(OrderNode::new(order));
        self.index.insert(order_id, key);

        match side {
            Side::Buy => {
                let level = self
                    .bids
                    .entry(Reverse(price))
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
            }
            Side::Sell => {
                let level = self
                    .asks
                    .entry(price)
                    .or_insert_with(|| PriceLevel::new(price));
                level.push_back(key, &mut self.orders);
            }
        }

        self.aggregates.update(price, quantity, LevelAction::Add);

        key
    }

    /// Remove a resting order by id (the cancel path).
    ///
    /// Returns the removed order, or `None` if the id is unknown. The
    /// level is deleted from the ladder and the aggregates entry dropped
    /// when the removal empties it.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let key = *self.index.get(&order_id)?;
        let node = self.orders.get(key)?;
        let price = node.price();
        let side = node.order.side;
        let remaining = node.remaining();

        let order = self.detach(key, side, price);
        self.aggregates.update(price, remaining, LevelAction::Remove);

        trace!(order_id, price, remaining, "order removed from book");
        Some(order)
    }

    /// Fill the order at `key` by `quantity`, updating the level total and
    /// the aggregates, and removing the order entirely when the fill
    /// consumes it.
    pub(crate) fn apply_fill(&mut self, key: usize, quantity: Quantity) -> Fill {
        let node = &mut self.orders[key];
        node.order.fill(quantity);

        let order_id = node.order_id();
        let price = node.price();
        let side = node.order.side;
        let fully_filled = node.is_filled();

        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.reduce_quantity(quantity);
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.reduce_quantity(quantity);
                }
            }
        }

        if fully_filled {
            self.detach(key, side, price);
            self.aggregates.update(price, quantity, LevelAction::Remove);
        } else {
            self.aggregates.update(price, quantity, LevelAction::Match);
        }

        Fill {
            order_id,
            price,
            fully_filled,
        }
    }

    /// Unlink `key` from its level queue, drop the level if it empties, and
    /// release the index entry and slab slot. Aggregates are the caller's
    /// responsibility (the delta differs between cancel and fill).
    fn detach(&mut self, key: usize, side: Side, price: Price) -> Order {
        match side {
            Side::Buy => {
                if let Some(level) = self.bids.get_mut(&Reverse(price)) {
                    level.remove(key, &mut self.orders);
                    if level.is_empty() {
                        self.bids.remove(&Reverse(price));
                    }
                }
            }
            Side::Sell => {
                if let Some(level) = self.asks.get_mut(&price) {
                    level.remove(key, &mut self.orders);
                    if level.is_empty() {
                        self.asks.remove(&price);
                    }
                }
            }
        }

        let node = self.orders.remove(key);
        self.index.remove(&node.order.id);
        node.order
    }

    // ========================================================================
    // Matching support
    // ========================================================================

    /// Head orders of the best bid and best ask levels, when both sides are
    /// non-empty.
    pub(crate) fn best_heads(&self) -> Option<(usize, usize)> {
        let bid = self.bids.values().next().and_then(PriceLevel::peek_head)?;
        let ask = self.asks.values().next().and_then(PriceLevel::peek_head)?;
        Some((bid, ask))
    }

    /// The order at a slab key. Panics on a stale key; keys handed out by
    /// [`Book::best_heads`] are valid until the next mutation.
    #[inline]
    pub(crate) fn order_at(&self, key: usize) -> &Order {
        &self.orders[key].order
    }

    /// Bid prices, best (highest) first.
    pub(crate) fn bid_prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.bids.keys().map(|r| r.0)
    }

    /// Ask prices, best (lowest) first.
    pub(crate) fn ask_prices(&self) -> impl Iterator<Item = Price> + '_ {
        self.asks.keys().copied()
    }

    /// Total resting quantity at `price`, from the aggregates map.
    #[inline]
    pub(crate) fn aggregate_quantity_at(&self, price: Price) -> u64 {
        self.aggregates.quantity_at(price)
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Best-first depth snapshot of both sides.
    ///
    /// Level totals are summed from the queues rather than read from the
    /// aggregates, so the snapshot is authoritative.
    pub fn levels(&self) -> OrderbookLevels {
        let level_info = |level: &PriceLevel| LevelInfo {
            price: level.price,
            quantity: level
                .iter(&self.orders)
                .map(|node| node.remaining() as u64)
                .sum(),
        };

        OrderbookLevels {
            bids: self.bids.values().map(level_info).collect(),
            asks: self.asks.values().map(level_info).collect(),
        }
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Cross-check every structural invariant:
    ///
    /// 1. the index covers exactly the orders resting in the ladders;
    /// 2. every ladder level is non-empty and agrees with its aggregates
    ///    entry on both count and total quantity;
    /// 3. the book is not crossed at rest;
    /// 4. no resting order has zero remaining quantity.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        let mut ladder_orders = 0usize;

        let bid_levels = self.bids.values();
        let ask_levels = self.asks.values();
        for level in bid_levels.chain(ask_levels) {
            if level.is_empty() {
                return Err(ConsistencyError::EmptyLevel(level.price));
            }

            let mut queue_count = 0usize;
            let mut queue_quantity = 0u64;
            for node in level.iter(&self.orders) {
                if node.is_filled() {
                    return Err(ConsistencyError::ZeroRemaining(node.order_id()));
                }
                if self.index.get(&node.order_id()).is_none() {
                    return Err(ConsistencyError::Unindexed(node.order_id()));
                }
                queue_count += 1;
                queue_quantity += node.remaining() as u64;
            }
            ladder_orders += queue_count;

            let data = self.aggregates.get(level.price).unwrap_or_default();
            if data.count != queue_count || level.order_count != queue_count {
                return Err(ConsistencyError::CountMismatch {
                    price: level.price,
                    queue: queue_count,
                    aggregate: data.count,
                });
            }
            if data.quantity != queue_quantity || level.total_quantity != queue_quantity {
                return Err(ConsistencyError::QuantityMismatch {
                    price: level.price,
                    queue: queue_quantity,
                    aggregate: data.quantity,
                });
            }
        }

        if ladder_orders != self.index.len() {
            return Err(ConsistencyError::IndexCount {
                index: self.index.len(),
                ladders: ladder_orders,
            });
        }

        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(ConsistencyError::CrossedBook { bid, ask });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn buy(id: OrderId, price: Price, quantity: Quantity) -> Order {
        Order::new(OrderType::GoodTillCancel, id, Side::Buy, price, quantity)
    }

    fn sell(id: OrderId, price: Price, quantity: Quantity) -> Order {
        Order::new(OrderType::GoodTillCancel, id, Side::Sell, price, quantity)
    }

    #[test]
    fn test_book_new() {
        let book = Book::new();

        assert!(book.is_empty());
        assert_eq!(book.size(), 0);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_insert_and_lookup() {
        let mut book = Book::with_capacity(16);

        book.insert(buy(1, 100, 10));

        assert_eq!(book.size(), 1);
        assert!(book.contains(1));
        assert_eq!(book.get(1).unwrap().price, 100);
        assert_eq!(book.best_bid(), Some(100));
        assert!(book.best_ask().is_none());
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_bid_ordering_descending() {
        let mut book = Book::new();

        book.insert(buy(1, 99, 10));
        book.insert(buy(2, 101, 10));
        book.insert(buy(3, 100, 10));

        assert_eq!(book.best_bid(), Some(101));
        let prices: Vec<Price> = book.bid_prices().collect();
        assert_eq!(prices, vec![101, 100, 99]);
    }

    #[test]
    fn test_book_ask_ordering_ascending() {
        let mut book = Book::new();

        book.insert(sell(1, 102, 10));
        book.insert(sell(2, 100, 10));
        book.insert(sell(3, 101, 10));

        assert_eq!(book.best_ask(), Some(100));
        let prices: Vec<Price> = book.ask_prices().collect();
        assert_eq!(prices, vec![100, 101, 102]);
    }

    #[test]
    fn test_book_remove() {
        let mut book = Book::new();
        book.insert(buy(1, 100, 10));
        book.insert(buy(2, 99, 5));

        let removed = book.remove(1).unwrap();
        assert_eq!(removed.id, 1);
        assert_eq!(removed.remaining_quantity, 10);

        assert_eq!(book.size(), 1);
        assert!(!book.contains(1));
        assert_eq!(book.best_bid(), Some(99));
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_remove_unknown_is_none() {
        let mut book = Book::new();
        assert!(book.remove(42).is_none());
    }

    #[test]
    fn test_book_empty_level_deleted_eagerly() {
        let mut book = Book::new();
        book.insert(sell(1, 100, 10));
        book.insert(sell(2, 100, 5));

        book.remove(1);
        assert_eq!(book.ask_level_count(), 1);

        book.remove(2);
        assert_eq!(book.ask_level_count(), 0);
        assert_eq!(book.aggregate_quantity_at(100), 0);
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_apply_fill_partial() {
        let mut book = Book::new();
        let key = book.insert(buy(1, 100, 10));

        let fill = book.apply_fill(key, 4);

        assert_eq!(fill.order_id, 1);
        assert_eq!(fill.price, 100);
        assert!(!fill.fully_filled);
        assert_eq!(book.get(1).unwrap().remaining_quantity, 6);
        assert_eq!(book.aggregate_quantity_at(100), 6);
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_apply_fill_complete_removes_order() {
        let mut book = Book::new();
        let key = book.insert(buy(1, 100, 10));

        let fill = book.apply_fill(key, 10);

        assert!(fill.fully_filled);
        assert!(book.is_empty());
        assert_eq!(book.bid_level_count(), 0);
        assert_eq!(book.aggregate_quantity_at(100), 0);
        book.check_consistency().unwrap();
    }

    #[test]
    fn test_book_best_heads() {
        let mut book = Book::new();
        assert!(book.best_heads().is_none());

        book.insert(buy(1, 100, 10));
        assert!(book.best_heads().is_none());

        book.insert(sell(2, 105, 10));
        let (bid_key, ask_key) = book.best_heads().unwrap();
        assert_eq!(book.order_at(bid_key).id, 1);
        assert_eq!(book.order_at(ask_key).id, 2);
    }

    #[test]
    fn test_book_levels_snapshot() {
        let mut book = Book::new();
        book.insert(buy(1, 100, 10));
        book.insert(buy(2, 100, 5));
        book.insert(buy(3, 99, 7));
        book.insert(sell(4, 105, 3));

        let levels = book.levels();

        assert_eq!(
            levels.bids,
            vec![
                LevelInfo { price: 100, quantity: 15 },
                LevelInfo { price: 99, quantity: 7 },
            ]
        );
        assert_eq!(levels.asks, vec![LevelInfo { price: 105, quantity: 3 }]);
    }

    #[test]
    fn test_book_orders_with_type() {
        let mut book = Book::new();
        book.insert(Order::new(OrderType::GoodForDay, 1, Side::Buy, 100, 10));
        book.insert(buy(2, 99, 5));
        book.insert(Order::new(OrderType::GoodForDay, 3, Side::Sell, 105, 2));

        let mut gfd = book.orders_with_type(OrderType::GoodForDay);
        gfd.sort_unstable();
        assert_eq!(gfd, vec![1, 3]);
    }

    #[test]
    fn test_book_consistency_catches_crossed_book() {
        let mut book = Book::new();
        // Insert a crossed pair directly, bypassing the engine.
        book.insert(buy(1, 101, 10));
        book.insert(sell(2, 100, 10));

        assert_eq!(
            book.check_consistency(),
            Err(ConsistencyError::CrossedBook { bid: 101, ask: 100 })
        );
    }
}
