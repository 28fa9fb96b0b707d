//! Price-time priority matching.
//!
//! ## Matching Rules
//!
//! - Buy orders match against asks, lowest price first
//! - Sell orders match against bids, highest price first
//! - Among equal prices, the earliest-arriving order fills first
//! - Partial fills are supported; GTC/GFD residuals rest on the book
//!
//! ## Order-type policy
//!
//! | Type | Pre-check | Residual after matching |
//! |------|-----------|-------------------------|
//! | GoodTillCancel | none | rests |
//! | GoodForDay | none | rests (until session close) |
//! | FillAndKill | opposing best level must cross | cancelled |
//! | FillOrKill | full quantity must be immediately fillable | none (guaranteed by pre-check) |
//! | Market | none; price rewritten to an aggressive sentinel | cancelled |

use tracing::{debug, trace, warn};

use crate::book::Book;
use crate::types::{Order, OrderId, OrderType, Price, Quantity, Side, Trade, TradeInfo};

/// The matching policy layer over a [`Book`].
///
/// Stateless: all state lives in the book, so a single engine value can
/// serve any number of books (and is trivially shared under the monitor's
/// mutex).
///
/// ## Example
///
/// ```
/// use matchbook::book::Book;
/// use matchbook::engine::MatchingEngine;
/// use matchbook::types::{Order, OrderType, Side};
///
/// let mut book = Book::new();
/// let engine = MatchingEngine::new();
///
/// engine.add_order(&mut book, Order::new(OrderType::GoodTillCancel, 1, Side::Sell, 100, 10));
/// let trades = engine.add_order(&mut book, Order::new(OrderType::GoodTillCancel, 2, Side::Buy, 100, 10));
///
/// assert_eq!(trades.len(), 1);
/// assert!(book.is_empty());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchingEngine;

impl MatchingEngine {
    pub fn new() -> Self {
        Self
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Admit a new order and immediately attempt matching.
    ///
    /// Returns the trades produced by this call, in the order generated.
    /// Rejections (duplicate id, zero quantity, unfillable FAK/FOK) return
    /// an empty trade list and leave the book untouched.
    pub fn add_order(&self, book: &mut Book, mut order: Order) -> Vec<Trade> {
        if book.contains(order.id) {
            warn!(order_id = order.id, "duplicate order id, rejecting");
            return Vec::new();
        }

        if order.initial_quantity == 0 {
            warn!(order_id = order.id, "zero-quantity order, rejecting");
            return Vec::new();
        }

        // A market order becomes an aggressive limit: its sentinel price
        // crosses every opposing level, and any residual is cancelled below
        // instead of resting at the sentinel.
        if order.order_type == OrderType::Market {
            order.price = match order.side {
                Side::Buy => Price::MAX,
                Side::Sell => Price::MIN,
            };
        }

        match order.order_type {
            OrderType::FillAndKill if !self.can_match(book, order.side, order.price) => {
                debug!(order_id = order.id, "fill-and-kill cannot match, rejecting");
                return Vec::new();
            }
            OrderType::FillOrKill
                if !self.can_fully_fill(book, order.side, order.price, order.initial_quantity) =>
            {
                debug!(order_id = order.id, "fill-or-kill cannot fully fill, rejecting");
                return Vec::new();
            }
            _ => {}
        }

        let order_id = order.id;
        let order_type = order.order_type;

        book.insert(order);
        let trades = self.match_orders(book);

        // Residual cleanup: FAK and Market aggressors never rest.
        if matches!(order_type, OrderType::FillAndKill | OrderType::Market)
            && book.contains(order_id)
        {
            debug!(order_id, "cancelling unfilled aggressor residual");
            book.remove(order_id);
        }

        trades
    }

    /// Cancel a resting order. Silently no-ops when the id is unknown.
    pub fn cancel_order(&self, book: &mut Book, order_id: OrderId) {
        if book.remove(order_id).is_none() {
            debug!(order_id, "cancel for unknown order id ignored");
        }
    }

    /// Replace a resting order's side, price and quantity, preserving its
    /// type. Semantically cancel + re-add, so the order loses time priority.
    ///
    /// Returns the trades produced by the re-add, or an empty list when the
    /// id is unknown.
    pub fn modify_order(
        &self,
        book: &mut Book,
        order_id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Vec<Trade> {
        let Some(existing) = book.get(order_id) else {
            debug!(order_id, "modify for unknown order id ignored");
            return Vec::new();
        };
        let order_type = existing.order_type;

        self.cancel_order(book, order_id);
        self.add_order(book, Order::new(order_type, order_id, side, price, quantity))
    }

    // ========================================================================
    // Viability predicates
    // ========================================================================

    /// True when an order at `price` would cross the opposing best level.
    pub fn can_match(&self, book: &Book, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => book.best_ask().is_some_and(|best_ask| price >= best_ask),
            Side::Sell => book.best_bid().is_some_and(|best_bid| price <= best_bid),
        }
    }

    /// True when `quantity` can be filled in full against opposing levels
    /// priced at or better than `price`.
    ///
    /// Walks the opposing ladder best-first and stops at the first level
    /// beyond the limit; per-level totals come from the aggregates map.
    pub fn can_fully_fill(
        &self,
        book: &Book,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> bool {
        if !self.can_match(book, side, price) {
            return false;
        }

        let mut outstanding = quantity as u64;

        match side {
            Side::Buy => {
                for level_price in book.ask_prices() {
                    if level_price > price {
                        break;
                    }
                    let available = book.aggregate_quantity_at(level_price);
                    if outstanding <= available {
                        return true;
                    }
                    outstanding -= available;
                }
            }
            Side::Sell => {
                for level_price in book.bid_prices() {
                    if level_price < price {
                        break;
                    }
                    let available = book.aggregate_quantity_at(level_price);
                    if outstanding <= available {
                        return true;
                    }
                    outstanding -= available;
                }
            }
        }

        false
    }

    // ========================================================================
    // Crossing loop
    // ========================================================================

    /// Drain crossing quantity from the top of the book.
    ///
    /// While both sides are non-empty and `best_bid >= best_ask`, the head
    /// orders of the two best levels fill each other by
    /// `min(remaining, remaining)`. Each trade half reports its own resting
    /// order's displayed price, so the two halves of one trade may differ.
    fn match_orders(&self, book: &mut Book) -> Vec<Trade> {
        let mut trades = Vec::new();

        while let Some((bid_key, ask_key)) = book.best_heads() {
            let bid = book.order_at(bid_key);
            let ask = book.order_at(ask_key);

            if bid.price < ask.price {
                break;
            }

            let quantity = bid.remaining_quantity.min(ask.remaining_quantity);

            let bid_fill = book.apply_fill(bid_key, quantity);
            let ask_fill = book.apply_fill(ask_key, quantity);

            trace!(
                bid_id = bid_fill.order_id,
                ask_id = ask_fill.order_id,
                bid_price = bid_fill.price,
                ask_price = ask_fill.price,
                quantity,
                "trade"
            );

            trades.push(Trade::new(
                TradeInfo {
                    order_id: bid_fill.order_id,
                    price: bid_fill.price,
                    quantity,
                },
                TradeInfo {
                    order_id: ask_fill.order_id,
                    price: ask_fill.price,
                    quantity,
                },
            ));
        }

        trades
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
