//! Trade records emitted by the matching engine.
//!
//! A trade pairs one bid-side record with one ask-side record. Both halves
//! carry the same matched quantity, but each carries its *own* resting
//! order's displayed price. During a cross `best_bid >= best_ask`, so the
//! two prices may differ; downstream consumers compute notional from
//! whichever half they care about.

use crate::types::order::{OrderId, Price, Quantity};

/// One side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeInfo {
    /// Id of the order on this side of the trade
    pub order_id: OrderId,

    /// This order's displayed price at execution
    pub price: Price,

    /// Matched quantity (equal on both sides)
    pub quantity: Quantity,
}

impl TradeInfo {
    /// Notional value of this half: price * quantity, widened to avoid
    /// overflow on extreme ticks.
    #[inline]
    pub fn notional(&self) -> i64 {
        self.price as i64 * self.quantity as i64
    }
}

/// An executed match between a bid and an ask.
///
/// ## Example
///
/// ```
/// use matchbook::types::{Trade, TradeInfo};
///
/// let trade = Trade::new(
///     TradeInfo { order_id: 3, price: 101, quantity: 10 },
///     TradeInfo { order_id: 2, price: 101, quantity: 10 },
/// );
/// assert_eq!(trade.quantity(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    /// The bid-side half
    pub bid: TradeInfo,

    /// The ask-side half
    pub ask: TradeInfo,
}

impl Trade {
    /// Create a trade from its two halves.
    ///
    /// Both halves must carry the same quantity; the engine always fills
    /// both parties by the same amount.
    pub fn new(bid: TradeInfo, ask: TradeInfo) -> Self {
        debug_assert_eq!(bid.quantity, ask.quantity);
        Self { bid, ask }
    }

    /// The matched quantity.
    #[inline]
    pub fn quantity(&self) -> Quantity {
        self.bid.quantity
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_new() {
        let trade = Trade::new(
            TradeInfo { order_id: 10, price: 101, quantity: 4 },
            TradeInfo { order_id: 20, price: 100, quantity: 4 },
        );

        assert_eq!(trade.bid.order_id, 10);
        assert_eq!(trade.ask.order_id, 20);
        assert_eq!(trade.quantity(), 4);
    }

    #[test]
    fn test_trade_prices_may_differ() {
        // An aggressive bid at 101 hitting an ask resting at 100 reports
        // each side at its own displayed price.
        let trade = Trade::new(
            TradeInfo { order_id: 1, price: 101, quantity: 5 },
            TradeInfo { order_id: 2, price: 100, quantity: 5 },
        );

        assert_eq!(trade.bid.price, 101);
        assert_eq!(trade.ask.price, 100);
    }

    #[test]
    fn test_trade_notional() {
        let info = TradeInfo { order_id: 1, price: 100, quantity: 7 };
        assert_eq!(info.notional(), 700);

        // Widened arithmetic: no overflow at the extremes of the tick range.
        let extreme = TradeInfo { order_id: 2, price: Price::MAX, quantity: Quantity::MAX };
        assert_eq!(extreme.notional(), Price::MAX as i64 * Quantity::MAX as i64);
    }
}
