//! Order types for the matchbook engine.
//!
//! ## Representation
//!
//! Prices are signed 32-bit integer ticks. Quantities are unsigned 32-bit.
//! Order ids are caller-assigned 64-bit values, unique while the order rests.
//!
//! Market orders carry no meaningful price of their own: the engine rewrites
//! their price to an aggressive sentinel (`Price::MAX` for buys,
//! `Price::MIN` for sells) at admission, so they cross every opposing level.

/// Price in integer ticks.
pub type Price = i32;

/// Order quantity.
pub type Quantity = u32;

/// Caller-assigned order identifier.
pub type OrderId = u64;

// ============================================================================
// Side enum
// ============================================================================

/// Order side: Buy or Sell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy order (bid) - wants to purchase the instrument
    Buy,
    /// Sell order (ask) - wants to sell the instrument
    Sell,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

// ============================================================================
// OrderType enum
// ============================================================================

/// Time-in-force / execution policy of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    /// Rests until matched or explicitly cancelled
    GoodTillCancel,
    /// Rests until the end of the trading session, then auto-cancelled
    GoodForDay,
    /// Immediate-or-cancel: takes whatever is available now, never rests
    FillAndKill,
    /// Fills the full quantity immediately or is rejected outright
    FillOrKill,
    /// No price limit; rewritten to an aggressive limit at admission
    Market,
}

// ============================================================================
// Order struct
// ============================================================================

/// A single order in the book.
///
/// `remaining_quantity` starts equal to `initial_quantity` and is decremented
/// by [`Order::fill`] as the order matches. An order with zero remaining
/// quantity never rests in the book.
///
/// ## Example
///
/// ```
/// use matchbook::types::{Order, OrderType, Side};
///
/// let order = Order::new(OrderType::GoodTillCancel, 1, Side::Buy, 100, 10);
/// assert_eq!(order.remaining_quantity, 10);
/// assert!(!order.is_filled());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Caller-assigned identifier, unique while resting
    pub id: OrderId,

    /// Buy or Sell
    pub side: Side,

    /// Execution policy
    pub order_type: OrderType,

    /// Limit price in ticks; sentinel for Market orders (set by the engine)
    pub price: Price,

    /// Quantity at submission
    pub initial_quantity: Quantity,

    /// Quantity still unfilled (0 ..= initial_quantity)
    pub remaining_quantity: Quantity,
}

impl Order {
    /// Create a new order with the full quantity unfilled.
    pub fn new(
        order_type: OrderType,
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            id,
            side,
            order_type,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// Create a Market order.
    ///
    /// The price field is a placeholder; the engine assigns the aggressive
    /// sentinel when the order is admitted.
    pub fn market(id: OrderId, side: Side, quantity: Quantity) -> Self {
        Self::new(OrderType::Market, id, side, 0, quantity)
    }

    /// Quantity filled so far.
    #[inline]
    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    /// True once the order has no remaining quantity.
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Fill the order by `quantity`.
    ///
    /// # Panics
    ///
    /// Panics if `quantity` exceeds the remaining quantity. The engine only
    /// ever fills by `min(bid.remaining, ask.remaining)`, so hitting this is
    /// a logic error, not an input error.
    #[inline]
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity <= self.remaining_quantity,
            "order {} cannot be filled for more than its remaining quantity",
            self.id
        );
        self.remaining_quantity -= quantity;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
