//! Price level management for orders at the same price.
//!
//! ## Design
//!
//! A `PriceLevel` represents all orders resting at a single price, kept in a
//! doubly-linked FIFO over the shared slab (time priority):
//!
//! ```text
//! head (oldest) <-> order2 <-> order3 <-> tail (newest)
//! ```
//!
//! - New orders are appended at the tail
//! - Matching consumes orders from the head
//! - Cancellation removes an order anywhere in the queue in O(1) by slab key

use slab::Slab;

use crate::book::node::OrderNode;
use crate::types::{Price, Quantity};

/// A price level containing orders at a single price.
///
/// The order data lives in the slab; this struct holds only the queue
/// metadata and running per-level statistics.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Price for this level, in ticks
    pub price: Price,

    /// Total remaining quantity at this level
    pub total_quantity: u64,

    /// Head of the order queue (oldest order, slab key)
    pub head: Option<usize>,

    /// Tail of the order queue (newest order, slab key)
    pub tail: Option<usize>,

    /// Number of orders at this price level
    pub order_count: usize,
}

impl PriceLevel {
    /// Create a new empty price level.
    pub fn new(price: Price) -> Self {
        Self {
            price,
            total_quantity: 0,
            head: None,
            tail: None,
            order_count: 0,
        }
    }

    /// True when no orders rest at this level.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Append an order to the tail of the queue.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not exist in the slab.
    pub fn push_back(&mut self, key: usize, slab: &mut Slab<OrderNode>) {
        let node = slab.get_mut(key).expect("invalid slab key");
        let quantity = node.remaining();

        node.prev = self.tail;
        node.next = None;

        if let Some(tail_key) = self.tail {
            let tail_node = slab.get_mut(tail_key).expect("invalid tail key");
            tail_node.next = Some(key);
        } else {
            self.head = Some(key);
        }

        self.tail = Some(key);
        self.order_count += 1;
        self.total_quantity += quantity as u64;
    }

    /// Unlink an order from the queue by slab key.
    ///
    /// Returns the remaining quantity of the removed order. The caller is
    /// responsible for releasing the slab slot.
    pub fn remove(&mut self, key: usize, slab: &mut Slab<OrderNode>) -> Quantity {
        let node = slab.get(key).expect("invalid slab key");
        let quantity = node.remaining();
        let prev_key = node.prev;
        let next_key = node.next;

        if let Some(prev) = prev_key {
            let prev_node = slab.get_mut(prev).expect("invalid prev key");
            prev_node.next = next_key;
        } else {
            self.head = next_key;
        }

        if let Some(next) = next_key {
            let next_node = slab.get_mut(next).expect("invalid next key");
            next_node.prev = prev_key;
        } else {
            self.tail = prev_key;
        }

        let node = slab.get_mut(key).expect("invalid slab key");
        node.prev = None;
        node.next = None;

        self.order_count -= 1;
        self.total_quantity -= quantity as u64;

        quantity
    }

    /// Slab key of the head order (oldest; first to match).
    #[inline]
    pub fn peek_head(&self) -> Option<usize> {
        self.head
    }

    /// Reduce the level total after a partial fill of one of its orders.
    #[inline]
    pub fn reduce_quantity(&mut self, filled_quantity: Quantity) {
        self.total_quantity -= filled_quantity as u64;
    }

    /// Iterate the level's orders in queue (time-priority) order.
    pub fn iter<'a>(&self, slab: &'a Slab<OrderNode>) -> LevelIter<'a> {
        LevelIter {
            slab,
            next: self.head,
        }
    }
}

/// Iterator over a level's queue, head (oldest) to tail (newest).
pub struct LevelIter<'a> {
    slab: &'a Slab<OrderNode>,
    next: Option<usize>,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a OrderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.next?;
        let node = self.slab.get(key)?;
        self.next = node.next;
        Some(node)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
