//! Slot arena owning every resting order
//!
//! Price levels and the order-id index both refer to orders by [`OrderKey`];
//! all mutation goes through the arena, so no order is ever aliased mutably
//! from two places.

use common::model::order::Order;

/// Stable handle to an order slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderKey(usize);

/// Arena of resting orders with slot reuse
#[derive(Debug, Default)]
pub struct OrderArena {
    slots: Vec<Option<Order>>,
    free: Vec<usize>,
    len: usize,
}

impl OrderArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an order and return its key
    pub fn insert(&mut self, order: Order) -> OrderKey {
        self.len += 1;
        match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(order);
                OrderKey(index)
            }
            None => {
                self.slots.push(Some(order));
                OrderKey(self.slots.len() - 1)
            }
        }
    }

    pub fn get(&self, key: OrderKey) -> Option<&Order> {
        self.slots.get(key.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, key: OrderKey) -> Option<&mut Order> {
        self.slots.get_mut(key.0).and_then(Option::as_mut)
    }

    /// Take the order out of its slot; the key may be handed out again
    pub fn remove(&mut self, key: OrderKey) -> Option<Order> {
        let order = self.slots.get_mut(key.0)?.take()?;
        self.free.push(key.0);
        self.len -= 1;
        Some(order)
    }

    /// Number of live orders
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
