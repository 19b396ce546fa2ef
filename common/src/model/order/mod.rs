//! Order models and related types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Price, Quantity};

/// Engine-assigned order identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Accepted and resting without any fill
    New,
    /// Some size traded, the remainder is resting
    PartiallyFilled,
    /// Fully traded, no longer in the book
    Filled,
    /// Removed from the book by a cancel
    Cancelled,
}

/// Limit order
///
/// Created by the engine on submission, mutated in place while it is matched
/// and dropped from the book once `remaining_size` reaches zero or it is
/// cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Engine-assigned order ID
    pub id: OrderId,
    /// Order side (buy or sell)
    pub side: Side,
    /// Limit price
    pub price: Price,
    /// Size at submission
    pub original_size: Quantity,
    /// Size still open
    pub remaining_size: Quantity,
    /// Arrival sequence; defines time priority at equal price
    pub sequence: u64,
    /// Current status
    pub status: Status,
    /// Wall-clock time the engine accepted the order
    pub accepted_at: DateTime<Utc>,
}

impl Order {
    /// Create a new limit order as accepted by the engine
    pub fn new_limit(id: OrderId, side: Side, price: Price, size: Quantity, sequence: u64) -> Self {
        Self {
            id,
            side,
            price,
            original_size: size,
            remaining_size: size,
            sequence,
            status: Status::New,
            accepted_at: Utc::now(),
        }
    }

    /// Size traded so far
    pub fn filled_size(&self) -> Quantity {
        self.original_size - self.remaining_size
    }

    /// Check if the order is fully filled
    pub fn is_filled(&self) -> bool {
        self.remaining_size.is_zero()
    }

    /// Apply a fill of `size`, which must not exceed the remaining size
    pub fn fill(&mut self, size: Quantity) {
        debug_assert!(size <= self.remaining_size, "fill exceeds remaining size");
        self.remaining_size -= size;
        self.status = if self.remaining_size.is_zero() {
            Status::Filled
        } else {
            Status::PartiallyFilled
        };
    }
}
