//! Trade models and related types

use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Price, Quantity};
use crate::model::order::{OrderId, Side};

/// A fill between an incoming (taker) order and a resting (maker) order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Incoming order that triggered the match
    pub taker_id: OrderId,
    /// Resting order that was matched against
    pub maker_id: OrderId,
    /// Size traded
    pub size: Quantity,
    /// Execution price; always the maker's price
    pub price: Price,
    /// Side of the taker
    pub taker_side: Side,
}

impl Trade {
    /// Create a new trade from a match
    pub fn new(taker_id: OrderId, maker_id: OrderId, size: Quantity, price: Price, taker_side: Side) -> Self {
        Self {
            taker_id,
            maker_id,
            size,
            price,
            taker_side,
        }
    }

    /// Notional value (price * size), `None` if it does not fit a decimal
    pub fn amount(&self) -> Option<Amount> {
        self.price.checked_mul(self.size)
    }
}
