//! Lifecycle events emitted by the matching engine

use serde::{Deserialize, Serialize};

use crate::model::order::Order;
use crate::model::trade::Trade;

/// Event emitted inline with the book mutation that caused it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookEvent {
    /// An order started resting; `order.remaining_size` is the inserted size
    New { order: Order },
    /// A taker matched a maker
    Trade(Trade),
    /// A resting order was removed; `order.remaining_size` is the size withdrawn
    Cancel { order: Order },
}

impl BookEvent {
    /// Short event name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            BookEvent::New { .. } => "new",
            BookEvent::Trade(_) => "trade",
            BookEvent::Cancel { .. } => "cancel",
        }
    }
}
