//! Depth projection over the engine's event stream
//!
//! Keeps aggregate remaining size per price purely from `New`, `Trade` and
//! `Cancel` events. It never feeds back into the engine.

use std::collections::BTreeMap;

use common::decimal::{Price, Quantity};
use common::model::event::BookEvent;
use matching_engine::EventSink;
use tracing::warn;

use crate::models::PriceLevel;

/// Aggregate depth by price, rebuilt from events
#[derive(Debug, Default, Clone)]
pub struct DepthTracker {
    depth: BTreeMap<Price, Quantity>,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the projection
    pub fn apply(&mut self, event: &BookEvent) {
        match event {
            BookEvent::New { order } => self.increase(order.price, order.remaining_size),
            BookEvent::Trade(trade) => self.decrease(trade.price, trade.size),
            BookEvent::Cancel { order } => self.decrease(order.price, order.remaining_size),
        }
    }

    /// Observed depth at `price`; zero when nothing rests there
    pub fn depth_at(&self, price: Price) -> Quantity {
        self.depth.get(&price).copied().unwrap_or(Quantity::ZERO)
    }

    /// Non-empty prices in ascending order
    pub fn levels(&self) -> Vec<PriceLevel> {
        self.depth
            .iter()
            .map(|(price, quantity)| PriceLevel { price: *price, quantity: *quantity })
            .collect()
    }

    /// Number of prices with depth
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    fn increase(&mut self, price: Price, size: Quantity) {
        *self.depth.entry(price).or_insert(Quantity::ZERO) += size;
    }

    fn decrease(&mut self, price: Price, size: Quantity) {
        let current = self.depth_at(price);
        let remaining = current - size;
        if remaining < Quantity::ZERO {
            // Subscribed after the order was inserted; nothing sensible to keep
            warn!(%price, %current, %size, "Depth went negative, dropping level");
        }
        if remaining <= Quantity::ZERO {
            self.depth.remove(&price);
        } else {
            self.depth.insert(price, remaining);
        }
    }
}

impl EventSink for DepthTracker {
    fn on_event(&mut self, event: &BookEvent) {
        self.apply(event);
    }
}
