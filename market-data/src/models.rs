//! Market data models

use chrono::{DateTime, Utc};
use common::decimal::{Price, Quantity};
use common::model::order::{OrderId, Side};
use common::model::trade::Trade;
use matching_engine::MatchingEngine;
use serde::{Deserialize, Serialize};

/// Price level in a depth view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price
    pub price: Price,
    /// Aggregate remaining size
    pub quantity: Quantity,
}

impl From<(Price, Quantity)> for PriceLevel {
    fn from((price, quantity): (Price, Quantity)) -> Self {
        Self { price, quantity }
    }
}

/// Market depth (order book)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDepth {
    /// Sequence of the last order the engine accepted
    pub sequence: u64,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Bid side sorted by price in descending order
    pub bids: Vec<PriceLevel>,
    /// Ask side sorted by price in ascending order
    pub asks: Vec<PriceLevel>,
}

impl MarketDepth {
    /// Snapshot the top `limit` levels of each side
    pub fn from_engine(engine: &MatchingEngine, limit: usize) -> Self {
        Self {
            sequence: engine.last_sequence(),
            timestamp: Utc::now(),
            bids: engine.bid_levels(limit).into_iter().map(PriceLevel::from).collect(),
            asks: engine.ask_levels(limit).into_iter().map(PriceLevel::from).collect(),
        }
    }
}

/// Trade message as kept on the tape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeMessage {
    /// Position on the tape, starting at 1
    pub sequence: u64,
    pub taker_id: OrderId,
    pub maker_id: OrderId,
    /// Price
    pub price: Price,
    /// Quantity
    pub quantity: Quantity,
    /// Side that was the taker (initiated the match)
    pub taker_side: Side,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl TradeMessage {
    pub fn new(sequence: u64, trade: &Trade) -> Self {
        Self {
            sequence,
            taker_id: trade.taker_id,
            maker_id: trade.maker_id,
            price: trade.price,
            quantity: trade.size,
            taker_side: trade.taker_side,
            timestamp: Utc::now(),
        }
    }
}

/// Market ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    /// Best bid price
    pub bid: Option<Price>,
    /// Best ask price
    pub ask: Option<Price>,
    /// Last trade price
    pub last: Option<Price>,
    /// Ask minus bid
    pub spread: Option<Price>,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    pub fn from_engine(engine: &MatchingEngine) -> Self {
        Self {
            bid: engine.best_bid(),
            ask: engine.best_ask(),
            last: engine.last_price(),
            spread: engine.spread(),
            timestamp: Utc::now(),
        }
    }
}
