//! Rolling tape of recent trades

use std::collections::VecDeque;
use std::env;

use common::decimal::{Amount, Price, Quantity};
use common::error::{Error, Result};
use common::model::event::BookEvent;
use common::model::trade::Trade;
use matching_engine::EventSink;
use tracing::{debug, warn};

use crate::models::TradeMessage;

/// Number of trades kept when no capacity is configured
pub const DEFAULT_TAPE_CAPACITY: usize = 100;

/// Keeps the last `capacity` trades plus running session totals
#[derive(Debug, Clone)]
pub struct TradeTape {
    capacity: usize,
    trades: VecDeque<TradeMessage>,
    next_sequence: u64,
    last_price: Option<Price>,
    volume: Quantity,
    notional: Amount,
}

impl Default for TradeTape {
    fn default() -> Self {
        Self::empty(DEFAULT_TAPE_CAPACITY)
    }
}

impl TradeTape {
    /// Create a tape holding at most `capacity` trades
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ConfigurationError("trade tape capacity must be at least 1".to_string()));
        }
        Ok(Self::empty(capacity))
    }

    /// Create a tape sized from `TAPE_CAPACITY`, falling back to the default
    pub fn from_env() -> Result<Self> {
        match env::var("TAPE_CAPACITY") {
            Ok(value) => {
                let capacity = value.trim().parse::<usize>().map_err(|e| {
                    Error::ConfigurationError(format!("TAPE_CAPACITY={:?}: {}", value, e))
                })?;
                Self::new(capacity)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            trades: VecDeque::with_capacity(capacity),
            next_sequence: 1,
            last_price: None,
            volume: Quantity::ZERO,
            notional: Amount::ZERO,
        }
    }

    /// Record a trade, evicting the oldest once full
    pub fn record(&mut self, trade: &Trade) {
        let message = TradeMessage::new(self.next_sequence, trade);
        self.next_sequence += 1;

        self.last_price = Some(trade.price);
        self.volume = self.volume.checked_add(trade.size).unwrap_or_else(|| {
            warn!(size = %trade.size, "Session volume overflowed, saturating");
            Quantity::MAX
        });
        self.notional = trade
            .amount()
            .and_then(|amount| self.notional.checked_add(amount))
            .unwrap_or_else(|| {
                warn!(price = %trade.price, size = %trade.size, "Session notional overflowed, saturating");
                Amount::MAX
            });

        if self.trades.len() == self.capacity {
            self.trades.pop_front();
        }
        debug!(sequence = message.sequence, price = %message.price, size = %message.quantity, "Trade taped");
        self.trades.push_back(message);
    }

    /// Most recent trades, newest first
    pub fn recent(&self, limit: usize) -> Vec<TradeMessage> {
        self.trades.iter().rev().take(limit).cloned().collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Total trades seen, including evicted ones
    pub fn trade_count(&self) -> u64 {
        self.next_sequence - 1
    }

    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    /// Session volume
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Session notional (sum of price * size)
    pub fn notional(&self) -> Amount {
        self.notional
    }

    /// Volume weighted average price over the session
    pub fn vwap(&self) -> Option<Price> {
        if self.volume.is_zero() {
            return None;
        }
        self.notional.checked_div(self.volume).map(|vwap| vwap.normalize())
    }
}

impl EventSink for TradeTape {
    fn on_event(&mut self, event: &BookEvent) {
        if let BookEvent::Trade(trade) = event {
            self.record(trade);
        }
    }
}
