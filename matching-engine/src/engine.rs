use std::collections::HashMap;

use common::decimal::{is_positive, Price, Quantity};
use common::error::{Error, Result};
use common::model::event::BookEvent;
use common::model::order::{Order, OrderId, Side, Status};
use common::model::trade::Trade;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::arena::{OrderArena, OrderKey};
use crate::config::EngineConfig;
use crate::events::EventSink;
use crate::order_book::{Asks, Bids, BookSide, SideOrdering};

/// Outcome of a limit order submission
#[derive(Debug, Clone, Serialize)]
pub struct OrderHandle {
    /// The order as it stands after matching; resting unless fully filled
    pub order: Order,
    /// Trades the order took part in as taker, in execution order
    pub trades: Vec<Trade>,
}

impl OrderHandle {
    pub fn id(&self) -> OrderId {
        self.order.id
    }

    pub fn status(&self) -> Status {
        self.order.status
    }

    /// True if part of the order was left on the book
    pub fn is_resting(&self) -> bool {
        !self.order.is_filled()
    }

    pub fn filled_size(&self) -> Quantity {
        self.order.filled_size()
    }
}

/// Single-instrument matching engine with price-time priority
///
/// Every call runs to completion before returning; a multi-threaded host must
/// serialise access to one engine. Sinks are called inline with the mutation
/// that produced the event and must not call back into the engine.
pub struct MatchingEngine {
    config: EngineConfig,
    bids: BookSide<Bids>,
    asks: BookSide<Asks>,
    /// Owns every resting order
    orders: OrderArena,
    /// Resting order id -> arena key
    index: HashMap<OrderId, OrderKey>,
    next_id: u64,
    next_sequence: u64,
    last_price: Option<Price>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl MatchingEngine {
    /// Create a new matching engine with default configuration and no sinks
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        info!(
            first_order_id = config.first_order_id,
            verify_invariants = config.verify_invariants,
            "Creating matching engine"
        );
        Self {
            next_id: config.first_order_id,
            next_sequence: 1,
            config,
            bids: BookSide::new(),
            asks: BookSide::new(),
            orders: OrderArena::new(),
            index: HashMap::new(),
            last_price: None,
            sinks: Vec::new(),
        }
    }

    /// Create an engine that reports to `sink` from the first event on
    pub fn with_sink<S: EventSink + 'static>(config: EngineConfig, sink: S) -> Self {
        let mut engine = Self::with_config(config);
        engine.subscribe(sink);
        engine
    }

    /// Register a sink; sinks are called in registration order
    pub fn subscribe<S: EventSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit a limit order
    ///
    /// The order is matched against the opposite side from the best price
    /// outwards; whatever is left rests on its own side. Fails with
    /// `InvalidOrder` before touching the book if size or price is not
    /// positive, or if resting it could overflow the volume of its level.
    pub fn submit_limit_order(&mut self, side: Side, price: Price, size: Quantity) -> Result<OrderHandle> {
        if !is_positive(size) {
            warn!(%side, %price, %size, "Rejected order with non-positive size");
            return Err(Error::InvalidOrder(format!("size must be positive, got {}", size)));
        }
        if !is_positive(price) {
            warn!(%side, %price, %size, "Rejected order with non-positive price");
            return Err(Error::InvalidOrder(format!("price must be positive, got {}", price)));
        }

        let own_depth = match side {
            Side::Buy => self.bids.depth_at(price),
            Side::Sell => self.asks.depth_at(price),
        };
        if own_depth.checked_add(size).is_none() {
            warn!(%side, %price, %size, "Rejected order that would overflow its level");
            return Err(Error::InvalidOrder(format!("size {} overflows the level at {}", size, price)));
        }

        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| Error::Internal("order ids exhausted".to_string()))?;
        let next_sequence = self
            .next_sequence
            .checked_add(1)
            .ok_or_else(|| Error::Internal("order sequences exhausted".to_string()))?;
        let id = OrderId(self.next_id);
        let sequence = self.next_sequence;
        self.next_id = next_id;
        self.next_sequence = next_sequence;

        let mut order = Order::new_limit(id, side, price, size, sequence);
        debug!(order_id = %id, %side, %price, %size, sequence, "Accepted limit order");

        let trades = match side {
            Side::Buy => Self::match_against(&mut self.asks, &mut self.orders, &mut self.index, &mut self.sinks, &mut order)?,
            Side::Sell => Self::match_against(&mut self.bids, &mut self.orders, &mut self.index, &mut self.sinks, &mut order)?,
        };

        if let Some(trade) = trades.last() {
            self.last_price = Some(trade.price);
        }

        if order.is_filled() {
            debug!(order_id = %id, trades = trades.len(), "Order filled on entry");
        } else {
            debug!(order_id = %id, remaining = %order.remaining_size, "Adding limit order to the book");
            self.rest(&order);
        }

        self.after_mutation()?;
        Ok(OrderHandle { order, trades })
    }

    /// Cancel a resting order, removing all of its remaining size
    ///
    /// Fails with `UnknownOrder` if the id never rested, was already filled
    /// or was already cancelled.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order> {
        let key = match self.index.get(&order_id) {
            Some(key) => *key,
            None => {
                warn!(%order_id, "Cancel for order that is not resting");
                return Err(Error::UnknownOrder(order_id));
            }
        };

        let removed = match self.orders.get(key) {
            Some(order) => match order.side {
                Side::Buy => self.bids.remove_order(key, order.price, order.remaining_size),
                Side::Sell => self.asks.remove_order(key, order.price, order.remaining_size),
            },
            None => false,
        };
        if !removed {
            return Err(Error::Internal(format!("order {} is indexed but not queued", order_id)));
        }

        self.index.remove(&order_id);
        let mut order = self
            .orders
            .remove(key)
            .ok_or_else(|| Error::Internal(format!("order {} missing from arena", order_id)))?;
        order.status = Status::Cancelled;

        debug!(%order_id, price = %order.price, remaining = %order.remaining_size, "Cancelled order");
        emit(&mut self.sinks, || BookEvent::Cancel { order: order.clone() });

        self.after_mutation()?;
        Ok(order)
    }

    /// Get the best bid price
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Get the best ask price
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Remaining size resting at `price` on either side
    pub fn depth_at(&self, price: Price) -> Quantity {
        let bid = self.bids.depth_at(price);
        if bid.is_zero() {
            self.asks.depth_at(price)
        } else {
            bid
        }
    }

    /// Look up a resting order
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        self.index.get(&order_id).and_then(|key| self.orders.get(*key))
    }

    /// Get bid price levels with volumes, best first
    pub fn bid_levels(&self, limit: usize) -> Vec<(Price, Quantity)> {
        self.bids.price_levels(limit)
    }

    /// Get ask price levels with volumes, best first
    pub fn ask_levels(&self, limit: usize) -> Vec<(Price, Quantity)> {
        self.asks.price_levels(limit)
    }

    /// Get the current spread
    pub fn spread(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get the mid price, or the last traded price if a side is empty
    pub fn mid_price(&self) -> Option<Price> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(bid + (ask - bid) / Decimal::TWO),
            _ => self.last_price,
        }
    }

    /// Price of the most recent trade
    pub fn last_price(&self) -> Option<Price> {
        self.last_price
    }

    /// Number of resting orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Sequence of the most recently accepted order, 0 before the first
    pub fn last_sequence(&self) -> u64 {
        self.next_sequence - 1
    }

    /// Get a reference to the bids side
    pub fn bids(&self) -> &BookSide<Bids> {
        &self.bids
    }

    /// Get a reference to the asks side
    pub fn asks(&self) -> &BookSide<Asks> {
        &self.asks
    }

    /// Verify the book's structural invariants
    ///
    /// Checks that the book is not crossed, that every level's cached volume
    /// matches its orders, that queues are in arrival order and that the id
    /// index covers exactly the resting orders.
    pub fn check_invariants(&self) -> Result<()> {
        if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
            if bid >= ask {
                return Err(Error::CrossedBook { bid, ask });
            }
        }

        self.check_side(&self.bids)?;
        self.check_side(&self.asks)?;

        let queued = self.bids.order_count() + self.asks.order_count();
        if queued != self.index.len() || self.index.len() != self.orders.len() {
            return Err(Error::Internal(format!(
                "{} queued orders, {} indexed, {} in arena",
                queued,
                self.index.len(),
                self.orders.len()
            )));
        }
        Ok(())
    }

    fn check_side<S: SideOrdering>(&self, book: &BookSide<S>) -> Result<()> {
        for level in book.iter_levels() {
            let price = level.price();
            if level.is_empty() {
                return Err(Error::Internal(format!("empty {} level at {}", S::SIDE, price)));
            }
            let computed = level.computed_volume(&self.orders);
            if computed != level.volume() {
                return Err(Error::Internal(format!(
                    "{} level at {} caches volume {} but holds {}",
                    S::SIDE,
                    price,
                    level.volume(),
                    computed
                )));
            }

            let mut previous_sequence = 0;
            for key in level.order_keys() {
                let order = self
                    .orders
                    .get(*key)
                    .ok_or_else(|| Error::Internal(format!("{} level at {} holds a dangling key", S::SIDE, price)))?;
                if order.price != price || order.side != S::SIDE || !is_positive(order.remaining_size) {
                    return Err(Error::Internal(format!("order {} does not belong at {} {}", order.id, S::SIDE, price)));
                }
                if order.sequence <= previous_sequence {
                    return Err(Error::Internal(format!("level at {} is out of arrival order", price)));
                }
                previous_sequence = order.sequence;
                if self.index.get(&order.id) != Some(key) {
                    return Err(Error::Internal(format!("order {} is queued but not indexed", order.id)));
                }
            }
        }
        Ok(())
    }

    /// Walk `book` from its best price while the taker is marketable
    ///
    /// Each level is processed in two phases: fills are applied in arrival
    /// order, then the fully filled makers, always a prefix of the queue, are
    /// dropped in one go.
    fn match_against<S: SideOrdering>(
        book: &mut BookSide<S>,
        orders: &mut OrderArena,
        index: &mut HashMap<OrderId, OrderKey>,
        sinks: &mut [Box<dyn EventSink>],
        taker: &mut Order,
    ) -> Result<Vec<Trade>> {
        let mut trades = Vec::new();

        while !taker.is_filled() && book.is_marketable(taker.price) {
            let price = match book.best_price() {
                Some(price) => price,
                None => break,
            };
            let level = book
                .level_at_mut(price)
                .ok_or_else(|| Error::Internal(format!("best price {} has no level", price)))?;

            let mut consumed = 0;
            let mut traded = Quantity::ZERO;
            for key in level.order_keys() {
                let maker = orders
                    .get_mut(*key)
                    .ok_or_else(|| Error::Internal(format!("level at {} holds a dangling key", price)))?;

                let size = taker.remaining_size.min(maker.remaining_size);
                taker.fill(size);
                maker.fill(size);
                traded += size;

                let trade = Trade::new(taker.id, maker.id, size, maker.price, taker.side);
                debug!(
                    taker_id = %trade.taker_id,
                    maker_id = %trade.maker_id,
                    size = %trade.size,
                    price = %trade.price,
                    "Trade"
                );
                emit(sinks, || BookEvent::Trade(trade));
                trades.push(trade);

                if maker.is_filled() {
                    consumed += 1;
                }
                if taker.is_filled() {
                    break;
                }
            }

            if traded.is_zero() {
                return Err(Error::Internal(format!("level at {} has volume but no orders", price)));
            }

            for key in level.drain_front(consumed) {
                if let Some(maker) = orders.remove(key) {
                    index.remove(&maker.id);
                }
            }
            level.reduce_volume(traded);
            book.remove_level_if_empty(price);
        }

        Ok(trades)
    }

    fn rest(&mut self, order: &Order) {
        let key = self.orders.insert(order.clone());
        match order.side {
            Side::Buy => self.bids.insert_order(key, order),
            Side::Sell => self.asks.insert_order(key, order),
        }
        self.index.insert(order.id, key);
        emit(&mut self.sinks, || BookEvent::New { order: order.clone() });
    }

    fn after_mutation(&self) -> Result<()> {
        debug_assert!(
            match (self.best_bid(), self.best_ask()) {
                (Some(bid), Some(ask)) => bid < ask,
                _ => true,
            },
            "book crossed after mutation"
        );
        if self.config.verify_invariants {
            self.check_invariants()?;
        }
        Ok(())
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver an event to every sink; the event is only built if someone listens
fn emit<F>(sinks: &mut [Box<dyn EventSink>], make_event: F)
where
    F: FnOnce() -> BookEvent,
{
    if sinks.is_empty() {
        return;
    }
    let event = make_event();
    for sink in sinks.iter_mut() {
        sink.on_event(&event);
    }
}
