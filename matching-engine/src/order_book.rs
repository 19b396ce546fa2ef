//! Price-level index for price-time priority matching
//!
//! The price axis lives in an ordered map from price to [`PriceLevel`]; the
//! time axis lives inside each level as a FIFO queue of arena keys with a
//! cached volume. Bids and asks share one implementation and differ only in
//! their [`SideOrdering`].

use std::collections::{BTreeMap, VecDeque};
use std::marker::PhantomData;

use common::decimal::{Price, Quantity};
use common::model::order::{Order, Side};

use crate::arena::{OrderArena, OrderKey};

/// All orders resting at one price, in arrival order
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    /// Arena keys, front is the oldest order
    orders: VecDeque<OrderKey>,
    /// Sum of remaining sizes of `orders`
    volume: Quantity,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            volume: Quantity::ZERO,
        }
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Total remaining size at this level
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// A level with no volume must not stay in the index
    pub fn is_empty(&self) -> bool {
        self.volume.is_zero()
    }

    /// Keys in time priority
    pub fn order_keys(&self) -> impl Iterator<Item = &OrderKey> + '_ {
        self.orders.iter()
    }

    /// Append an order at the back of the queue
    pub fn push(&mut self, key: OrderKey, size: Quantity) {
        self.orders.push_back(key);
        self.volume += size;
    }

    /// Remove an order by key, taking `size` off the volume
    ///
    /// Returns false if the key is not queued here.
    pub fn remove(&mut self, key: OrderKey, size: Quantity) -> bool {
        match self.orders.iter().position(|k| *k == key) {
            Some(position) => {
                self.orders.remove(position);
                self.volume -= size;
                true
            }
            None => false,
        }
    }

    /// Drop the first `count` orders, which have all been fully filled
    pub fn drain_front(&mut self, count: usize) -> impl Iterator<Item = OrderKey> + '_ {
        self.orders.drain(..count.min(self.orders.len()))
    }

    /// Take traded size off the cached volume
    pub fn reduce_volume(&mut self, size: Quantity) {
        self.volume -= size;
    }

    /// Volume recomputed from the arena, for invariant checks
    pub fn computed_volume(&self, arena: &OrderArena) -> Quantity {
        self.orders
            .iter()
            .filter_map(|key| arena.get(*key))
            .map(|order| order.remaining_size)
            .sum()
    }
}

/// Price ordering of one side of the book
pub trait SideOrdering {
    /// Side of the orders resting here
    const SIDE: Side;

    /// True if `a` has better priority than `b`
    fn is_better(a: Price, b: Price) -> bool;

    /// Best key of a level map
    fn best_of(levels: &BTreeMap<Price, PriceLevel>) -> Option<Price>;

    /// Levels from best to worst
    fn iter_best_first(levels: &BTreeMap<Price, PriceLevel>) -> Box<dyn Iterator<Item = &PriceLevel> + '_>;

    /// True if an incoming order limited at `limit` can trade against `resting`
    fn is_marketable(resting: Price, limit: Price) -> bool;
}

/// Buy side ordering: highest price first
#[derive(Debug, Clone, Copy)]
pub struct Bids;

/// Sell side ordering: lowest price first
#[derive(Debug, Clone, Copy)]
pub struct Asks;

impl SideOrdering for Bids {
    const SIDE: Side = Side::Buy;

    fn is_better(a: Price, b: Price) -> bool {
        a > b
    }

    fn best_of(levels: &BTreeMap<Price, PriceLevel>) -> Option<Price> {
        levels.keys().next_back().copied()
    }

    fn iter_best_first(levels: &BTreeMap<Price, PriceLevel>) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        Box::new(levels.values().rev())
    }

    // An incoming sell crosses a bid at or above its limit
    fn is_marketable(resting: Price, limit: Price) -> bool {
        resting >= limit
    }
}

impl SideOrdering for Asks {
    const SIDE: Side = Side::Sell;

    fn is_better(a: Price, b: Price) -> bool {
        a < b
    }

    fn best_of(levels: &BTreeMap<Price, PriceLevel>) -> Option<Price> {
        levels.keys().next().copied()
    }

    fn iter_best_first(levels: &BTreeMap<Price, PriceLevel>) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        Box::new(levels.values())
    }

    // An incoming buy crosses an ask at or below its limit
    fn is_marketable(resting: Price, limit: Price) -> bool {
        resting <= limit
    }
}

/// One side of the order book
///
/// A price key is present if and only if its level has volume. The best price
/// is cached so lookups do not walk the tree.
#[derive(Debug, Clone)]
pub struct BookSide<S: SideOrdering> {
    levels: BTreeMap<Price, PriceLevel>,
    best: Option<Price>,
    _ordering: PhantomData<S>,
}

impl<S: SideOrdering> BookSide<S> {
    /// Create a new empty side
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
            best: None,
            _ordering: PhantomData,
        }
    }

    /// Best price on this side (highest bid / lowest ask)
    pub fn best_price(&self) -> Option<Price> {
        self.best
    }

    /// True if an incoming order limited at `limit` can trade against this side
    pub fn is_marketable(&self, limit: Price) -> bool {
        self.best.map_or(false, |best| S::is_marketable(best, limit))
    }

    pub fn level_at(&self, price: Price) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn level_at_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Queue an order at its price, creating the level on first use
    pub fn insert_order(&mut self, key: OrderKey, order: &Order) {
        debug_assert_eq!(order.side, S::SIDE, "order inserted on the wrong side");
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push(key, order.remaining_size);

        if self.best.map_or(true, |best| S::is_better(order.price, best)) {
            self.best = Some(order.price);
        }
    }

    /// Remove a single order from its level
    ///
    /// Returns false if the order is not queued at `price`. Empty levels are
    /// dropped.
    pub fn remove_order(&mut self, key: OrderKey, price: Price, size: Quantity) -> bool {
        let removed = match self.levels.get_mut(&price) {
            Some(level) => level.remove(key, size),
            None => false,
        };
        if removed {
            self.remove_level_if_empty(price);
        }
        removed
    }

    /// Drop the level at `price` if its volume reached zero
    ///
    /// Must be called after any mutation that lowers a level's volume.
    pub fn remove_level_if_empty(&mut self, price: Price) -> bool {
        let empty = self.levels.get(&price).map_or(false, PriceLevel::is_empty);
        if empty {
            self.levels.remove(&price);
            if self.best == Some(price) {
                self.best = S::best_of(&self.levels);
            }
        }
        empty
    }

    /// Volume resting at `price`
    pub fn depth_at(&self, price: Price) -> Quantity {
        self.levels.get(&price).map_or(Quantity::ZERO, PriceLevel::volume)
    }

    /// Levels from best to worst
    pub fn iter_levels(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        S::iter_best_first(&self.levels)
    }

    /// Top `limit` levels as (price, volume), best first
    pub fn price_levels(&self, limit: usize) -> Vec<(Price, Quantity)> {
        self.iter_levels()
            .take(limit)
            .map(|level| (level.price(), level.volume()))
            .collect()
    }

    /// Check if this side has no resting orders
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total number of resting orders
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }
}

impl<S: SideOrdering> Default for BookSide<S> {
    fn default() -> Self {
        Self::new()
    }
}
