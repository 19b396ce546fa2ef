// File: tests/test_helpers.rs

use std::sync::{Arc, Mutex};

use common::decimal::{Price, Quantity};
use common::model::order::{OrderId, Side};
use market_data::{DepthTracker, TradeTape};
use matching_engine::{EngineConfig, EventRecorder, MatchingEngine};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Engine wired to every projection, with invariant checks enabled
pub struct Harness {
    pub engine: MatchingEngine,
    pub recorder: Arc<Mutex<EventRecorder>>,
    pub depth: Arc<Mutex<DepthTracker>>,
    pub tape: Arc<Mutex<TradeTape>>,
}

impl Harness {
    pub fn new() -> Self {
        let recorder = Arc::new(Mutex::new(EventRecorder::new()));
        let depth = Arc::new(Mutex::new(DepthTracker::new()));
        let tape = Arc::new(Mutex::new(TradeTape::default()));

        let config = EngineConfig::default().with_verification(true);
        let mut engine = MatchingEngine::with_sink(config, recorder.clone());
        engine.subscribe(depth.clone());
        engine.subscribe(tape.clone());

        Self {
            engine,
            recorder,
            depth,
            tape,
        }
    }

    pub fn limit(&mut self, side: Side, price: u32, size: u32) -> OrderId {
        self.engine
            .submit_limit_order(side, Price::from(price), Quantity::from(size))
            .unwrap()
            .id()
    }

    pub fn buy(&mut self, price: u32, size: u32) -> OrderId {
        self.limit(Side::Buy, price, size)
    }

    pub fn sell(&mut self, price: u32, size: u32) -> OrderId {
        self.limit(Side::Sell, price, size)
    }

    /// Observed depth from the event stream
    pub fn observed_depth(&self, price: u32) -> Quantity {
        self.depth.lock().unwrap().depth_at(Price::from(price))
    }

    /// Best bid as `(price, size)`, the way a level snapshot reports it
    pub fn top_bid(&self) -> Option<(Price, Quantity)> {
        self.engine.bid_levels(1).into_iter().next()
    }
}

/// Deterministic stream of orders with prices in 50..150 and sizes in 1..1000
pub fn order_stream(seed: u64, count: usize) -> Vec<(Side, u32, u32)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
            let price = rng.gen_range(50..150);
            let size = rng.gen_range(1..1000);
            (side, price, size)
        })
        .collect()
}
