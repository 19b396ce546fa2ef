//! Script commands and the replay driver

use std::sync::{Arc, Mutex, MutexGuard};

use common::decimal::{Price, Quantity};
use common::error::{Error, Result};
use common::model::event::BookEvent;
use common::model::order::{OrderId, Side};
use market_data::{DepthTracker, MarketDepth, PriceLevel, Ticker, TradeTape};
use matching_engine::{EngineConfig, EventRecorder, MatchingEngine};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One line of an order script
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Limit { side: Side, price: Price, size: Quantity },
    Cancel { id: OrderId },
}

/// Parse a script line; blank lines and `#` comments yield `None`
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Final state printed after the script is exhausted
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub event: &'static str,
    pub book: MarketDepth,
    pub ticker: Ticker,
    /// Depth as rebuilt from the event stream alone
    pub observed_depth: Vec<PriceLevel>,
    pub trade_count: u64,
    pub volume: Quantity,
    pub vwap: Option<Price>,
}

/// Drives the engine and the market data projections from script commands
pub struct Replayer {
    engine: MatchingEngine,
    recorder: Arc<Mutex<EventRecorder>>,
    depth: Arc<Mutex<DepthTracker>>,
    tape: Arc<Mutex<TradeTape>>,
}

impl Replayer {
    pub fn new(config: EngineConfig, tape: TradeTape) -> Self {
        let recorder = Arc::new(Mutex::new(EventRecorder::new()));
        let depth = Arc::new(Mutex::new(DepthTracker::new()));
        let tape = Arc::new(Mutex::new(tape));

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

    /// Run one command, returning the events it produced in emission order
    pub fn apply(&mut self, command: &Command) -> Result<Vec<BookEvent>> {
        match *command {
            Command::Limit { side, price, size } => {
                let handle = self.engine.submit_limit_order(side, price, size)?;
                debug!(order_id = %handle.id(), status = ?handle.status(), trades = handle.trades.len(), "Replayed limit order");
            }
            Command::Cancel { id } => {
                self.engine.cancel_order(id)?;
                debug!(order_id = %id, "Replayed cancel");
            }
        }
        Ok(lock(&self.recorder).take_events())
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    /// Snapshot the book and projections with `levels` levels per side
    pub fn summary(&self, levels: usize) -> ReplaySummary {
        let tape = lock(&self.tape);
        ReplaySummary {
            event: "summary",
            book: MarketDepth::from_engine(&self.engine, levels),
            ticker: Ticker::from_engine(&self.engine),
            observed_depth: lock(&self.depth).levels(),
            trade_count: tape.trade_count(),
            volume: tape.volume(),
            vwap: tape.vwap(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
