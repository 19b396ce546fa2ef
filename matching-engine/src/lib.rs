//! Limit order matching engine for a single instrument
//!
//! Orders are matched under strict price-time priority: better prices first,
//! then arrival order within a price. Trades always execute at the resting
//! order's price.

mod arena;
mod order_book;
pub mod config;
pub mod engine;
pub mod events;

pub use arena::{OrderArena, OrderKey};
pub use config::EngineConfig;
pub use engine::{MatchingEngine, OrderHandle};
pub use events::{EventRecorder, EventSink, FnSink, NoopSink};
pub use order_book::{Asks, Bids, BookSide, PriceLevel, SideOrdering};
