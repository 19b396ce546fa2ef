//! Market data projections fed by the matching engine's events

mod depth;
mod models;
mod trades;

pub use depth::DepthTracker;
pub use models::{MarketDepth, PriceLevel, Ticker, TradeMessage};
pub use trades::{TradeTape, DEFAULT_TAPE_CAPACITY};
