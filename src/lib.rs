//! Test metapackage for the order book workspace
//!
//! Cross-crate scenarios live under `tests/`; the crates are re-exported so
//! those scenarios can reach everything through one dependency.

pub use common;
pub use market_data;
pub use matching_engine;
