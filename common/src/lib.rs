//! Common types and utilities for the order book
//!
//! This library contains the types shared by the matching engine, the market
//! data projections and the replay tool: decimals, the error type and the
//! order, trade and event models.

pub mod error;
pub mod model;
pub mod decimal;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;
