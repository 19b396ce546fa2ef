//! Error types for the order book
//!
//! This module provides the unified error type shared by the matching engine,
//! the market data projections and the replay tool.

use std::fmt::Display;
use thiserror::Error;

use crate::decimal::Price;
use crate::model::order::OrderId;

/// Order book error type
#[derive(Debug, Error)]
pub enum Error {
    /// Order rejected before touching the book (non-positive size or price)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Cancel or lookup of an order that is not resting
    #[error("Unknown order: {0}")]
    UnknownOrder(OrderId),

    /// Best bid reached or passed best ask; an internal consistency fault
    #[error("Crossed book: best bid {bid} >= best ask {ask}")]
    CrossedBook { bid: Price, ask: Price },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::InvalidOrder(msg) => Error::InvalidOrder(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                // Structured variants keep their payload; the context is not representable
                e @ (Error::UnknownOrder(_) | Error::CrossedBook { .. } | Error::Serialization(_)) => e,
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
