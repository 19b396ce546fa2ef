//! Configuration for the matching engine

use std::env;

use common::error::{Error, Result};

/// Configuration for the matching engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// First order id handed out by the engine
    pub first_order_id: u64,
    /// Check the book after every mutation and fail the call on a violation
    pub verify_invariants: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            first_order_id: 1,
            verify_invariants: false,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration using environment variables
    ///
    /// Reads `ENGINE_FIRST_ORDER_ID` and `ENGINE_VERIFY_INVARIANTS`; unset
    /// variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let first_order_id = match env::var("ENGINE_FIRST_ORDER_ID") {
            Ok(value) => value.trim().parse::<u64>().map_err(|e| {
                Error::ConfigurationError(format!("ENGINE_FIRST_ORDER_ID={:?}: {}", value, e))
            })?,
            Err(_) => defaults.first_order_id,
        };

        let verify_invariants = match env::var("ENGINE_VERIFY_INVARIANTS") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                Error::ConfigurationError(format!("ENGINE_VERIFY_INVARIANTS={:?}: expected true/false", value))
            })?,
            Err(_) => defaults.verify_invariants,
        };

        Self::new(first_order_id, verify_invariants)
    }

    /// Create a new configuration with custom values
    pub fn new(first_order_id: u64, verify_invariants: bool) -> Result<Self> {
        if first_order_id == 0 {
            return Err(Error::ConfigurationError("first order id must be at least 1".to_string()));
        }
        Ok(Self {
            first_order_id,
            verify_invariants,
        })
    }

    /// Same configuration with invariant checking switched on or off
    pub fn with_verification(mut self, verify_invariants: bool) -> Self {
        self.verify_invariants = verify_invariants;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
