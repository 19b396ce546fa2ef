//! Domain models for the order book

pub mod order;
pub mod trade;
pub mod event;
