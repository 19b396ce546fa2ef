//! Decimal type utilities for exact price and size arithmetic

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with exact decimal precision
pub type Price = Decimal;

/// Quantity type with exact decimal precision
pub type Quantity = Decimal;

/// Amount type with exact decimal precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Returns true if the value is strictly greater than zero
pub fn is_positive(value: Decimal) -> bool {
    value > Decimal::ZERO
}
