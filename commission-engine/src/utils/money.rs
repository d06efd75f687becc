//! Money helpers
//!
//! All money is `Decimal`; amounts are rounded once, at the point they are reported.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
pub const DECIMAL_PLACES: u32 = 2;

/// Round a monetary amount for reporting
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}
