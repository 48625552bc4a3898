//! Common utility functions for tax calculations.
//!
//! Rounding, clamping and rate conversion shared by the progressive tax
//! function, the capital gains computation and the comprehensive calculator.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, matching how
/// rupee amounts are reported on the return.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fbr_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use fbr_core::calculations::common::max;
///
/// assert_eq!(max(dec!(100.00), dec!(200.00)), dec!(200.00));
/// assert_eq!(max(dec!(-100.00), dec!(-200.00)), dec!(-100.00));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// `value` clamped at zero. Every subtraction that could go negative in the
/// computation goes through here.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// `part / whole` as a percentage rounded to two places; 0 when `whole`
/// is not positive.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fbr_core::calculations::common::percentage_of;
///
/// assert_eq!(percentage_of(dec!(2204000), dec!(8740000)), dec!(25.22));
/// assert_eq!(percentage_of(dec!(100), dec!(0)), dec!(0));
/// ```
pub fn percentage_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up(part / whole * Decimal::ONE_HUNDRED)
}

/// A fractional rate (`0.125`) expressed as a percentage (`12.5`).
pub fn rate_as_percentage(rate: Decimal) -> Decimal {
    round_half_up(rate * Decimal::ONE_HUNDRED).normalize()
}
