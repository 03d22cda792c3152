//! Booking price computation.
//!
//! A booking costs `rate * hours`. Bookings that run midnight to midnight
//! over whole days are priced per day (`rate * 24 * days`), which is the
//! same amount computed from an integer day count.

use bigdecimal::{BigDecimal, RoundingMode, Zero};
use chrono::{NaiveDateTime, Timelike};

const SECONDS_PER_HOUR: i64 = 3600;
const HOURS_PER_DAY: i64 = 24;
const SECONDS_PER_DAY: i64 = SECONDS_PER_HOUR * HOURS_PER_DAY;

/// Decimal places kept for stored prices (`NUMERIC(10, 2)`).
pub const PRICE_SCALE: i64 = 2;

/// Exclusive upper bound of a `NUMERIC(10, 2)` column.
pub const PRICE_LIMIT: i64 = 100_000_000;

/// Whether `amount` can be stored in a price column without overflow.
pub fn fits_storage(amount: &BigDecimal) -> bool {
    amount.abs() < BigDecimal::from(PRICE_LIMIT)
}

/// Number of whole days when both ends sit on a midnight hour and the span
/// is an exact multiple of 24 hours.
pub fn whole_days(start: NaiveDateTime, end: NaiveDateTime) -> Option<i64> {
    let seconds = (end - start).num_seconds();
    if start.hour() == 0 && end.hour() == 0 && seconds > 0 && seconds % SECONDS_PER_DAY == 0 {
        Some(seconds / SECONDS_PER_DAY)
    } else {
        None
    }
}

/// Total price for booking a hall at `rate` per hour from `start` to `end`.
///
/// Non-positive spans price at zero rather than failing; callers reject
/// them before a booking is stored.
pub fn total_price(rate: &BigDecimal, start: NaiveDateTime, end: NaiveDateTime) -> BigDecimal {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return BigDecimal::zero().with_scale(PRICE_SCALE);
    }

    let total = match whole_days(start, end) {
        Some(days) => rate * BigDecimal::from(HOURS_PER_DAY * days),
        None => rate * BigDecimal::from(seconds) / BigDecimal::from(SECONDS_PER_HOUR),
    };
    total.with_scale_round(PRICE_SCALE, RoundingMode::HalfUp)
}
