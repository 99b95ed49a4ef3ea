//! Money calculation utilities using rust_decimal for precision
//!
//! All arithmetic is done on `Decimal` internally, then converted to
//! `f64` for storage/serialization. Amounts persisted to the database are
//! always rounded to 2 decimal places first.

use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places)
const DECIMAL_PLACES: u32 = 2;

pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round to 2dp with rust_decimal's default midpoint strategy
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value).round_dp(DECIMAL_PLACES))
}

/// unit × quantity in USD
pub fn line_total(unit_price: f64, quantity: i64) -> f64 {
    to_f64((to_decimal(unit_price) * Decimal::from(quantity)).round_dp(DECIMAL_PLACES))
}

/// Convert a USD amount into another currency at `rate_per_usd`.
pub fn usd_to(amount_usd: f64, rate_per_usd: f64) -> f64 {
    to_f64((to_decimal(amount_usd) * to_decimal(rate_per_usd)).round_dp(DECIMAL_PLACES))
}

/// Convert an amount in some currency back to USD at `rate_per_usd`.
/// A zero/negative rate yields 0 rather than dividing by it.
pub fn to_usd(amount: f64, rate_per_usd: f64) -> f64 {
    let rate = to_decimal(rate_per_usd);
    if rate <= Decimal::ZERO {
        return 0.0;
    }
    to_f64((to_decimal(amount) / rate).round_dp(DECIMAL_PLACES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_avoids_float_drift() {
        // 0.1 + 0.2 style drift: 1.15 * 3 in plain f64 is 3.4499999...
        assert_eq!(line_total(1.15, 3), 3.45);
        assert_eq!(line_total(40.0, 3), 120.0);
    }

    #[test]
    fn test_usd_conversion_roundtrip() {
        let local = usd_to(120.0, 30.0);
        assert_eq!(local, 3600.0);
        assert_eq!(to_usd(local, 30.0), 120.0);
    }

    #[test]
    fn test_to_usd_guards_zero_rate() {
        assert_eq!(to_usd(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(9.849999999), 9.85);
        assert_eq!(round2(10.0), 10.0);
    }
}
