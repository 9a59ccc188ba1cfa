// Numeric helpers shared by the override classifier and the candidate rules.
//
// Every percentage in the engine flows through these functions so that the
// clamping and rounding behaviour is identical everywhere.

use regex::Captures;

/// Unsigned decimal numeral as it appears in normalized promo text
pub const NUM: &str = r"[0-9]+(?:\.[0-9]+)?";

/// Currency tokens that may sit directly before or after a price
pub const CUR: &str = r"(?:hk\$|nt\$|s\$|\$|€|£|¥|₹|sgd|aed|hkd|usd|eur|gbp|rmb|cny|krw|php|rs\.?)";

/// Parse a price-like capture. Non-finite values (overflowing digit runs) are dropped.
pub fn parse_price(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a unit count capture. Overflowing counts are dropped.
pub fn parse_count(text: &str) -> Option<u32> {
    text.parse::<u32>().ok()
}

pub fn price_at(caps: &Captures, index: usize) -> Option<f64> {
    caps.get(index).and_then(|m| parse_price(m.as_str()))
}

pub fn count_at(caps: &Captures, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| parse_count(m.as_str()))
}

/// `(1 - paid / total) * 100`
pub fn ratio_discount(paid: f64, total: f64) -> f64 {
    (1.0 - paid / total) * 100.0
}

/// Saving expressed against the pre-discount price: `saving / (price + saving) * 100`
pub fn saving_discount(saving: f64, price: f64) -> f64 {
    saving / (price + saving) * 100.0
}

/// Clamp into [0, 100]; NaN collapses to 0.
pub fn clamp_pct(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Standard two-decimal rounding (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Open interval check used by the "(0, 75)" plausibility guards
pub fn in_open_range(value: f64, low: f64, high: f64) -> bool {
    value > low && value < high
}

/// True when the first non-whitespace character after `end` is `%`.
pub fn followed_by_percent(text: &str, end: usize) -> bool {
    text.get(end..)
        .map(|tail| tail.trim_start().starts_with('%'))
        .unwrap_or(false)
}

/// True when `%` appears within the next `window` characters after `end`.
pub fn percent_within(text: &str, end: usize, window: usize) -> bool {
    text.get(end..)
        .map(|tail| tail.chars().take(window).any(|c| c == '%'))
        .unwrap_or(false)
}

/// True when the match is immediately continued by a decimal part (`10.5`).
pub fn followed_by_decimal(text: &str, end: usize) -> bool {
    let mut chars = text.get(end..).unwrap_or("").chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('.'), Some(d)) if d.is_ascii_digit()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(12.5), 12.5);
    }

    #[test]
    fn test_clamp_pct_handles_nan_and_bounds() {
        assert_eq!(clamp_pct(f64::NAN), 0.0);
        assert_eq!(clamp_pct(-4.0), 0.0);
        assert_eq!(clamp_pct(140.0), 100.0);
        assert_eq!(clamp_pct(42.5), 42.5);
    }

    #[test]
    fn test_discount_formulas() {
        assert!((ratio_discount(2.0, 3.0) - 33.333_333).abs() < 1e-4);
        assert!((saving_discount(10.0, 40.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_overflowing_numbers_are_dropped() {
        let huge = "9".repeat(400);
        assert_eq!(parse_price(&huge), None);
        assert_eq!(parse_count("99999999999"), None);
        assert_eq!(parse_count("12"), Some(12));
    }

    #[test]
    fn test_lookahead_helpers() {
        let text = "Save 33 % today";
        assert!(followed_by_percent(text, 7));
        assert!(percent_within(text, 7, 3));
        assert!(!percent_within("Save 33 now %", 7, 3));
        assert!(followed_by_decimal("Get 10.5", 6));
        assert!(!followed_by_decimal("Get 10. ", 6));
    }
}
