use regex::Regex;
use std::sync::LazyLock;

static SIGNED_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?\d*\.?\d+").unwrap());

/// Reference unit price from the base segment (text before the separator).
///
/// Only the first numeral is considered; it is accepted when strictly positive.
/// No currency or plausibility checks happen here, the rules that divide by the
/// base price carry their own guards.
pub fn extract_base_price(segment: &str) -> Option<f64> {
    let token = SIGNED_DECIMAL.find(segment)?;
    token
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}
