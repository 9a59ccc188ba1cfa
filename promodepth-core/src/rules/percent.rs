// Percentage-shaped candidate rules: explicit percents, multipliers, was/now,
// savings and money-off phrasings.

use super::context::PromoContext;
use crate::numeric::{
    count_at, followed_by_percent, parse_price, percent_within, price_at, ratio_discount,
    saving_discount, CUR, NUM,
};
use regex::Regex;
use std::sync::LazyLock;

// Multiplier ratios above this are pack descriptors ("4x1"), not promotions.
const MULTIPLIER_MAX_DISCOUNT: f64 = 50.0;
const THREE_BY_ONE_DISCOUNT: f64 = 25.0;

static MULTIPLIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\b(\d+)\s*[xX×]\s*({NUM})")).unwrap());

static VOLUME_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:ml|cl|ltr|litres?|liters?|l|oz|kg|g)\b").unwrap()
});

static DIRECT_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"({NUM})\s*%")).unwrap());

static TENTHS: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!(r"({NUM})\s*折")).unwrap());

static WAS_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\bwas(?:\b[^\d]*)?({NUM})")).unwrap());

static WAS_NOW_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:was|now)(?:\b|[0-9])").unwrap());

static SAVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)save[^\d]*({NUM})")).unwrap());

static MONEY_OFF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)({NUM})\s*(?:{CUR})?\s*off\b")).unwrap());

static YEN_OFF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]+)\s*円引き").unwrap());

/// "3x2", "4 x 3", "2x 20%"
pub fn multiplier(ctx: &PromoContext) -> Vec<f64> {
    let mut found = Vec::new();
    for caps in MULTIPLIER.captures_iter(&ctx.text) {
        let Some(whole) = caps.get(0) else { continue };
        let tail = &ctx.text[whole.end()..];
        if VOLUME_UNIT.is_match(tail) {
            continue;
        }
        if followed_by_percent(&ctx.text, whole.end()) {
            if let Some(pct) = price_at(&caps, 2) {
                found.push(pct);
            }
            continue;
        }
        // "3 x 2.99" is a quantity times a unit price.
        let (Some(n), Some(m)) = (count_at(&caps, 1), count_at(&caps, 2)) else {
            continue;
        };
        if n == 0 || m == 0 || n == m {
            continue;
        }
        let discount = if (n, m) == (3, 1) || (n, m) == (1, 3) {
            THREE_BY_ONE_DISCOUNT
        } else {
            ratio_discount(f64::from(n.min(m)), f64::from(n.max(m)))
        };
        if discount <= MULTIPLIER_MAX_DISCOUNT {
            found.push(discount);
        }
    }
    found
}

/// Bare "X%"
pub fn direct_percent(ctx: &PromoContext) -> Vec<f64> {
    DIRECT_PERCENT
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 1))
        .collect()
}

/// Tenths notation: "8折" means pay 8/10
pub fn tenths(ctx: &PromoContext) -> Vec<f64> {
    TENTHS
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 1))
        .filter(|z| *z > 0.0 && *z <= 10.0)
        .map(|z| (1.0 - z / 10.0) * 100.0)
        .collect()
}

/// "Was A ... Now B", falling back to the base price as B.
pub fn was_now(ctx: &PromoContext) -> Vec<f64> {
    let was = WAS_PRICE.captures(&ctx.text).and_then(|caps| price_at(&caps, 1));

    let (old, new) = match was {
        Some(old) => match ctx.now_price().or(ctx.base_price) {
            Some(new) => (old, new),
            None => return Vec::new(),
        },
        // Two prices and a currency, but only when was/now vocabulary is present.
        None => {
            if !(ctx.currency_present
                && ctx.numbers.len() == 2
                && WAS_NOW_WORDS.is_match(&ctx.text))
            {
                return Vec::new();
            }
            (ctx.numbers[0], ctx.numbers[1])
        }
    };

    if old > new && new > 0.0 {
        vec![ratio_discount(new, old)]
    } else {
        Vec::new()
    }
}

/// "Save S" (monetary), against a "Now" price or else the base price
pub fn save_amount(ctx: &PromoContext) -> Vec<f64> {
    let mut found = Vec::new();
    for caps in SAVE.captures_iter(&ctx.text) {
        let Some(amount) = caps.get(1) else { continue };
        if percent_within(&ctx.text, amount.end(), 3) {
            continue;
        }
        let Some(saving) = parse_price(amount.as_str()) else { continue };
        if ctx.base_price.is_some_and(|base| saving > base) {
            continue;
        }
        if let Some(now) = ctx.now_price() {
            found.push(saving_discount(saving, now));
        } else if let Some(base) = ctx.base_price {
            found.push(saving_discount(saving, base));
        }
    }
    found
}

/// "S off", "10 SGD off"
pub fn money_off(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    MONEY_OFF
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 1))
        .map(|saving| saving_discount(saving, base))
        .collect()
}

/// Japanese money-off suffix "円引き"
pub fn yen_off(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    YEN_OFF
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 1))
        .map(|saving| saving_discount(saving, base))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::context::context_for;

    fn close(values: &[f64], expected: &[f64]) -> bool {
        values.len() == expected.len()
            && values.iter().zip(expected).all(|(a, b)| (a - b).abs() < 1e-2)
    }

    #[test]
    fn test_multiplier_ratios() {
        assert!(close(&multiplier(&context_for("10 - 3x2")), &[33.333]));
        assert!(close(&multiplier(&context_for("10 - 3x1 deal")), &[25.0]));
        assert!(close(&multiplier(&context_for("10 - 2 x 20%")), &[20.0]));
    }

    #[test]
    fn test_multiplier_guards() {
        assert!(multiplier(&context_for("10 - 6x75cl case")).is_empty());
        assert!(multiplier(&context_for("10 - 4x1")).is_empty());
        assert!(multiplier(&context_for("10 - 2x2")).is_empty());
    }

    #[test]
    fn test_multiplier_ignores_unit_prices() {
        assert!(multiplier(&context_for("4 - 3 x 2.99")).is_empty());
        assert!(multiplier(&context_for("5 - 2 x 1.99")).is_empty());
        assert!(close(&multiplier(&context_for("10 - 2 x 12.5%")), &[12.5]));
    }

    #[test]
    fn test_direct_percent_collects_every_match() {
        assert!(close(
            &direct_percent(&context_for("50 - 20% off, members 25 %")),
            &[20.0, 25.0]
        ));
    }

    #[test]
    fn test_tenths() {
        assert!(close(&tenths(&context_for("100 - 8折")), &[20.0]));
        assert!(tenths(&context_for("100 - 12折")).is_empty());
    }

    #[test]
    fn test_was_now_variants() {
        assert!(close(&was_now(&context_for("100 - Was 100 Now 80")), &[20.0]));
        assert!(close(&was_now(&context_for("75 - was £100")), &[25.0]));
        assert!(close(&was_now(&context_for("n/a - now $80 (100)")), &[]));
        assert!(close(&was_now(&context_for("n/a - $100 now $80")), &[20.0]));
        assert!(was_now(&context_for("n/a - $100 $80")).is_empty());
    }

    #[test]
    fn test_was_now_glued_to_numbers() {
        assert!(close(&was_now(&context_for("100 - Was120 Now100")), &[16.667]));
        assert!(close(&was_now(&context_for("n/a - $100 now80")), &[20.0]));
        assert!(was_now(&context_for("30 - wasabi 5 pack")).is_empty());
    }

    #[test]
    fn test_save_amount() {
        assert!(close(&save_amount(&context_for("40 - Save 10")), &[20.0]));
        assert!(close(&save_amount(&context_for("90 - Save 10 Now 40")), &[20.0]));
        assert!(save_amount(&context_for("400 - Save 33%")).is_empty());
        assert!(save_amount(&context_for("5 - Save 10")).is_empty());
        assert!(close(&save_amount(&context_for("90 - Save 10 Now89")), &[10.101]));
    }

    #[test]
    fn test_money_off() {
        assert!(close(&money_off(&context_for("40 - $10 off")), &[20.0]));
        assert!(close(&money_off(&context_for("40 - 10 SGD off")), &[20.0]));
        assert!(money_off(&context_for("50 - 20% off")).is_empty());
        assert!(money_off(&context_for("n/a - 10 off")).is_empty());
    }

    #[test]
    fn test_yen_off() {
        assert!(close(&yen_off(&context_for("4000 - 1000円引き")), &[20.0]));
    }
}
