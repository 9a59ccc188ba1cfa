// Unit-count candidate rules: multi-buy bundles where the discount follows from
// how many units are taken versus paid for. None of these need a base price.

use super::context::PromoContext;
use crate::numeric::{count_at, followed_by_decimal, followed_by_percent, ratio_discount};
use regex::Regex;
use std::sync::LazyLock;

// "Get 15" is a price, not a unit count.
const MAX_FREE_UNITS: u32 = 10;
const MAX_BUNDLE_SIZE: u32 = 10;
const QUANTITY_FOR_MAX_DISCOUNT: f64 = 75.0;

static BUY_GET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)buy\s*(?:any\s*)?(\d+).*?get\s*(\d+)").unwrap());

static ORDINAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:st|nd|rd|th)\b").unwrap());

static ANY_GET_FREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)any\s*(\d+).*?get\s*(\d+)\s*free").unwrap());

static PLUS_FREE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*\+\s*(\d+)\s*free").unwrap());

static TAKE_PAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:leve|lleve|lleva)\s*(\d+)\s*(?:pague|paga)\s*(\d+)").unwrap()
});

static BUY_PAY_UNITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)buy\s*(\d+)\s*pay\s*(\d+)\b").unwrap());

static QUANTITY_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s*for\s*(\d+)\b").unwrap());

static FOR_GET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*for\s*get\s*(\d+)").unwrap());

static BUY_FOR_PAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)buy\s*(\d+)[^\d]+for[^\d]+pay\s*(\d+)").unwrap());

static PRICE_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*for\s*(?:the\s*)?price\s*of\s*(\d+)").unwrap()
});

static ANY_THREE_OR_FOUR_GET_ONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)any\s*[34][^0-9]*get\s*1\s*free").unwrap());

/// Literal idioms with a fixed answer
static FIXED_IDIOMS: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| {
    [
        (r"(?i)\b3\s*for\s*2\b", 33.33),
        (r"(?i)\b4\s*for\s*3\b", 25.0),
        (r"(?i)\b2\s*for\s*(?:the\s*)?price\s*of\s*1\b", 50.0),
        (r"(?i)\b3\s*for\s*(?:the\s*)?price\s*of\s*2\b", 33.33),
        (r"(?i)\b4\s*for\s*(?:the\s*)?price\s*of\s*3\b", 25.0),
    ]
    .into_iter()
    .map(|(pattern, value)| (Regex::new(pattern).unwrap(), value))
    .collect()
});

/// Collect `(1 - paid / total)` for every `(a, b)` capture pair the closure accepts.
fn pairs(
    re: &Regex,
    text: &str,
    mut to_paid_total: impl FnMut(u32, u32) -> Option<(u32, u32)>,
) -> Vec<f64> {
    re.captures_iter(text)
        .filter_map(|caps| {
            let (a, b) = (count_at(&caps, 1)?, count_at(&caps, 2)?);
            let (paid, total) = to_paid_total(a, b)?;
            (paid > 0 && total > 0).then(|| ratio_discount(f64::from(paid), f64::from(total)))
        })
        .collect()
}

/// "Buy N Get M [free]"; "Buy 2 Get 3" reads as three for the price of two.
pub fn buy_get(ctx: &PromoContext) -> Vec<f64> {
    let mut found = Vec::new();
    for caps in BUY_GET.captures_iter(&ctx.text) {
        let Some(get) = caps.get(2) else { continue };
        let end = get.end();
        if ORDINAL_SUFFIX.is_match(&ctx.text[end..])
            || followed_by_percent(&ctx.text, end)
            || followed_by_decimal(&ctx.text, end)
        {
            continue;
        }
        let (Some(buy_n), Some(get_n)) = (count_at(&caps, 1), count_at(&caps, 2)) else {
            continue;
        };
        if buy_n == 0 || get_n == 0 || get_n > MAX_FREE_UNITS {
            continue;
        }
        let (paid, total) = if buy_n == 2 && get_n == 3 {
            (2, 3)
        } else {
            (buy_n, buy_n.saturating_add(get_n))
        };
        found.push(ratio_discount(f64::from(paid), f64::from(total)));
    }
    found
}

/// "Any N Get M Free"
pub fn any_get_free(ctx: &PromoContext) -> Vec<f64> {
    pairs(&ANY_GET_FREE, &ctx.text, |n, m| Some((n, n.checked_add(m)?)))
}

/// "X + Y Free"
pub fn plus_free(ctx: &PromoContext) -> Vec<f64> {
    pairs(&PLUS_FREE, &ctx.text, |x, y| Some((x, x.checked_add(y)?)))
}

/// Regional take/pay idiom ("Leve 3 Pague 2")
pub fn take_pay(ctx: &PromoContext) -> Vec<f64> {
    pairs(&TAKE_PAY, &ctx.text, |total, paid| (paid <= total).then_some((paid, total)))
}

/// "Buy N Pay M" as unit counts
pub fn buy_pay_units(ctx: &PromoContext) -> Vec<f64> {
    let mut found = Vec::new();
    for caps in BUY_PAY_UNITS.captures_iter(&ctx.text) {
        let Some(whole) = caps.get(0) else { continue };
        if followed_by_decimal(&ctx.text, whole.end()) {
            continue;
        }
        if let (Some(total), Some(paid)) = (count_at(&caps, 1), count_at(&caps, 2)) {
            if paid > 0 && paid < total {
                found.push(ratio_discount(f64::from(paid), f64::from(total)));
            }
        }
    }
    found
}

/// "3 for 2", "4 for the price of 3", ...
pub fn fixed_idioms(ctx: &PromoContext) -> Vec<f64> {
    FIXED_IDIOMS
        .iter()
        .filter(|(re, _)| re.is_match(&ctx.text))
        .map(|(_, value)| *value)
        .collect()
}

/// "A for B" without any currency in sight: both sides are unit counts.
pub fn quantity_for(ctx: &PromoContext) -> Vec<f64> {
    if ctx.currency_present {
        return Vec::new();
    }
    pairs(&QUANTITY_FOR, &ctx.text, |a, b| {
        (a > 1 && a != b && a.max(b) <= MAX_BUNDLE_SIZE).then(|| (a.min(b), a.max(b)))
    })
    .into_iter()
    .filter(|discount| *discount < QUANTITY_FOR_MAX_DISCOUNT)
    .collect()
}

/// "2 for get 1"
pub fn for_get(ctx: &PromoContext) -> Vec<f64> {
    pairs(&FOR_GET, &ctx.text, |total, paid| (total > paid).then_some((paid, total)))
}

/// "Buy N for ... Pay M"
pub fn buy_for_pay(ctx: &PromoContext) -> Vec<f64> {
    pairs(&BUY_FOR_PAY, &ctx.text, |total, paid| (total > paid).then_some((paid, total)))
}

/// "N for the price of M"
pub fn price_of(ctx: &PromoContext) -> Vec<f64> {
    pairs(&PRICE_OF, &ctx.text, |total, paid| (paid < total).then_some((paid, total)))
}

/// "Any 3 get 1 free" / "Any 4 get 1 free" are booked at a flat 25%.
pub fn any_three_or_four_get_one(ctx: &PromoContext) -> Vec<f64> {
    if ANY_THREE_OR_FOUR_GET_ONE.is_match(&ctx.text) {
        vec![25.0]
    } else {
        Vec::new()
    }
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
    fn test_buy_get() {
        assert!(close(&buy_get(&context_for("19.90 - Buy 2 Get 1 Free")), &[33.333]));
        assert!(close(&buy_get(&context_for("20 - Buy 1 Get 1 Free")), &[50.0]));
        assert!(close(&buy_get(&context_for("20 - Buy 2 Get 3")), &[33.333]));
        assert!(close(&buy_get(&context_for("20 - buy any 3 get 1")), &[25.0]));
    }

    #[test]
    fn test_buy_get_skips_prices_percents_and_ordinals() {
        assert!(buy_get(&context_for("20 - Buy 2 Get 15")).is_empty());
        assert!(buy_get(&context_for("20 - Buy 2 Get 5% off")).is_empty());
        assert!(buy_get(&context_for("20 - Buy 1 Get 2nd half price")).is_empty());
    }

    #[test]
    fn test_any_get_free_and_plus_free() {
        assert!(close(&any_get_free(&context_for("30 - Any 4 get 1 free")), &[20.0]));
        assert!(close(&plus_free(&context_for("30 - 2 + 1 Free")), &[33.333]));
    }

    #[test]
    fn test_take_pay() {
        assert!(close(&take_pay(&context_for("10 - Leve 3 Pague 2")), &[33.333]));
        assert!(take_pay(&context_for("10 - Leve 2 Pague 3")).is_empty());
    }

    #[test]
    fn test_buy_pay_units() {
        assert!(close(&buy_pay_units(&context_for("10 - Buy 4 Pay 3")), &[25.0]));
        assert!(buy_pay_units(&context_for("10 - Buy 3 Pay 20")).is_empty());
    }

    #[test]
    fn test_fixed_idioms() {
        assert!(close(&fixed_idioms(&context_for("10 - 3 for 2")), &[33.33]));
        assert!(close(&fixed_idioms(&context_for("10 - 4 for the price of 3")), &[25.0]));
    }

    #[test]
    fn test_quantity_for_needs_no_currency() {
        assert!(close(&quantity_for(&context_for("10 - 3 for 2")), &[33.333]));
        assert!(quantity_for(&context_for("10 - $3 for 2")).is_empty());
        assert!(quantity_for(&context_for("10 - 4 for 1")).is_empty());
        assert!(quantity_for(&context_for("10 - 2 for 20")).is_empty());
    }

    #[test]
    fn test_for_get_buy_for_pay_and_price_of() {
        assert!(close(&for_get(&context_for("10 - 2 for get 1")), &[50.0]));
        assert!(close(&buy_for_pay(&context_for("10 - Buy 3 bottles for, pay 2")), &[33.333]));
        assert!(close(&price_of(&context_for("10 - 5 for the price of 4")), &[20.0]));
    }

    #[test]
    fn test_any_three_or_four_flat_rate() {
        assert_eq!(any_three_or_four_get_one(&context_for("10 - Any 3 get 1 free")), vec![25.0]);
        assert!(any_three_or_four_get_one(&context_for("10 - Any 2 get 1 free")).is_empty());
    }
}
