// Price-bearing candidate rules. Most compare an effective unit price against
// the base price; a few (tiered, two-price, multi-tier) compare prices quoted
// inside the promo text itself.

use super::context::PromoContext;
use crate::numeric::{
    count_at, followed_by_percent, in_open_range, price_at, ratio_discount, saving_discount,
    CUR, NUM,
};
use regex::Regex;
use std::sync::LazyLock;

const MAX_BUNDLE_SIZE: u32 = 10;
const MAX_PLAUSIBLE_DISCOUNT: f64 = 75.0;
const MIN_GET_PRICE: f64 = 10.0;

const PURCHASE_CONDITION: &str =
    r"(?:on\s*purchase\s*of|when\s*purchase|when\s*purches|when\s*pueches|when\s*buying|when\s*you\s*buy)";

const PER_UNIT: &str = r"(?:each|ea|unit|bottle|btl|pcs|pc)";

static QTY_FOR_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(\d+)\s*(?:for|x|@)\s*[^\d]*({NUM})")).unwrap()
});

static TOTAL_FOR_QTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)({NUM})\s*[^\d]*for\s*(\d+)\b")).unwrap());

static BUY_PAY_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)buy\s*(\d+)\s*pay[^\d]*({NUM})")).unwrap());

static EACH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)({NUM})\s*each")).unwrap());

static UNIT_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)unit\s*price[^\d]{{0,8}}({NUM})")).unwrap());

static SECOND_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)buy\s*1[^0-9]+get\s*2nd[^\d]*({NUM})")).unwrap()
});

static BUY_ONE_FOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)buy\s*1\s*for[^\d]*({NUM})")).unwrap());

static BUY_ONE_FOR_CONDITIONED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)buy\s*1\s*for[^\d]*({NUM})\s*{PURCHASE_CONDITION}\s*2"
    ))
    .unwrap()
});

static CONDITION_OF_TWO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i){PURCHASE_CONDITION}\s*2")).unwrap());

static TIERED_BUY_ONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)buy\s*1\s*for[^\d]*({NUM})[^\d]+2\s*for[^\d]*({NUM})"
    ))
    .unwrap()
});

static BUY_FOR_SAVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)buy\s*(\d+)\s*for\s*(?:{CUR})?\s*({NUM})\s*(?:{CUR})?\s*,?\s*save\s*(?:{CUR})?\s*({NUM})(\s*%)?"
    ))
    .unwrap()
});

static EACH_THEN_BUNDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)each.*?({NUM})\s*[^\d]*for\s*(\d+)\b")).unwrap()
});

static UNIT_VS_BUNDLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)({NUM})\s*(?:{CUR})?\s*each\b.*?\b(\d+)\s*for\s*(?:{CUR})?\s*({NUM})"
    ))
    .unwrap()
});

static TWO_PRICE_COMPARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d+)\s*for\s*(?:{CUR})?\s*({NUM})\s*(?:{CUR})?\s*(?:,|/|or)\s*(?:or\s*)?buy\s*1\s*for\s*(?:{CUR})?\s*({NUM})"
    ))
    .unwrap()
});

static PRICE_CUR_PER_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)({NUM})\s*{CUR}\s*/\s*{PER_UNIT}\b")).unwrap()
});

static CUR_PRICE_PER_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){CUR}\s*({NUM})\s*/\s*{PER_UNIT}\b")).unwrap()
});

static COUNT_TIMES_CUR_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d+)\s*[x×]\s*{CUR}\s*({NUM})")).unwrap()
});

static BUY_GET_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)buy\s*(\d+).*?get\s*({NUM})")).unwrap());

static BOTTLE_DISCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:{CUR}\s*({NUM})|({NUM})\s*{CUR})\s*discount\b[^\d]*?(\d+)\s*(?:\+\s*|or\s*more\s*)?bottles?"
    ))
    .unwrap()
});

static TIER_BUNDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b(\d+)\s*for\s*{CUR}\s*({NUM})")).unwrap());

static TIER_EACH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i){CUR}\s*({NUM})\s*(?:/\s*)?each\b")).unwrap());

/// Discount of `unit` against `base`, only when the unit price is actually lower.
fn below(unit: f64, base: f64) -> Option<f64> {
    (unit < base).then(|| ratio_discount(unit, base))
}

fn plausible(discount: &f64) -> bool {
    in_open_range(*discount, 0.0, MAX_PLAUSIBLE_DISCOUNT)
}

/// "N for P" and "P for N" against the base price
pub fn qty_for_total(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };

    let forward = QTY_FOR_TOTAL
        .captures_iter(&ctx.text)
        .filter_map(|caps| Some((count_at(&caps, 1)?, price_at(&caps, 2)?)));
    let reverse = TOTAL_FOR_QTY
        .captures_iter(&ctx.text)
        .filter_map(|caps| Some((count_at(&caps, 2)?, price_at(&caps, 1)?)));

    forward
        .chain(reverse)
        .filter(|(qty, total)| (1..=MAX_BUNDLE_SIZE).contains(qty) && *total > 0.0)
        .filter_map(|(qty, total)| below(total / f64::from(qty), base))
        .filter(|discount| *discount < MAX_PLAUSIBLE_DISCOUNT)
        .collect()
}

/// "Buy N Pay X" where X is a price
pub fn buy_pay_price(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    BUY_PAY_PRICE
        .captures_iter(&ctx.text)
        .filter_map(|caps| Some((count_at(&caps, 1)?, price_at(&caps, 2)?)))
        .filter(|(qty, total)| *qty > 0 && *total > 0.0)
        .filter_map(|(qty, total)| below(total / f64::from(qty), base))
        .collect()
}

/// First "X each". A `£` price next to a base above 10 is a different currency.
pub fn each_price(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    if ctx.text.contains('£') && base > 10.0 {
        return Vec::new();
    }
    EACH.captures(&ctx.text)
        .and_then(|caps| price_at(&caps, 1))
        .and_then(|unit| below(unit, base))
        .into_iter()
        .collect()
}

/// "Unit Price X"
pub fn unit_price(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    UNIT_PRICE
        .captures(&ctx.text)
        .and_then(|caps| price_at(&caps, 1))
        .and_then(|unit| below(unit, base))
        .into_iter()
        .collect()
}

/// "Buy 1 Get 2nd for X" prices the pair; "Buy 1 Get 2nd X% off" halves the percent.
pub fn second_item(ctx: &PromoContext) -> Vec<f64> {
    let Some(caps) = SECOND_ITEM.captures(&ctx.text) else { return Vec::new() };
    let (Some(amount), Some(second)) = (caps.get(1), price_at(&caps, 1)) else {
        return Vec::new();
    };

    if followed_by_percent(&ctx.text, amount.end()) {
        return vec![second / 2.0];
    }
    let Some(base) = ctx.base_price else { return Vec::new() };
    below((base + second) / 2.0, base).into_iter().collect()
}

/// "Buy 1 For X", with or without an "on purchase of 2" condition.
pub fn buy_one_for(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    let mut found = Vec::new();

    if let Some(unit) = BUY_ONE_FOR_CONDITIONED
        .captures(&ctx.text)
        .and_then(|caps| price_at(&caps, 1))
    {
        let discount = (1.0 - base / (2.0 * unit)) * 100.0;
        if discount > 0.0 {
            found.push(discount);
        }
    }

    if !CONDITION_OF_TWO.is_match(&ctx.text) {
        let simple = BUY_ONE_FOR
            .captures(&ctx.text)
            .and_then(|caps| price_at(&caps, 1))
            .and_then(|price| below(price, base))
            .filter(|discount| *discount < MAX_PLAUSIBLE_DISCOUNT);
        found.extend(simple);
    }
    found
}

/// "Buy 1 for X, 2 for Y"
pub fn tiered_buy_one(ctx: &PromoContext) -> Vec<f64> {
    TIERED_BUY_ONE
        .captures(&ctx.text)
        .and_then(|caps| {
            let single = price_at(&caps, 1)?;
            let pair = price_at(&caps, 2)?;
            below(pair / 2.0, single)
        })
        .into_iter()
        .collect()
}

/// "Buy N for P save S" where S is money, or a percent when followed by `%`.
pub fn buy_for_save(ctx: &PromoContext) -> Vec<f64> {
    let Some(caps) = BUY_FOR_SAVE.captures(&ctx.text) else { return Vec::new() };
    let (Some(total), Some(saving)) = (price_at(&caps, 2), price_at(&caps, 3)) else {
        return Vec::new();
    };
    if total <= 0.0 || saving <= 0.0 {
        return Vec::new();
    }
    if caps.get(4).is_some() {
        vec![saving]
    } else {
        vec![saving_discount(saving, total)]
    }
}

/// "X each ... P for N" where the bundle follows the single price
pub fn each_then_bundle(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    EACH_THEN_BUNDLE
        .captures(&ctx.text)
        .and_then(|caps| {
            let total = price_at(&caps, 1)?;
            let qty = count_at(&caps, 2)?;
            if qty == 0 || total <= 0.0 {
                return None;
            }
            below(total / f64::from(qty), base)
        })
        .into_iter()
        .collect()
}

/// "P each ... N for Q"
pub fn unit_vs_bundle(ctx: &PromoContext) -> Vec<f64> {
    UNIT_VS_BUNDLE
        .captures_iter(&ctx.text)
        .filter_map(|caps| {
            let single = price_at(&caps, 1)?;
            let qty = count_at(&caps, 2)?;
            let bundle = price_at(&caps, 3)?;
            Some(ratio_discount(bundle, f64::from(qty) * single))
        })
        .filter(plausible)
        .collect()
}

/// "N for X or Buy 1 for Y"
pub fn two_price_compare(ctx: &PromoContext) -> Vec<f64> {
    TWO_PRICE_COMPARE
        .captures_iter(&ctx.text)
        .filter_map(|caps| {
            let qty = count_at(&caps, 1)?;
            let bundle = price_at(&caps, 2)?;
            let single = price_at(&caps, 3)?;
            Some(ratio_discount(bundle, f64::from(qty) * single))
        })
        .filter(plausible)
        .collect()
}

/// "25 SGD/each", "$8/bottle", "2 x $8"
pub fn explicit_unit_price(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };

    let suffixed = PRICE_CUR_PER_UNIT.captures_iter(&ctx.text);
    let prefixed = CUR_PRICE_PER_UNIT.captures_iter(&ctx.text);
    let per_unit = suffixed.chain(prefixed).filter_map(|caps| price_at(&caps, 1));
    let multiplied = COUNT_TIMES_CUR_PRICE
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 2));

    per_unit
        .chain(multiplied)
        .map(|unit| ratio_discount(unit, base))
        .filter(plausible)
        .collect()
}

/// "Buy N Get <price>" where the trailing number is too large to be a unit count
pub fn buy_get_price(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    let mut found = Vec::new();
    for caps in BUY_GET_PRICE.captures_iter(&ctx.text) {
        let Some(amount) = caps.get(2) else { continue };
        if followed_by_percent(&ctx.text, amount.end()) {
            continue;
        }
        let (Some(qty), Some(price)) = (count_at(&caps, 1), price_at(&caps, 2)) else {
            continue;
        };
        if qty < 2 || price <= MIN_GET_PRICE {
            continue;
        }
        let discount = ratio_discount(price, f64::from(qty) * base);
        if plausible(&discount) {
            found.push(discount);
        }
    }
    found
}

/// "AED 50 discount for 2+ bottles": a fixed money discount spread over N bottles
pub fn bottle_discount(ctx: &PromoContext) -> Vec<f64> {
    let Some(base) = ctx.base_price else { return Vec::new() };
    BOTTLE_DISCOUNT
        .captures_iter(&ctx.text)
        .filter_map(|caps| {
            let amount = price_at(&caps, 1).or_else(|| price_at(&caps, 2))?;
            let bottles = count_at(&caps, 3).filter(|n| *n > 0)?;
            Some(amount / (base * f64::from(bottles)) * 100.0)
        })
        .filter(plausible)
        .collect()
}

/// Without a base price, compare the cheapest and dearest unit prices quoted.
pub fn multi_tier(ctx: &PromoContext) -> Vec<f64> {
    if ctx.base_price.is_some() {
        return Vec::new();
    }

    let bundles = TIER_BUNDLE.captures_iter(&ctx.text).filter_map(|caps| {
        let qty = count_at(&caps, 1).filter(|n| *n > 0)?;
        Some(price_at(&caps, 2)? / f64::from(qty))
    });
    let singles = TIER_EACH
        .captures_iter(&ctx.text)
        .filter_map(|caps| price_at(&caps, 1));

    let mut units: Vec<f64> = bundles.chain(singles).filter(|u| *u > 0.0).collect();
    units.sort_by(f64::total_cmp);
    units.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);

    match (units.first(), units.last()) {
        (Some(low), Some(high)) if units.len() >= 2 => {
            Some(ratio_discount(*low, *high)).filter(plausible).into_iter().collect()
        }
        _ => Vec::new(),
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
    fn test_qty_for_total_both_orders() {
        assert!(close(&qty_for_total(&context_for("10 - 3 for $24")), &[20.0]));
        assert!(close(&qty_for_total(&context_for("10 - $24 for 3")), &[20.0]));
    }

    #[test]
    fn test_qty_for_total_guards() {
        assert!(qty_for_total(&context_for("10 - 2 for 4")).is_empty());
        assert!(qty_for_total(&context_for("10 - 12 for 60")).is_empty());
        assert!(qty_for_total(&context_for("n/a - 3 for $24")).is_empty());
    }

    #[test]
    fn test_buy_pay_price() {
        assert!(close(&buy_pay_price(&context_for("10 - Buy 3 Pay $24")), &[20.0]));
    }

    #[test]
    fn test_each_price_and_pound_guard() {
        assert!(close(&each_price(&context_for("10 - 8 each")), &[20.0]));
        assert!(each_price(&context_for("20 - £8 each")).is_empty());
        assert!(close(&each_price(&context_for("5 - £4 each")), &[20.0]));
        assert!(each_price(&context_for("5 - 8 each")).is_empty());
    }

    #[test]
    fn test_unit_price() {
        assert!(close(&unit_price(&context_for("10 - Unit Price: 8")), &[20.0]));
    }

    #[test]
    fn test_second_item_price_and_percent() {
        assert!(close(&second_item(&context_for("20 - Buy 1 Get 2nd for 10")), &[25.0]));
        assert!(close(&second_item(&context_for("20 - Buy 1 Get 2nd 50% off")), &[25.0]));
    }

    #[test]
    fn test_buy_one_for_variants() {
        assert!(close(&buy_one_for(&context_for("20 - Buy 1 for 15")), &[25.0]));
        assert!(close(&buy_one_for(&context_for("10 - Buy 1 for 8 when you buy 2")), &[37.5]));
        assert!(buy_one_for(&context_for("20 - Buy 1 for 4")).is_empty());
    }

    #[test]
    fn test_tiered_buy_one_needs_no_base() {
        assert!(close(&tiered_buy_one(&context_for("n/a - Buy 1 for 10, 2 for 16")), &[20.0]));
    }

    #[test]
    fn test_buy_for_save() {
        assert!(close(&buy_for_save(&context_for("10 - Buy 2 for $30 save $10")), &[25.0]));
        assert!(close(&buy_for_save(&context_for("10 - Buy 2 for 30, save 20%")), &[20.0]));
    }

    #[test]
    fn test_each_then_bundle() {
        assert!(close(&each_then_bundle(&context_for("10 - $10 each or $25 for 3")), &[16.667]));
    }

    #[test]
    fn test_unit_vs_bundle() {
        assert!(close(&unit_vs_bundle(&context_for("10 - 10 each, 3 for 25")), &[16.667]));
    }

    #[test]
    fn test_two_price_compare() {
        assert!(close(
            &two_price_compare(&context_for("n/a - 2 for $30 or buy 1 for $20")),
            &[25.0]
        ));
    }

    #[test]
    fn test_explicit_unit_price_forms() {
        assert!(close(
            &explicit_unit_price(&context_for("40 - 25 SGD/each, 2 bottles and above")),
            &[37.5]
        ));
        assert!(close(&explicit_unit_price(&context_for("10 - $8/bottle")), &[20.0]));
        assert!(close(&explicit_unit_price(&context_for("10 - 2 x $8")), &[20.0]));
        assert!(explicit_unit_price(&context_for("10 - $2/each")).is_empty());
    }

    #[test]
    fn test_buy_get_price() {
        assert!(close(&buy_get_price(&context_for("20 - Buy 2 Get 30")), &[25.0]));
        assert!(buy_get_price(&context_for("20 - Buy 2 Get 1 Free")).is_empty());
        assert!(buy_get_price(&context_for("20 - Buy 2 Get 15% off")).is_empty());
    }

    #[test]
    fn test_bottle_discount() {
        assert!(close(
            &bottle_discount(&context_for("100 - AED 50 discount for 2 bottles")),
            &[25.0]
        ));
    }

    #[test]
    fn test_multi_tier_only_without_base() {
        assert!(close(&multi_tier(&context_for("n/a - $10 each, 3 for $24")), &[20.0]));
        assert!(multi_tier(&context_for("10 - $10 each, 3 for $24")).is_empty());
        assert!(multi_tier(&context_for("n/a - $10 each")).is_empty());
    }
}
