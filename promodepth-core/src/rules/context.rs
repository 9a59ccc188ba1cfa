use crate::normalizer::NormalizedPromo;
use crate::numeric::{parse_price, NUM};
use regex::Regex;
use std::sync::{LazyLock, OnceLock};

static NUMERALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("({NUM})")).unwrap());

// Matched against the lower-cased text. Three-letter codes match as substrings
// ("60sgd"); "rs" must not sit inside a word ("first", "hours").
static CURRENCY_PRESENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"€|\$|£|¥|₹|sgd|aed|cny|krw|php|(?:^|[^a-z])rs(?:[^a-z]|$)").unwrap()
});

static NOW_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\bnow(?:\b[^\d]*)?({NUM})")).unwrap());

/// Read-only view of one promo entry shared by every rule.
///
/// Built once per entry; rules never mutate it. The "Now" price is computed on
/// first use because both the was/now rule and the save rule read it.
#[derive(Debug)]
pub struct PromoContext {
    /// Promo segment after tab stripping and trimming, before normalization
    pub raw_promo: String,
    pub text: String,
    pub lower: String,
    pub base_price: Option<f64>,
    pub numbers: Vec<f64>,
    pub currency_present: bool,
    now_price: OnceLock<Option<f64>>,
}

impl PromoContext {
    pub fn new(raw_promo: &str, promo: NormalizedPromo, base_price: Option<f64>) -> Self {
        let numbers = NUMERALS
            .captures_iter(&promo.text)
            .filter_map(|caps| caps.get(1).and_then(|m| parse_price(m.as_str())))
            .collect();
        let currency_present = CURRENCY_PRESENT.is_match(&promo.lower);

        Self {
            raw_promo: raw_promo.to_string(),
            text: promo.text,
            lower: promo.lower,
            base_price,
            numbers,
            currency_present,
            now_price: OnceLock::new(),
        }
    }

    /// Price following the first "Now"
    pub fn now_price(&self) -> Option<f64> {
        *self.now_price.get_or_init(|| {
            NOW_PRICE
                .captures(&self.text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_price(m.as_str()))
        })
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }
}

#[cfg(test)]
pub(crate) fn context_for(entry: &str) -> PromoContext {
    use crate::base_price::extract_base_price;
    use crate::normalizer::{clean_segment, normalize_promo, split_entry};

    let (base, promo) = split_entry(entry, '-').expect("test entry needs a separator");
    let raw = clean_segment(promo);
    PromoContext::new(&raw, normalize_promo(&raw), extract_base_price(base))
}
