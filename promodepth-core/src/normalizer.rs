//! Text Normalizer
//!
//! Rewrites the promo segment of an entry into a canonical form before any
//! rule looks at it:
//!
//! ```text
//! raw promo segment
//!     ↓  strip tabs, trim, collapse whitespace
//!     ↓  thousands separators removed   (2,199 → 2199)
//!     ↓  decimal comma → dot            (12,50 → 12.50)
//!     ↓  OCR typo correction            (but → Buy, grt → Get)
//! NormalizedPromo { text, lower }
//! ```

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// Consuming form of `(\d{1,3}),(?=\d{3}\b)`; applied until stable.
static THOUSANDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}),(\d{3})\b").unwrap());

static DECIMAL_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+),(\d{1,2})").unwrap());

static OCR_BUY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bbut\b").unwrap());

static OCR_GET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bgrt\b").unwrap());

/// Promo text after normalization plus its lower-cased working copy
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPromo {
    pub text: String,
    pub lower: String,
}

/// Split an entry into base segment and promo segment on the first separator.
/// Separators inside the promo segment are left alone.
pub fn split_entry(entry: &str, separator: char) -> Option<(&str, &str)> {
    entry.split_once(separator)
}

/// Tab stripping and trimming applied to the raw promo segment
pub fn clean_segment(segment: &str) -> String {
    segment.replace('\t', " ").trim().to_string()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

/// Remove thousands separators, then turn remaining decimal commas into dots.
pub fn normalize_numbers(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = THOUSANDS.replace_all(&current, "${1}${2}").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    DECIMAL_COMMA.replace_all(&current, "${1}.${2}").into_owned()
}

pub fn fix_ocr_typos(text: &str) -> String {
    let text = OCR_BUY.replace_all(text, "Buy");
    OCR_GET.replace_all(&text, "Get").into_owned()
}

/// Full normalization of an already-cleaned promo segment
pub fn normalize_promo(segment: &str) -> NormalizedPromo {
    let collapsed = collapse_whitespace(segment);
    let text = fix_ocr_typos(&normalize_numbers(&collapsed));
    // Lower-cased copy is taken after typo correction so rules see "buy"/"get".
    let lower = text.to_lowercase();
    NormalizedPromo { text, lower }
}
