use serde::{Deserialize, Serialize};
use std::fmt;

// ===== INPUT TYPES =====

/// The as-received value of the price & promo field for one row.
///
/// Ingestion adapters decide the variant once; the engine never inspects
/// the shape of a cell again after this point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum RawEntry {
    /// A text cell (possibly empty)
    Text(String),
    /// The cell was absent or blank
    Missing,
    /// A non-text cell (number, boolean, ...) kept in display form for export
    NonText(String),
}

impl RawEntry {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawEntry::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Cell value as written back to the export
    pub fn display_value(&self) -> &str {
        match self {
            RawEntry::Text(text) | RawEntry::NonText(text) => text,
            RawEntry::Missing => "",
        }
    }
}

impl From<&str> for RawEntry {
    fn from(text: &str) -> Self {
        RawEntry::Text(text.to_string())
    }
}

impl From<String> for RawEntry {
    fn from(text: String) -> Self {
        RawEntry::Text(text)
    }
}

impl From<&serde_json::Value> for RawEntry {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => RawEntry::Text(text.clone()),
            serde_json::Value::Null => RawEntry::Missing,
            other => RawEntry::NonText(other.to_string()),
        }
    }
}

// ===== EVALUATION TYPES =====

/// A percentage proposed by one candidate rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub rule: &'static str,
    pub value: f64,
}

/// Why an evaluation ended with the value it did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Input was missing or not text
    NotText,
    /// Input text had no separator between base and promo segments
    NoSeparator,
    /// Promo segment was empty after trimming
    EmptyPromo,
    /// An absolute override produced the value directly
    Override { rule: &'static str },
    /// The lowest candidate won
    Resolved { rule: &'static str },
    /// No candidate rule matched
    NoMatch,
}

impl Decision {
    /// Short label used in previews and debug output
    pub fn label(&self) -> String {
        match self {
            Decision::NotText => "not-text".to_string(),
            Decision::NoSeparator => "no-separator".to_string(),
            Decision::EmptyPromo => "empty-promo".to_string(),
            Decision::Override { rule } => format!("override:{rule}"),
            Decision::Resolved { rule } => format!("rule:{rule}"),
            Decision::NoMatch => "no-match".to_string(),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Full trace of a single evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Final value in [0, 100], two decimals
    pub promo_depth: f64,
    pub base_price: Option<f64>,
    /// Promo segment after normalization (absent on early fallbacks)
    pub promo_text: Option<String>,
    /// Every accepted candidate, in rule order
    pub candidates: Vec<Candidate>,
    pub decision: Decision,
}

impl Evaluation {
    pub fn fallback(decision: Decision) -> Self {
        Self {
            promo_depth: 0.0,
            base_price: None,
            promo_text: None,
            candidates: Vec::new(),
            decision,
        }
    }
}
