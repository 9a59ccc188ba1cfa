use super::context::PromoContext;
use super::resolver::resolve;
use super::{multibuy, percent, pricing};
use crate::base_price::extract_base_price;
use crate::classifier::{classify, OVERRIDE_RULES};
use crate::config::EngineConfig;
use crate::normalizer::{clean_segment, normalize_promo, split_entry};
use crate::numeric::{clamp_pct, round2};
use crate::types::{Candidate, Decision, Evaluation, RawEntry};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// One accumulating rule: proposes zero or more percentages for an entry.
pub struct CandidateRule {
    pub name: &'static str,
    pub propose: fn(&PromoContext) -> Vec<f64>,
}

impl CandidateRule {
    pub const fn new(name: &'static str, propose: fn(&PromoContext) -> Vec<f64>) -> Self {
        Self { name, propose }
    }
}

/// The candidate corpus. Order only affects the trace; resolution takes the minimum.
pub static CANDIDATE_RULES: &[CandidateRule] = &[
    // percentages and money-off
    CandidateRule::new("multiplier", percent::multiplier),
    CandidateRule::new("direct_percent", percent::direct_percent),
    CandidateRule::new("tenths", percent::tenths),
    CandidateRule::new("was_now", percent::was_now),
    CandidateRule::new("save_amount", percent::save_amount),
    CandidateRule::new("money_off", percent::money_off),
    CandidateRule::new("yen_off", percent::yen_off),
    // unit-count bundles
    CandidateRule::new("buy_get", multibuy::buy_get),
    CandidateRule::new("any_get_free", multibuy::any_get_free),
    CandidateRule::new("buy_pay_units", multibuy::buy_pay_units),
    CandidateRule::new("plus_free", multibuy::plus_free),
    CandidateRule::new("take_pay", multibuy::take_pay),
    CandidateRule::new("fixed_idioms", multibuy::fixed_idioms),
    CandidateRule::new("quantity_for", multibuy::quantity_for),
    CandidateRule::new("for_get", multibuy::for_get),
    CandidateRule::new("buy_for_pay", multibuy::buy_for_pay),
    CandidateRule::new("price_of", multibuy::price_of),
    CandidateRule::new("any_three_or_four_get_one", multibuy::any_three_or_four_get_one),
    // price comparisons
    CandidateRule::new("unit_vs_bundle", pricing::unit_vs_bundle),
    CandidateRule::new("qty_for_total", pricing::qty_for_total),
    CandidateRule::new("buy_pay_price", pricing::buy_pay_price),
    CandidateRule::new("each_price", pricing::each_price),
    CandidateRule::new("unit_price", pricing::unit_price),
    CandidateRule::new("second_item", pricing::second_item),
    CandidateRule::new("buy_one_for", pricing::buy_one_for),
    CandidateRule::new("tiered_buy_one", pricing::tiered_buy_one),
    CandidateRule::new("buy_for_save", pricing::buy_for_save),
    CandidateRule::new("each_then_bundle", pricing::each_then_bundle),
    CandidateRule::new("two_price_compare", pricing::two_price_compare),
    CandidateRule::new("explicit_unit_price", pricing::explicit_unit_price),
    CandidateRule::new("buy_get_price", pricing::buy_get_price),
    CandidateRule::new("bottle_discount", pricing::bottle_discount),
    CandidateRule::new("multi_tier", pricing::multi_tier),
];

/// Every rule name the engine knows, overrides first
pub fn rule_names() -> impl Iterator<Item = &'static str> {
    OVERRIDE_RULES
        .iter()
        .map(|rule| rule.name)
        .chain(CANDIDATE_RULES.iter().map(|rule| rule.name))
}

// Debug configuration for evaluation tracing
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub filter_patterns: Vec<String>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filter_patterns,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            filter_patterns: Vec::new(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.filter_patterns.iter().any(|pattern| {
            // Try regex first, fall back to simple string contains
            if let Ok(regex) = Regex::new(pattern) {
                regex.is_match(text)
            } else {
                text.contains(pattern.as_str())
            }
        })
    }
}

/// Debug utility function to print the rule trace of an entry
pub fn debug_evaluation(entry_text: &str, evaluation: &Evaluation, debug_config: &DebugConfig) {
    if !debug_config.matches(entry_text) {
        return;
    }

    let text_preview = if entry_text.chars().count() > 60 {
        format!("{}...", entry_text.chars().take(57).collect::<String>())
    } else {
        entry_text.to_string()
    };
    println!(
        "🔍 \"{}\" → {:.2}% ({})",
        text_preview, evaluation.promo_depth, evaluation.decision
    );
    if let Some(base) = evaluation.base_price {
        println!("  base price: {base}");
    }
    if let Some(promo) = &evaluation.promo_text {
        println!("  promo: \"{promo}\"");
    }
    for candidate in &evaluation.candidates {
        println!("  {:<28} {:>8.2}", candidate.rule, candidate.value);
    }
    println!();
}

/// Promo depth engine: override tier, then candidate tier, then resolution.
///
/// Holds only configuration; evaluation is pure and the engine is shared
/// freely across threads.
#[derive(Debug, Clone)]
pub struct PromoEngine {
    separator: char,
    disabled: HashSet<String>,
    debug_config: DebugConfig,
}

impl PromoEngine {
    pub fn new(config: &EngineConfig) -> Self {
        let known: HashSet<&str> = rule_names().collect();

        // Diagnostics go to stderr; stdout carries the `--explain` JSON.
        for rule in config.rules.iter().filter(|r| !known.contains(r.name.as_str())) {
            eprintln!("⚠️  Unknown rule: {}. Ignoring...", rule.name);
        }

        let disabled: HashSet<String> = config
            .disabled_rules()
            .filter(|name| known.contains(name))
            .inspect(|name| eprintln!("   ⏭️  Disabling rule: {name}"))
            .map(String::from)
            .collect();

        Self {
            separator: config.separator,
            disabled,
            debug_config: DebugConfig::disabled(),
        }
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn is_enabled(&self, rule_name: &str) -> bool {
        !self.disabled.contains(rule_name)
    }

    /// Final promo depth for a raw price & promo text
    pub fn promo_depth(&self, text: &str) -> f64 {
        self.evaluate_text(text).promo_depth
    }

    pub fn evaluate(&self, entry: &RawEntry) -> Evaluation {
        match entry.as_text() {
            Some(text) => self.evaluate_text(text),
            None => Evaluation::fallback(Decision::NotText),
        }
    }

    pub fn evaluate_text(&self, text: &str) -> Evaluation {
        let evaluation = self.run(text);
        debug_evaluation(text, &evaluation, &self.debug_config);
        evaluation
    }

    fn run(&self, text: &str) -> Evaluation {
        let Some((base_segment, promo_segment)) = split_entry(text, self.separator) else {
            return Evaluation::fallback(Decision::NoSeparator);
        };

        let base_price = extract_base_price(base_segment);
        let raw_promo = clean_segment(promo_segment);
        if raw_promo.is_empty() {
            return Evaluation {
                base_price,
                ..Evaluation::fallback(Decision::EmptyPromo)
            };
        }

        let ctx = PromoContext::new(&raw_promo, normalize_promo(&raw_promo), base_price);
        self.evaluate_context(&ctx)
    }

    fn evaluate_context(&self, ctx: &PromoContext) -> Evaluation {
        if let Some((rule, value)) = classify(ctx, |name| self.is_enabled(name)) {
            return Evaluation {
                promo_depth: round2(clamp_pct(value)),
                base_price: ctx.base_price,
                promo_text: Some(ctx.text.clone()),
                candidates: Vec::new(),
                decision: Decision::Override { rule },
            };
        }

        let candidates: Vec<Candidate> = CANDIDATE_RULES
            .iter()
            .filter(|rule| self.is_enabled(rule.name))
            .flat_map(|rule| {
                (rule.propose)(ctx)
                    .into_iter()
                    .map(move |value| Candidate { rule: rule.name, value })
            })
            .filter(|candidate| candidate.value.is_finite() && candidate.value > 0.0)
            .collect();

        let (promo_depth, decision) = match resolve(&candidates) {
            (depth, Some(winner)) => (depth, Decision::Resolved { rule: winner.rule }),
            (depth, None) => (depth, Decision::NoMatch),
        };

        Evaluation {
            promo_depth,
            base_price: ctx.base_price,
            promo_text: Some(ctx.text.clone()),
            candidates,
            decision,
        }
    }
}

impl Default for PromoEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

static DEFAULT_ENGINE: LazyLock<PromoEngine> = LazyLock::new(PromoEngine::default);

/// Promo depth of one raw "base - promo" field with the default configuration.
///
/// Returns a value in [0, 100] with at most two decimals; text without a
/// separator yields 0.
pub fn compute_promo_depth(text: &str) -> f64 {
    DEFAULT_ENGINE.promo_depth(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    fn engine_with(rules: &[(&str, bool)]) -> PromoEngine {
        PromoEngine::new(&EngineConfig {
            separator: '-',
            rules: rules
                .iter()
                .map(|(name, enabled)| RuleConfig {
                    name: name.to_string(),
                    enabled: *enabled,
                })
                .collect(),
        })
    }

    #[test]
    fn test_rule_names_are_unique() {
        let names: Vec<&str> = rule_names().collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_basic_scenarios() {
        assert_eq!(compute_promo_depth("19.90 - Buy 2 Get 1 Free"), 33.33);
        assert_eq!(compute_promo_depth("50 - 20% off"), 20.0);
        assert_eq!(compute_promo_depth("100 - Was 100 Now 80"), 20.0);
        assert_eq!(compute_promo_depth("no dash here"), 0.0);
    }

    #[test]
    fn test_fallback_decisions() {
        let engine = PromoEngine::default();
        assert_eq!(engine.evaluate(&RawEntry::Missing).decision, Decision::NotText);
        assert_eq!(
            engine.evaluate(&RawEntry::NonText("42".to_string())).decision,
            Decision::NotText
        );
        assert_eq!(engine.evaluate_text("no dash").decision, Decision::NoSeparator);

        let empty = engine.evaluate_text("10 - \t ");
        assert_eq!(empty.decision, Decision::EmptyPromo);
        assert_eq!(empty.base_price, Some(10.0));
        assert_eq!(empty.promo_depth, 0.0);
    }

    #[test]
    fn test_override_short_circuits_candidates() {
        let evaluation = PromoEngine::default().evaluate_text("10 - up to 50% off");
        assert_eq!(evaluation.promo_depth, 50.0);
        assert_eq!(
            evaluation.decision,
            Decision::Override {
                rule: "up_to_percent"
            }
        );
        assert!(evaluation.candidates.is_empty());
    }

    #[test]
    fn test_minimum_candidate_wins() {
        let evaluation = PromoEngine::default().evaluate_text("20 - Buy 1 Get 2nd 50% off");
        assert_eq!(evaluation.promo_depth, 25.0);
        assert!(evaluation
            .candidates
            .iter()
            .any(|c| c.rule == "direct_percent" && c.value == 50.0));
        assert_eq!(evaluation.decision, Decision::Resolved { rule: "second_item" });
    }

    #[test]
    fn test_disabled_rules_are_skipped() {
        let engine = engine_with(&[("up_to_percent", false)]);
        let evaluation = engine.evaluate_text("10 - up to 50% off");
        assert_eq!(evaluation.promo_depth, 50.0);
        assert_eq!(
            evaluation.decision,
            Decision::Resolved {
                rule: "direct_percent"
            }
        );

        let engine = engine_with(&[("direct_percent", false)]);
        assert_eq!(engine.promo_depth("50 - 20% off"), 0.0);
    }

    #[test]
    fn test_unknown_rule_names_are_ignored() {
        let engine = engine_with(&[("no_such_rule", false)]);
        assert!(engine.is_enabled("no_such_rule"));
        assert_eq!(engine.promo_depth("50 - 20% off"), 20.0);
    }

    #[test]
    fn test_custom_separator() {
        let engine = PromoEngine::new(&EngineConfig {
            separator: '|',
            rules: Vec::new(),
        });
        assert_eq!(engine.separator(), '|');
        assert_eq!(engine.promo_depth("50 | 20% off"), 20.0);
        assert_eq!(engine.promo_depth("50 - 20% off"), 0.0);
    }

    #[test]
    fn test_debug_filter_regex_and_substring() {
        let config = DebugConfig::new(true, vec!["^19\\.90".to_string(), "(".to_string()]);
        assert!(config.matches("19.90 - Buy 2 Get 1 Free"));
        assert!(config.matches("10 - (promo)"));
        assert!(!config.matches("20 - 10% off"));
        assert!(!DebugConfig::disabled().matches("19.90 - anything"));
    }
}
