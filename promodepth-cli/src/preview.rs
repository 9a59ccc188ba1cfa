// Console rendering for batch previews, summaries and rule listings.

use promo_depth_core::classifier::OVERRIDE_RULES;
use promo_depth_core::rules::engine::CANDIDATE_RULES;
use promo_depth_core::{BatchResult, BatchSummary, PromoEngine};

const TEXT_WIDTH: usize = 48;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        format!("{}...", text.chars().take(width - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Print the first `rows` rows; rows above the QC threshold are marked.
pub fn print_preview(result: &BatchResult, rows: usize) {
    if rows == 0 || result.is_empty() {
        return;
    }

    println!(
        "\n📋 Preview ({} of {} rows):",
        rows.min(result.len()),
        result.len()
    );
    println!(
        "   {:>5}  {:<width$}  {:>8}  decision",
        "row",
        result.source_column,
        result.output_column,
        width = TEXT_WIDTH
    );
    for row in result.preview(rows) {
        let marker = if row.promo_depth() > result.qc_threshold {
            "🔴"
        } else {
            "  "
        };
        println!(
            "{} {:>5}  {:<width$}  {:>8.2}  {}",
            marker,
            row.index,
            truncate(row.source.display_value(), TEXT_WIDTH),
            row.promo_depth(),
            row.evaluation.decision,
            width = TEXT_WIDTH
        );
    }
}

pub fn print_summary(summary: &BatchSummary, qc_threshold: f64) {
    println!("\n📊 Batch summary:");
    println!("   - Rows: {}", summary.rows);
    println!("   - Discounted: {}", summary.discounted);
    println!("   - Decided by override: {}", summary.overrides);
    println!("   - Not text: {}", summary.not_text);
    println!("   - No separator: {}", summary.no_separator);
    println!("   - Mean depth: {:.2}%", summary.mean_depth);
    println!("   - Max depth: {:.2}%", summary.max_depth);
    if summary.flagged > 0 {
        println!(
            "   - ⚠️  Above {:.0}% (check manually): {}",
            qc_threshold, summary.flagged
        );
    }
}

/// List both rule tiers in evaluation order, with their enabled state.
pub fn print_rules(engine: &PromoEngine) {
    let state = |name: &str| if engine.is_enabled(name) { "✅" } else { "⏭️ " };

    println!("\n🔧 Entry separator: '{}'", engine.separator());

    println!("\n🛑 Override rules (first match wins):");
    for (position, rule) in OVERRIDE_RULES.iter().enumerate() {
        println!("  {} {:>2}. {}", state(rule.name), position + 1, rule.name);
    }

    println!("\n🧮 Candidate rules (lowest candidate wins):");
    for rule in CANDIDATE_RULES {
        println!("  {} {}", state(rule.name), rule.name);
    }
}

/// Full trace of one entry as pretty JSON, the only stdout output of `--explain`
pub fn explain_json(engine: &PromoEngine, text: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&engine.evaluate_text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("4000 - 1000円引き セール", 10), "4000 - ...");
    }

    #[test]
    fn test_explain_output_is_pure_json() {
        let output = explain_json(&PromoEngine::default(), "100 - Was120 Now100").unwrap();
        assert!(output.starts_with('{'));
        let trace: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(trace["promo_depth"], 16.67);
    }
}
