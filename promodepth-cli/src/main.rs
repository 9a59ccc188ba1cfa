use anyhow::Result;
use clap::Parser;
use std::path::Path;

// Import from promo-depth-core
use promo_depth_core::{
    BatchProcessor, BatchResult, DebugConfig, PromoConfig, PromoDepthError, StepProfiler,
};

// Import CLI utilities
use promo_depth::preview::{explain_json, print_preview, print_rules, print_summary};

#[derive(Parser)]
#[command(name = "promo-depth")]
#[command(about = "Compute promo depth percentages from retail price & promo text")]
struct Args {
    /// Path to the input table (.csv or .json)
    #[arg(short, long, required_unless_present_any = ["explain", "show_rules"])]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format: csv or json
    #[arg(short = 'f', long, default_value = "csv")]
    output_format: String,

    /// Number of rows to preview (defaults to the config value)
    #[arg(long)]
    preview: Option<usize>,

    /// Enable detailed profiling of all batch steps
    #[arg(long)]
    profile: bool,

    /// Print the rule trace of entries matching this pattern (regex or substring)
    #[arg(long = "debug-filter")]
    debug_filter: Vec<String>,

    /// List override and candidate rules and exit
    #[arg(long)]
    show_rules: bool,

    /// Evaluate a single entry, print its full trace as JSON and exit
    #[arg(long)]
    explain: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load config using functional pattern
    let config = PromoConfig::load_with_fallback(args.config.as_deref());

    let mut processor = BatchProcessor::new(&config);
    if !args.debug_filter.is_empty() {
        processor.set_debug_config(DebugConfig::new(true, args.debug_filter.clone()));
    }

    if args.show_rules {
        print_rules(processor.engine());
        return Ok(());
    }

    if let Some(text) = &args.explain {
        println!("{}", explain_json(processor.engine(), text)?);
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        return Ok(());
    };

    println!("🦀 Promo Depth Calculator");
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    if !Path::new(input).exists() {
        eprintln!("❌ Input table not found at: {}", input);
        std::process::exit(1);
    }

    let mut profiler = StepProfiler::new(args.profile);
    let result = match processor.process_path(input, &mut profiler) {
        Ok(result) => result,
        Err(PromoDepthError::MissingColumn { expected }) => {
            eprintln!("❌ Expected column not found.");
            eprintln!("   Looking for one of: {}", expected.join(", "));
            std::process::exit(2);
        }
        Err(PromoDepthError::EmptyInput) => {
            eprintln!("❌ The uploaded table is empty.");
            std::process::exit(3);
        }
        Err(e) => {
            eprintln!("❌ Processing failed: {e}");
            std::process::exit(1);
        }
    };

    let preview_rows = args
        .preview
        .unwrap_or(processor.batch_config().preview_rows);
    print_preview(&result, preview_rows);
    print_summary(&result.summary(), result.qc_threshold);

    let output_path = args.output.clone().unwrap_or_else(|| {
        let input_name = Path::new(input)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        format!("{input_name}_promo_depth.{}", args.output_format)
    });

    profiler.time_step("Save Output", || {
        save_result(&result, &output_path, &args.output_format)
    })?;
    profiler.print_summary();

    Ok(())
}

fn save_result(result: &BatchResult, output_path: &str, format: &str) -> Result<()> {
    result.save_with_format(output_path, format)?;
    println!(
        "💾 {} rows saved to: {} ({})",
        result.len(),
        output_path,
        format
    );
    println!("   Batch id: {} at {}", result.id, result.created_at.to_rfc3339());
    Ok(())
}
