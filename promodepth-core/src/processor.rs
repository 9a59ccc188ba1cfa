use crate::config::{BatchConfig, PromoConfig};
use crate::error::{PromoDepthError, PromoDepthResult};
use crate::rules::engine::{DebugConfig, PromoEngine};
use crate::table::{Table, TableFormat};
use crate::types::{Decision, Evaluation, RawEntry};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Write;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Simple profiler that collects timings for batch steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// One input row with its evaluation
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRow {
    /// Zero-based position in the input table
    pub index: usize,
    pub source: RawEntry,
    pub evaluation: Evaluation,
}

impl ScoredRow {
    pub fn promo_depth(&self) -> f64 {
        self.evaluation.promo_depth
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    /// Rows with a non-zero promo depth
    pub discounted: usize,
    /// Rows above the QC threshold
    pub flagged: usize,
    pub not_text: usize,
    pub no_separator: usize,
    pub overrides: usize,
    pub mean_depth: f64,
    pub max_depth: f64,
}

/// Output of one batch run. Owned by the caller; nothing is cached between runs.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Header of the column the promo text was read from
    pub source_column: String,
    pub output_column: String,
    pub qc_threshold: f64,
    pub rows: Vec<ScoredRow>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn depths(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(ScoredRow::promo_depth)
    }

    pub fn preview(&self, n: usize) -> &[ScoredRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Rows strictly above the QC threshold
    pub fn flagged(&self) -> impl Iterator<Item = &ScoredRow> + '_ {
        self.rows
            .iter()
            .filter(|row| row.promo_depth() > self.qc_threshold)
    }

    pub fn summary(&self) -> BatchSummary {
        let count = |wanted: fn(&Decision) -> bool| {
            self.rows
                .iter()
                .filter(|row| wanted(&row.evaluation.decision))
                .count()
        };
        let total: f64 = self.depths().sum();

        BatchSummary {
            rows: self.rows.len(),
            discounted: self.depths().filter(|depth| *depth > 0.0).count(),
            flagged: self.flagged().count(),
            not_text: count(|d| matches!(d, Decision::NotText)),
            no_separator: count(|d| matches!(d, Decision::NoSeparator)),
            overrides: count(|d| matches!(d, Decision::Override { .. })),
            mean_depth: if self.rows.is_empty() {
                0.0
            } else {
                total / self.rows.len() as f64
            },
            max_depth: self.depths().fold(0.0, f64::max),
        }
    }

    /// Two-column CSV export: the source column under its original header, then the depth.
    pub fn write_csv<W: Write>(&self, writer: W) -> PromoDepthResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([self.source_column.as_str(), self.output_column.as_str()])?;
        for row in &self.rows {
            let depth = row.promo_depth().to_string();
            csv_writer.write_record([row.source.display_value(), depth.as_str()])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Two-key JSON export, one object per row
    pub fn to_json(&self) -> PromoDepthResult<String> {
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                record.insert(self.source_column.clone(), source_value(&row.source));
                record.insert(self.output_column.clone(), Value::from(row.promo_depth()));
                Value::Object(record)
            })
            .collect();
        Ok(serde_json::to_string_pretty(&records)?)
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> PromoDepthResult<()> {
        match TableFormat::parse(format)? {
            TableFormat::Csv => {
                let file = std::fs::File::create(path)?;
                self.write_csv(file)?;
            }
            TableFormat::Json => {
                let json = self.to_json()?;
                std::fs::write(path, json)?;
            }
        }
        Ok(())
    }
}

// Non-text cells were JSON scalars when they came from JSON input; restore them.
fn source_value(entry: &RawEntry) -> Value {
    match entry {
        RawEntry::Text(text) => Value::String(text.clone()),
        RawEntry::Missing => Value::Null,
        RawEntry::NonText(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
    }
}

/// Applies the engine to every row of a table
pub struct BatchProcessor {
    engine: PromoEngine,
    batch: BatchConfig,
}

impl BatchProcessor {
    pub fn new(config: &PromoConfig) -> Self {
        Self {
            engine: PromoEngine::new(&config.engine),
            batch: config.batch.clone(),
        }
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.engine.set_debug_config(debug_config);
    }

    pub fn engine(&self) -> &PromoEngine {
        &self.engine
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch
    }

    /// Load a CSV/JSON file and score it
    pub fn process_path(
        &self,
        input_path: &str,
        profiler: &mut StepProfiler,
    ) -> PromoDepthResult<BatchResult> {
        println!("📄 Loading table: {input_path}");
        let table = profiler.time_step("Load Table", || Table::from_path(input_path))?;
        println!(
            "   ✅ {} rows, {} columns",
            table.len(),
            table.headers.len()
        );
        self.process_table_with_profiler(&table, profiler)
    }

    pub fn process_table(&self, table: &Table) -> PromoDepthResult<BatchResult> {
        self.process_table_with_profiler(table, &mut StepProfiler::new(false))
    }

    pub fn process_table_with_profiler(
        &self,
        table: &Table,
        profiler: &mut StepProfiler,
    ) -> PromoDepthResult<BatchResult> {
        if table.is_empty() {
            return Err(PromoDepthError::EmptyInput);
        }

        let (column, source_column) = table.find_column(&self.batch.source_columns)?;
        println!(
            "🔧 Scoring {} rows from column '{}'{}",
            table.len(),
            source_column,
            if self.batch.parallel { " (parallel)" } else { "" }
        );

        let rows = profiler.time_step("Evaluate Rows", || self.score_column(table, column));

        let result = BatchResult {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source_column: source_column.to_string(),
            output_column: self.batch.output_column.clone(),
            qc_threshold: self.batch.qc_threshold,
            rows,
        };

        let flagged = result.flagged().count();
        println!("✅ Scored {} rows", result.len());
        if flagged > 0 {
            println!(
                "⚠️  {} rows above the {:.0}% QC threshold",
                flagged, result.qc_threshold
            );
        }
        Ok(result)
    }

    fn score_column(&self, table: &Table, column: usize) -> Vec<ScoredRow> {
        let entries: Vec<&RawEntry> = table.column(column).collect();
        let score = |(index, entry): (usize, &&RawEntry)| ScoredRow {
            index,
            source: (*entry).clone(),
            evaluation: self.engine.evaluate(entry),
        };

        if self.batch.parallel {
            entries.par_iter().enumerate().map(score).collect()
        } else {
            entries.iter().enumerate().map(score).collect()
        }
    }
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(&PromoConfig::default())
    }
}
