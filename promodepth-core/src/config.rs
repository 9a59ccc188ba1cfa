use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_separator() -> char {
    '-'
}

fn default_source_columns() -> Vec<String> {
    vec![
        "Price & Promo".to_string(),
        "Price & Promo Details".to_string(),
    ]
}

fn default_output_column() -> String {
    "Promo Depth".to_string()
}

fn default_qc_threshold() -> f64 {
    85.0
}

fn default_preview_rows() -> usize {
    50
}

/// Top-level configuration file layout. Every field is optional in YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromoConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Character splitting the base price segment from the promo segment
    #[serde(default = "default_separator")]
    pub separator: char,
    /// Per-rule switches; rules not listed stay enabled
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Name of the override or candidate rule
    pub name: String,
    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            rules: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn disabled_rules(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|rule| !rule.enabled)
            .map(|rule| rule.name.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Recognized names of the price & promo column, in priority order
    #[serde(default = "default_source_columns")]
    pub source_columns: Vec<String>,
    /// Header of the computed column in the export
    #[serde(default = "default_output_column")]
    pub output_column: String,
    /// Rows strictly above this depth are flagged for manual QC
    #[serde(default = "default_qc_threshold")]
    pub qc_threshold: f64,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Evaluate rows on the rayon thread pool
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            source_columns: default_source_columns(),
            output_column: default_output_column(),
            qc_threshold: default_qc_threshold(),
            preview_rows: default_preview_rows(),
            parallel: true,
        }
    }
}

impl PromoConfig {
    /// Load config from file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PromoConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                eprintln!("⚠️  Failed to load config from {p} ({e}), using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}
