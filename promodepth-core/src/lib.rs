// Promo Depth Core Library
//
// Derives a single promo depth percentage from noisy "price - promo" text.
// Main interface for scoring single entries and whole tables.

pub mod base_price;
pub mod classifier;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod numeric;
pub mod processor;
pub mod rules;
pub mod table;
pub mod types;

// Re-export main types and functions for easy use
pub use config::{BatchConfig, EngineConfig, PromoConfig, RuleConfig};
pub use error::{PromoDepthError, PromoDepthResult};
pub use processor::{BatchProcessor, BatchResult, BatchSummary, ScoredRow, StepProfiler};
pub use rules::engine::{compute_promo_depth, DebugConfig, PromoEngine};
pub use table::{Table, TableFormat};
pub use types::*;
