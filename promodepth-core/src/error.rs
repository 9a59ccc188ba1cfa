//! Batch error types.
//!
//! The engine itself never fails; these cover ingestion and export only, and
//! each is reported distinctly from a valid 0% result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromoDepthError {
    #[error("Expected column not found. Looking for one of: {}", expected.join(", "))]
    MissingColumn { expected: Vec<String> },

    #[error("Input contains no rows")]
    EmptyInput,

    #[error("Unsupported format: {0} (expected csv or json)")]
    UnsupportedFormat(String),

    #[error("Invalid JSON input: {0}")]
    InvalidJson(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for batch operations.
pub type PromoDepthResult<T> = Result<T, PromoDepthError>;
