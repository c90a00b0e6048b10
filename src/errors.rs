//! Typed error conditions for the survey tooling
//!
//! Library functions return `anyhow::Result`; these variants are raised
//! through it so callers can still `downcast_ref::<StarError>()`.

use thiserror::Error;

/// Domain failures that callers may want to match on.
#[derive(Debug, Error)]
pub enum StarError {
    #[error("{context}: missing column '{column}' (available: {available:?})")]
    MissingColumn {
        context: String,
        column: String,
        available: Vec<String>,
    },
    #[error("unsupported table format for '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),
    #[error("insufficient data: need at least {required} paired values, got {actual}")]
    InsufficientData { required: usize, actual: usize },
    #[error("input sequences differ in length ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("correlation undefined: '{0}' is constant")]
    ConstantInput(String),
    #[error("column '{column}': '{value}' is not a whole-number year")]
    InvalidYear { column: String, value: String },
    #[error("configuration error: {0}")]
    Configuration(String),
}
