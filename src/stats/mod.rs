//! Descriptive statistics over the STAR outcomes table
//!
//! - `summary`: grouped mean/min/max/std per STAR score and breakdown
//! - `correlation`: Pearson r, p-value and least-squares fit

pub mod correlation;
pub mod summary;

pub use correlation::{correlation_report, linear_fit, paired_values, pearson, Correlation, LinearFit};
pub use summary::{breakdown_rows, summarize_by_group, summarize_fields, BreakdownSummary};
