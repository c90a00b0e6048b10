//! Utility modules shared by the survey scripts
//!
//! - Columns: presence checks and validated projection

pub mod columns;

pub use columns::{column_names, materialize_with_columns, require_columns};
