//! Column validation helpers
//!
//! Every table comes from a hand-maintained export, so each entry point
//! checks the configured column names up front and reports the columns that
//! *are* available instead of failing deep inside a polars expression.

use crate::errors::StarError;
use anyhow::{Context, Result};
use polars::prelude::*;

/// Column names of a DataFrame as owned strings
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// Check that every name in `columns` exists in `df`
///
/// # Errors
/// `StarError::MissingColumn` naming the first absent column and listing the
/// available ones.
///
/// # Example
/// ```rust,ignore
/// require_columns(&forms, &["Year", "Form Name"], "field forms")?;
/// ```
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, columns: &[S], context: &str) -> Result<()> {
    let available = column_names(df);

    for expected in columns {
        let expected = expected.as_ref();
        if !available.iter().any(|name| name == expected) {
            return Err(StarError::MissingColumn {
                context: context.to_string(),
                column: expected.to_string(),
                available,
            }
            .into());
        }
    }

    Ok(())
}

/// Materialize a LazyFrame with exactly the given columns, validating first
///
/// # Arguments
/// * `lazy` - LazyFrame to materialize
/// * `columns` - Required column names, in output order
/// * `context` - Context for error messages (e.g., "soil subsample")
pub fn materialize_with_columns<S: AsRef<str>>(
    lazy: &LazyFrame,
    columns: &[S],
    context: &str,
) -> Result<DataFrame> {
    let col_exprs: Vec<Expr> = columns.iter()
        .map(|name| col(name.as_ref()))
        .collect();

    let df = lazy
        .clone()
        .select(&col_exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns", context))?;

    require_columns(&df, columns, context)?;

    Ok(df)
}
