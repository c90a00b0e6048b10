//! Grouped Summary Statistics
//!
//! Mean / min / max / standard deviation of each outcome column per STAR
//! score, for every field and per crop type. Output headers are flattened
//! as `<column>_<stat>` so each table maps onto a single sheet or CSV.

use crate::config::{Breakdown, SummaryConfig};
use crate::utils::require_columns;
use anyhow::{Context, Result};
use polars::prelude::*;

/// Summary table for one breakdown
#[derive(Debug)]
pub struct BreakdownSummary {
    pub name: String,
    /// Rows in the breakdown before grouping
    pub fields: usize,
    pub table: DataFrame,
}

/// Rows of `df` selected by a breakdown
pub fn breakdown_rows(df: &DataFrame, breakdown: &Breakdown, crop_column: &str) -> Result<DataFrame> {
    let Some(code) = &breakdown.crop_code else {
        return Ok(df.clone());
    };

    require_columns(df, &[crop_column], "breakdown")?;

    df.clone()
        .lazy()
        .filter(col(crop_column).cast(DataType::String).eq(lit(code.as_str())))
        .collect()
        .with_context(|| format!("Failed to select {} rows ({} = {})", breakdown.name, crop_column, code))
}

/// Group by `group_column` and describe every value column
///
/// One row per non-null group value, ascending. Standard deviation is the
/// sample (n - 1) estimate, null for single-row groups.
pub fn summarize_by_group<S: AsRef<str>>(
    df: &DataFrame,
    group_column: &str,
    value_columns: &[S],
) -> Result<DataFrame> {
    let mut required: Vec<&str> = vec![group_column];
    required.extend(value_columns.iter().map(|c| c.as_ref()));
    require_columns(df, &required, "summary statistics")?;

    let mut aggs: Vec<Expr> = Vec::with_capacity(value_columns.len() * 4);
    for name in value_columns {
        let name = name.as_ref();
        let values = col(name).cast(DataType::Float64);
        aggs.push(values.clone().mean().alias(format!("{}_mean", name)));
        aggs.push(values.clone().min().alias(format!("{}_min", name)));
        aggs.push(values.clone().max().alias(format!("{}_max", name)));
        aggs.push(values.std(1).alias(format!("{}_std", name)));
    }

    df.clone()
        .lazy()
        .filter(col(group_column).is_not_null())
        .group_by([col(group_column)])
        .agg(aggs)
        .sort([group_column], Default::default())
        .collect()
        .with_context(|| format!("Failed to summarize by '{}'", group_column))
}

/// Summaries for every configured breakdown
pub fn summarize_fields(df: &DataFrame, config: &SummaryConfig) -> Result<Vec<BreakdownSummary>> {
    let mut required = vec![config.score_column.as_str(), config.crop_column.as_str()];
    required.extend(config.value_columns.iter().map(|c| c.as_str()));
    require_columns(df, &required, "STAR outcomes")?;

    let mut summaries = Vec::with_capacity(config.breakdowns.len());
    for breakdown in &config.breakdowns {
        let rows = breakdown_rows(df, breakdown, &config.crop_column)?;
        if rows.height() == 0 {
            tracing::warn!("{}: no fields match", breakdown.name);
        }

        let table = summarize_by_group(&rows, &config.score_column, &config.value_columns)?;
        tracing::info!(
            "{}: {} fields across {} score groups",
            breakdown.name,
            rows.height(),
            table.height()
        );

        summaries.push(BreakdownSummary {
            name: breakdown.name.clone(),
            fields: rows.height(),
            table,
        });
    }

    Ok(summaries)
}
