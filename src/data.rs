//! Table Loading and Writing
//!
//! Reads the survey exports (CSV or Parquet, chosen by extension) into
//! Polars DataFrames and writes results back out. Writes go to a temporary
//! file in the destination directory and are only moved over the target once
//! complete, so a failed run never leaves a half-written output behind.

use crate::errors::StarError;
use anyhow::{Context, Result};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Supported on-disk table formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(TableFormat::Csv),
            Some("parquet") => Ok(TableFormat::Parquet),
            _ => Err(StarError::UnsupportedFormat(path.display().to_string()).into()),
        }
    }
}

/// Load a table, treating `NA` cells as null
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let format = TableFormat::from_path(path)?;

    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }

    let df = match format {
        TableFormat::Csv => load_csv(path)?,
        TableFormat::Parquet => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to scan parquet: {}", path.display()))?
            .collect()
            .with_context(|| format!("Failed to load parquet: {}", path.display()))?,
    };

    tracing::debug!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );

    Ok(df)
}

fn load_csv(path: &Path) -> Result<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None) // Scan entire file
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {}", path.display()))
}

/// Write a table atomically, creating the parent directory if needed
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let format = TableFormat::from_path(path)?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;

    match format {
        TableFormat::Csv => {
            CsvWriter::new(tmp.as_file_mut())
                .include_header(true)
                .finish(df)
                .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
        }
        TableFormat::Parquet => {
            ParquetWriter::new(tmp.as_file_mut())
                .with_compression(ParquetCompression::Zstd(None))
                .finish(df)
                .with_context(|| format!("Failed to write parquet: {}", path.display()))?;
        }
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to move output into place: {}", path.display()))?;

    tracing::debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
