//! STAR Survey Toolkit
//!
//! Analysis tooling for STAR field scores and producer-submitted field forms:
//! - `sampler`: stratified coverage sampler (per-year form samples)
//! - `forms`: field-form sampling pipeline over Polars DataFrames
//! - `stats/`: grouped summary statistics and Pearson correlation
//! - `plot`: score vs outcome scatter plots with regression lines
//! - `soil`: soil-survey random subsample
//! - `data`: CSV/Parquet loading and atomic writes
//! - `config`: JSON configuration (column names, seeds, breakdowns)

pub mod config;
pub mod data;
pub mod errors;
pub mod forms;
pub mod logging;
pub mod plot;
pub mod sampler;
pub mod soil;
pub mod stats;
pub mod utils;

// Re-export commonly used types
pub use config::{Breakdown, FormSamplingConfig, SoilConfig, SummaryConfig};
pub use data::{load_table, write_table};
pub use errors::StarError;
pub use forms::{join_producer_details, FormSample, FormSampleOutcome, FormSampler, YearSummary};
pub use sampler::{base_sample_size, CoverageSampler, PartitionSample};
pub use soil::SoilSubsample;
