//! Soil-Survey Subsample
//!
//! Draws a random subsample of rows (all columns kept by default) from a
//! STAR soil survey export.
//!
//! Usage:
//!   cargo run --bin soil_subsample -- --input STAR_2022.csv --output STAR_2022_updated.csv

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use star_survey_rust::logging::init_logging;
use star_survey_rust::{load_table, write_table, SoilConfig, SoilSubsample};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "soil_subsample")]
#[command(about = "Random subsample of a STAR soil survey export", long_about = None)]
struct Cli {
    /// Survey export (CSV or Parquet)
    #[arg(long, default_value = "STAR_2022.csv")]
    input: PathBuf,

    /// Output table (CSV or Parquet)
    #[arg(long, default_value = "STAR_2022_updated.csv")]
    output: PathBuf,

    /// JSON configuration (sample size, named columns, skipped rows, seed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured sample size
    #[arg(long)]
    sample_size: Option<usize>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SoilConfig::load(path)?,
        None => SoilConfig::default(),
    };
    if let Some(sample_size) = cli.sample_size {
        config.sample_size = sample_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let survey = load_table(&cli.input)
        .with_context(|| format!("Cannot read soil survey from {}", cli.input.display()))?;
    println!("Loaded {} rows × {} columns from {}", survey.height(), survey.width(), cli.input.display());

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut sample = SoilSubsample::new(config).run(&survey, &mut rng)?;

    write_table(&mut sample, &cli.output)?;
    println!("✓ Saved {} rows: {}", sample.height(), cli.output.display());

    Ok(())
}
