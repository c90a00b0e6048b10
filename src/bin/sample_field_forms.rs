//! Field-Form Sampler
//!
//! Selects a per-year sample of submitted field forms for follow-up:
//!   - sqrt(n) forms per crop year
//!   - at least one form of every form type (grasses, grains, legumes, ...)
//!   - extra forms to cover refusals / unreachable producers
//!
//! Usage:
//!   cargo run --bin sample_field_forms -- --input field_forms.csv --output Sampled_Field_Forms.csv

use anyhow::{Context, Result};
use clap::Parser;
use star_survey_rust::logging::init_logging;
use star_survey_rust::{
    join_producer_details, load_table, write_table, FormSampleOutcome, FormSampler,
    FormSamplingConfig,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "sample_field_forms")]
#[command(about = "Stratified per-year sample of submitted field forms", long_about = None)]
struct Cli {
    /// Field-forms export (CSV or Parquet)
    #[arg(long, default_value = "field_forms.csv")]
    input: PathBuf,

    /// Output table (CSV or Parquet)
    #[arg(long, default_value = "Sampled_Field_Forms.csv")]
    output: PathBuf,

    /// JSON configuration (column names, extra count, seed)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Producer-details table to left-join onto the sample
    #[arg(long)]
    producers: Option<PathBuf>,

    /// Override the configured seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured number of extra forms per year
    #[arg(long)]
    extra_count: Option<usize>,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    println!("\n{}", "=".repeat(70));
    println!("FIELD-FORM SAMPLER");
    println!("{}", "=".repeat(70));

    let start = Instant::now();

    let mut config = match &cli.config {
        Some(path) => FormSamplingConfig::load(path)?,
        None => FormSamplingConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(extra_count) = cli.extra_count {
        config.extra_count = extra_count;
    }

    let forms = load_table(&cli.input)
        .with_context(|| format!("Cannot read field forms from {}", cli.input.display()))?;
    println!("Loaded {} rows from {}", forms.height(), cli.input.display());

    let sampler = FormSampler::new(config);
    let result = match sampler.run(&forms)? {
        FormSampleOutcome::NoSubmissions { total_rows } => {
            println!("No submitted forms found among {} rows. Exiting.", total_rows);
            return Ok(());
        }
        FormSampleOutcome::NoDatedSubmissions { submitted_rows, rows_without_year } => {
            println!(
                "None of the {} submitted forms has a year ({} without one). Exiting.",
                submitted_rows, rows_without_year
            );
            return Ok(());
        }
        FormSampleOutcome::Sampled(result) => result,
    };

    println!("\nSubmitted forms: {} of {}", result.submitted_rows, result.total_rows);
    if result.rows_without_year > 0 {
        println!("  ⚠ Skipped {} submitted forms without a year", result.rows_without_year);
    }
    for year in &result.years {
        println!(
            "  Year {}: {} submissions → {} selected ({} base, {} coverage, {} extra)",
            year.year,
            year.submissions,
            year.selected(),
            year.base,
            year.coverage,
            year.padding
        );
    }

    let mut sample = result.sample;

    if let Some(producers_path) = &cli.producers {
        let id_column = sampler.config().producer_id_column.as_deref().ok_or_else(|| {
            anyhow::anyhow!("--producers requires producer_id_column in the configuration")
        })?;
        let producers = load_table(producers_path)
            .with_context(|| format!("Cannot read producer details from {}", producers_path.display()))?;
        sample = join_producer_details(&sample, &producers, id_column)?;
        println!("Joined producer details on '{}'", id_column);
    }

    write_table(&mut sample, &cli.output)?;

    println!("\n✓ Saved {} sampled forms: {}", sample.height(), cli.output.display());
    println!("Total time: {:.3}s", start.elapsed().as_secs_f64());

    Ok(())
}
