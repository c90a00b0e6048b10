//! STAR Field Summary
//!
//! Grouped statistics of the outcome equations per STAR score (all fields,
//! corn, soybean), Pearson correlations against the score, and one scatter
//! plot per outcome.
//!
//! Output directory layout:
//!   <out>/<breakdown>.csv     one summary table per breakdown
//!   <out>/correlations.csv    r / p-value / fitted line per outcome
//!   <out>/plots/*.svg         scatter + regression line
//!
//! Usage:
//!   cargo run --bin star_summary -- --input star_field_outcomes_flat.csv --output-dir star_summary

use anyhow::{Context, Result};
use clap::Parser;
use star_survey_rust::logging::init_logging;
use star_survey_rust::plot::render_correlation_plots;
use star_survey_rust::stats::{correlation_report, summarize_fields};
use star_survey_rust::{load_table, write_table, SummaryConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "star_summary")]
#[command(about = "Summary statistics, correlations and plots for STAR field outcomes", long_about = None)]
struct Cli {
    /// STAR outcomes table (CSV or Parquet)
    #[arg(long, default_value = "star_field_outcomes_flat.csv")]
    input: PathBuf,

    /// Directory for summary tables, correlation report and plots
    #[arg(long, default_value = "star_summary")]
    output_dir: PathBuf,

    /// JSON configuration (score/crop columns, outcome columns, breakdowns)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the scatter plots
    #[arg(long, default_value = "false")]
    no_plots: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    println!("\n{}", "=".repeat(70));
    println!("STAR FIELD SUMMARY");
    println!("{}", "=".repeat(70));

    let start = Instant::now();

    let config = match &cli.config {
        Some(path) => SummaryConfig::load(path)?,
        None => SummaryConfig::default(),
    };

    let outcomes = load_table(&cli.input)
        .with_context(|| format!("Cannot read STAR outcomes from {}", cli.input.display()))?;
    println!("Loaded {} fields from {}", outcomes.height(), cli.input.display());

    // Summary tables
    for mut summary in summarize_fields(&outcomes, &config)? {
        let path = cli.output_dir.join(format!("{}.csv", summary.name));
        write_table(&mut summary.table, &path)?;
        println!(
            "  {}: {} fields, {} score groups → {}",
            summary.name,
            summary.fields,
            summary.table.height(),
            path.display()
        );
    }

    // Correlations
    let mut report = correlation_report(&outcomes, &config)?;
    let report_path = cli.output_dir.join("correlations.csv");
    write_table(&mut report, &report_path)?;
    println!("  Correlations: {} pairs → {}", report.height(), report_path.display());

    // Plots
    if !cli.no_plots {
        let plot_dir = cli.output_dir.join("plots");
        let written = render_correlation_plots(&outcomes, &config, &plot_dir)?;
        println!("  Plots: {} → {}", written.len(), plot_dir.display());
    }

    println!("\n✓ Summary statistics saved to {}", cli.output_dir.display());
    println!("Total time: {:.3}s", start.elapsed().as_secs_f64());

    Ok(())
}
