//! Scatter plots of outcome vs STAR score with the least-squares line
//!
//! SVG only; one file per (breakdown, outcome column).

use crate::config::SummaryConfig;
use crate::errors::StarError;
use crate::stats::correlation::{breakdown_points, linear_fit, LinearFit};
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const PLOT_SIZE: (u32, u32) = (800, 600);

/// Axis range with a 5% margin; degenerate ranges are widened to ±1
fn padded_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if hi - lo <= f64::EPSILON {
        return (lo - 1.0, hi + 1.0);
    }
    let margin = (hi - lo) * 0.05;
    (lo - margin, hi + margin)
}

/// Render one scatter plot, with the regression line if `fit` is given
pub fn render_scatter(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    fit: Option<LinearFit>,
) -> Result<()> {
    if points.is_empty() {
        return Err(StarError::InsufficientData { required: 1, actual: 0 }.into());
    }

    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = {
        let line_ends = fit.iter().flat_map(|f| [f.predict(x_min), f.predict(x_max)]);
        padded_range(points.iter().map(|p| p.1).chain(line_ends))
    };

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 22.0).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, BLUE.mix(0.6).filled())),
    )?;

    if let Some(fit) = fit {
        chart.draw_series(LineSeries::new(
            [(x_min, fit.predict(x_min)), (x_max, fit.predict(x_max))],
            RED.stroke_width(2),
        ))?;
    }

    root.present()
        .with_context(|| format!("Failed to write plot: {}", path.display()))?;

    Ok(())
}

/// Keep file names portable: anything but [A-Za-z0-9_-] becomes '_'
fn file_stem(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Render every (breakdown, outcome) scatter plot into `dir`
///
/// Pairs with no complete rows are skipped; pairs with a constant score get
/// points but no fitted line.
pub fn render_correlation_plots(
    df: &polars::prelude::DataFrame,
    config: &SummaryConfig,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create plot directory: {}", dir.display()))?;

    let mut written = Vec::new();
    for breakdown in &config.breakdowns {
        for variable in &config.value_columns {
            let (x, y) = breakdown_points(df, breakdown, config, variable)?;
            if x.is_empty() {
                tracing::warn!("{} / {}: no complete rows, plot skipped", breakdown.name, variable);
                continue;
            }

            let fit = linear_fit(&x, &y).ok();
            let points: Vec<(f64, f64)> = x.into_iter().zip(y).collect();
            let path = dir.join(format!("{}_{}.svg", file_stem(&breakdown.name), file_stem(variable)));

            render_scatter(
                &path,
                &format!("{}: {} vs {}", breakdown.name, variable, config.score_column),
                &config.score_column,
                variable,
                &points,
                fit,
            )?;
            written.push(path);
        }
    }

    tracing::info!("Rendered {} plots into {}", written.len(), dir.display());
    Ok(written)
}
