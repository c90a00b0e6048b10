//! Pearson correlation between STAR scores and field outcomes
//!
//! The two-sided p-value comes from the t distribution with `n - 2` degrees
//! of freedom, evaluated through the regularized incomplete beta function:
//!
//!   t² = r² (n - 2) / (1 - r²)
//!   p  = I_{(n-2)/(n-2+t²)}((n - 2)/2, 1/2)

use crate::config::{Breakdown, SummaryConfig};
use crate::errors::StarError;
use crate::stats::summary::breakdown_rows;
use crate::utils::require_columns;
use anyhow::{Context, Result};
use polars::prelude::*;

/// Pearson correlation result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    /// Number of paired observations
    pub n: usize,
    pub r: f64,
    /// Two-sided p-value for H0: r = 0
    pub p_value: f64,
}

/// Ordinary least-squares line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Centered sums (sxx, syy, sxy) and means
struct Moments {
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(x: &[f64], y: &[f64]) -> Result<Moments, StarError> {
    if x.len() != y.len() {
        return Err(StarError::LengthMismatch { left: x.len(), right: y.len() });
    }
    if x.len() < 2 {
        return Err(StarError::InsufficientData { required: 2, actual: x.len() });
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    Ok(Moments { mean_x, mean_y, sxx, syy, sxy })
}

/// Pearson correlation coefficient and two-sided p-value
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation, StarError> {
    let m = moments(x, y)?;
    if m.sxx == 0.0 {
        return Err(StarError::ConstantInput("x".to_string()));
    }
    if m.syy == 0.0 {
        return Err(StarError::ConstantInput("y".to_string()));
    }

    let n = x.len();
    let r = (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0);

    let p_value = if n == 2 {
        // Two points always lie on a line
        1.0
    } else if 1.0 - r * r <= 0.0 {
        0.0
    } else {
        let df = (n - 2) as f64;
        let t2 = r * r * df / (1.0 - r * r);
        regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t2))
    };

    Ok(Correlation { n, r, p_value })
}

/// Least-squares regression of `y` on `x`
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, StarError> {
    let m = moments(x, y)?;
    if m.sxx == 0.0 {
        return Err(StarError::ConstantInput("x".to_string()));
    }

    let slope = m.sxy / m.sxx;
    Ok(LinearFit { slope, intercept: m.mean_y - slope * m.mean_x })
}

/// Regularized incomplete beta I_x(a, b)
///
/// Continued fraction (modified Lentz), using the symmetry relation
/// I_x(a, b) = 1 - I_{1-x}(b, a) where it converges faster.
fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let ln_front = libm::lgamma(a + b) - libm::lgamma(a) - libm::lgamma(b)
        + a * x.ln()
        + b * (1.0 - x).ln();
    let front = ln_front.exp();

    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 3.0e-16;
    const FPMIN: f64 = 1.0e-300;

    let guard = |v: f64| if v.abs() < FPMIN { FPMIN } else { v };

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        // Even step
        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        // Odd step
        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Pairwise-complete (x, y) values from two numeric columns
///
/// Rows with a null or NaN in either column are dropped, matching how the
/// outcome exports leave cells blank for practices a field did not report.
pub fn paired_values(df: &DataFrame, x_column: &str, y_column: &str) -> Result<(Vec<f64>, Vec<f64>)> {
    require_columns(df, &[x_column, y_column], "correlation")?;

    let x_col = df.column(x_column)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", x_column))?;
    let y_col = df.column(y_column)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", y_column))?;

    let mut xs = Vec::with_capacity(df.height());
    let mut ys = Vec::with_capacity(df.height());
    for (x, y) in x_col.f64()?.into_iter().zip(y_col.f64()?.into_iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            if x.is_finite() && y.is_finite() {
                xs.push(x);
                ys.push(y);
            }
        }
    }

    Ok((xs, ys))
}

/// Correlate the score column with every value column, per breakdown
///
/// Output columns: `breakdown, variable, n, r, p_value, slope, intercept`.
/// Pairs that cannot be correlated (fewer than 2 complete rows, constant
/// input) are logged and left out.
pub fn correlation_report(df: &DataFrame, config: &SummaryConfig) -> Result<DataFrame> {
    let mut required = vec![config.score_column.as_str(), config.crop_column.as_str()];
    required.extend(config.value_columns.iter().map(|c| c.as_str()));
    require_columns(df, &required, "correlation report")?;

    let mut breakdowns: Vec<String> = Vec::new();
    let mut variables: Vec<String> = Vec::new();
    let mut ns: Vec<u64> = Vec::new();
    let mut rs: Vec<f64> = Vec::new();
    let mut p_values: Vec<f64> = Vec::new();
    let mut slopes: Vec<f64> = Vec::new();
    let mut intercepts: Vec<f64> = Vec::new();

    for breakdown in &config.breakdowns {
        let rows = breakdown_rows(df, breakdown, &config.crop_column)?;

        for variable in &config.value_columns {
            let (x, y) = paired_values(&rows, &config.score_column, variable)?;

            let correlation = match pearson(&x, &y) {
                Ok(c) => c,
                Err(err) => {
                    tracing::warn!("{} / {}: skipped ({})", breakdown.name, variable, err);
                    continue;
                }
            };
            let fit = linear_fit(&x, &y)?;

            tracing::debug!(
                "{} / {}: n={} r={:.4} p={:.4}",
                breakdown.name, variable, correlation.n, correlation.r, correlation.p_value
            );

            breakdowns.push(breakdown.name.clone());
            variables.push(variable.clone());
            ns.push(correlation.n as u64);
            rs.push(correlation.r);
            p_values.push(correlation.p_value);
            slopes.push(fit.slope);
            intercepts.push(fit.intercept);
        }
    }

    df![
        "breakdown" => breakdowns,
        "variable" => variables,
        "n" => ns,
        "r" => rs,
        "p_value" => p_values,
        "slope" => slopes,
        "intercept" => intercepts,
    ]
    .with_context(|| "Failed to build correlation report")
}

/// Paired (score, outcome) points of one breakdown, for plotting
pub fn breakdown_points(
    df: &DataFrame,
    breakdown: &Breakdown,
    config: &SummaryConfig,
    variable: &str,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let rows = breakdown_rows(df, breakdown, &config.crop_column)?;
    paired_values(&rows, &config.score_column, variable)
}
