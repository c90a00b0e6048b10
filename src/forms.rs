//! Field-Form Sampling Pipeline
//!
//! load → drop unsubmitted → partition by year → sample → concatenate → join
//!
//! Each year partition is sampled with its own RNG seeded from the configured
//! seed, so a year's sample does not depend on which other years are present
//! in the export.

use crate::config::FormSamplingConfig;
use crate::errors::StarError;
use crate::sampler::CoverageSampler;
use crate::utils::require_columns;
use anyhow::{Context, Result};
use polars::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// Per-year sampling counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearSummary {
    pub year: i64,
    pub submissions: usize,
    pub base: usize,
    pub coverage: usize,
    pub padding: usize,
}

impl YearSummary {
    pub fn selected(&self) -> usize {
        self.base + self.coverage + self.padding
    }
}

/// Sampled forms plus the bookkeeping printed at the end of a run
#[derive(Debug)]
pub struct FormSample {
    pub total_rows: usize,
    pub submitted_rows: usize,
    /// Submitted rows without a usable year (belong to no partition)
    pub rows_without_year: usize,
    pub years: Vec<YearSummary>,
    /// Selected rows, every input column kept, concatenated in year order
    pub sample: DataFrame,
}

#[derive(Debug)]
pub enum FormSampleOutcome {
    /// Nothing left after dropping in-progress forms
    NoSubmissions { total_rows: usize },
    /// Submitted forms exist but none of them carries a year
    NoDatedSubmissions { submitted_rows: usize, rows_without_year: usize },
    Sampled(FormSample),
}

/// Runs the coverage sampler over every year partition of a forms table
pub struct FormSampler {
    config: FormSamplingConfig,
    sampler: CoverageSampler,
}

impl FormSampler {
    pub fn new(config: FormSamplingConfig) -> Self {
        let sampler = CoverageSampler::new(config.extra_count);
        Self { config, sampler }
    }

    pub fn config(&self) -> &FormSamplingConfig {
        &self.config
    }

    pub fn run(&self, forms: &DataFrame) -> Result<FormSampleOutcome> {
        let cols = &self.config.columns;
        require_columns(
            forms,
            &[&cols.year, &cols.form_category, &cols.submitted_at],
            "field forms",
        )?;

        // STEP 1: Only submitted forms (in-progress rows have no timestamp)
        let mask = forms.column(&cols.submitted_at)?.is_not_null();
        let submitted = forms
            .filter(&mask)
            .with_context(|| format!("Failed to filter on '{}'", cols.submitted_at))?;
        tracing::info!("Filtered submitted forms: {} of {} rows", submitted.height(), forms.height());

        if submitted.height() == 0 {
            return Ok(FormSampleOutcome::NoSubmissions { total_rows: forms.height() });
        }

        // STEP 2: Partition row positions by year
        let years = parse_years(submitted.column(&cols.year)?, &cols.year)?;

        let mut partitions: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        let mut rows_without_year = 0;
        for (row, year) in years.into_iter().enumerate() {
            match year {
                Some(year) => partitions.entry(year).or_default().push(row),
                None => rows_without_year += 1,
            }
        }
        if rows_without_year > 0 {
            tracing::warn!("Skipping {} submitted rows without a year", rows_without_year);
        }
        if partitions.is_empty() {
            return Ok(FormSampleOutcome::NoDatedSubmissions {
                submitted_rows: submitted.height(),
                rows_without_year,
            });
        }

        let categories_col = submitted
            .column(&cols.form_category)?
            .cast(&DataType::String)
            .with_context(|| format!("Column '{}' cannot be read as text", cols.form_category))?;
        let categories = categories_col.str()?;

        // STEP 3: Sample each partition independently
        let mut selected: Vec<IdxSize> = Vec::new();
        let mut summaries = Vec::with_capacity(partitions.len());

        for (&year, rows) in &partitions {
            let keys: Vec<Option<&str>> = rows.iter().map(|&row| categories.get(row)).collect();

            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
            let picked = self.sampler.sample(&keys, &mut rng);

            tracing::info!(
                "Year {}: Total {} submissions, selecting {}.",
                year,
                rows.len(),
                picked.base.len()
            );

            let summary = YearSummary {
                year,
                submissions: rows.len(),
                base: picked.base.len(),
                coverage: picked.coverage.len(),
                padding: picked.padding.len(),
            };
            tracing::info!(
                "Year {}: Selected {} fields ({} for form coverage, {} extra).",
                year,
                summary.selected(),
                summary.coverage,
                summary.padding
            );

            selected.extend(picked.indices().map(|i| rows[i] as IdxSize));
            summaries.push(summary);
        }

        // STEP 4: Concatenate by taking every selected row once
        let idx = IdxCa::from_vec("row".into(), selected);
        let sample = submitted
            .take(&idx)
            .with_context(|| "Failed to gather sampled rows")?;

        Ok(FormSampleOutcome::Sampled(FormSample {
            total_rows: forms.height(),
            submitted_rows: submitted.height(),
            rows_without_year,
            years: summaries,
            sample,
        }))
    }
}

/// Whole-number years of a column; nulls stay `None`
///
/// Integer columns pass through, text must parse as an integer and floats
/// must have no fractional part. Anything else is `StarError::InvalidYear`.
fn parse_years(column: &Column, name: &str) -> Result<Vec<Option<i64>>> {
    let invalid = |value: String| StarError::InvalidYear { column: name.to_string(), value };

    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .map(|value| {
                value
                    .map(|text| text.trim().parse::<i64>().map_err(|_| invalid(text.to_string())))
                    .transpose()
                    .map_err(anyhow::Error::from)
            })
            .collect(),
        dtype if dtype.is_float() => {
            let floats = column.cast(&DataType::Float64)?;
            floats
                .f64()?
                .into_iter()
                .map(|value| match value {
                    Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
                    Some(v) => Err(anyhow::Error::from(invalid(v.to_string()))),
                    None => Ok(None),
                })
                .collect()
        }
        _ => {
            let ints = column
                .strict_cast(&DataType::Int64)
                .with_context(|| format!("Column '{}' is not an integer year", name))?;
            Ok(ints.i64()?.into_iter().collect())
        }
    }
}

/// Left-join producer details onto the sampled forms
///
/// Forms without a matching producer keep their row with null details.
pub fn join_producer_details(
    sample: &DataFrame,
    details: &DataFrame,
    id_column: &str,
) -> Result<DataFrame> {
    require_columns(sample, &[id_column], "sampled forms")?;
    require_columns(details, &[id_column], "producer details")?;

    sample
        .clone()
        .lazy()
        .join(
            details.clone().lazy(),
            [col(id_column)],
            [col(id_column)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()
        .with_context(|| format!("Failed to join producer details on '{}'", id_column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn forms() -> DataFrame {
        df![
            "Field ID" => &[1i64, 2, 3, 4, 5, 6, 7, 8],
            "Year" => &[2023i64, 2023, 2023, 2023, 2024, 2024, 2024, 2024],
            "Form Name" => &["Grasses", "Grasses", "Legumes", "Grains", "Grains", "Grains", "Grasses", "Legumes"],
            "Submitted At" => &[
                Some("2023-10-01"), Some("2023-10-02"), Some("2023-10-03"), None,
                Some("2024-09-01"), None, Some("2024-09-03"), Some("2024-09-04"),
            ],
        ].unwrap()
    }

    fn sampled(outcome: FormSampleOutcome) -> FormSample {
        match outcome {
            FormSampleOutcome::Sampled(sample) => sample,
            other => panic!("expected a sample, got {:?}", other),
        }
    }

    #[test]
    fn test_small_partitions_are_taken_whole() {
        let sample = sampled(FormSampler::new(FormSamplingConfig::default()).run(&forms()).unwrap());

        assert_eq!(sample.total_rows, 8);
        assert_eq!(sample.submitted_rows, 6);
        assert_eq!(sample.rows_without_year, 0);
        assert_eq!(sample.years.len(), 2);
        assert_eq!(sample.years[0].year, 2023);
        assert_eq!(sample.years[0].submissions, 3);
        assert_eq!(sample.years[0].base, 2);
        assert_eq!(sample.years[0].selected(), 3);

        // Every submitted form selected exactly once, none of the in-progress ones
        let ids: Vec<i64> = sample.sample.column("Field ID").unwrap().i64().unwrap()
            .into_no_null_iter().collect();
        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 6);
        assert_eq!(unique, [1, 2, 3, 5, 7, 8].into_iter().collect());

        // Partitions concatenated in year order
        let years: Vec<i64> = sample.sample.column("Year").unwrap().i64().unwrap()
            .into_no_null_iter().collect();
        assert_eq!(years, vec![2023, 2023, 2023, 2024, 2024, 2024]);
    }

    #[test]
    fn test_no_submissions() {
        let df = df![
            "Year" => &[2023i64, 2024],
            "Form Name" => &["Grasses", "Grains"],
            "Submitted At" => &[None::<&str>, None],
        ].unwrap();

        match FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap() {
            FormSampleOutcome::NoSubmissions { total_rows } => assert_eq!(total_rows, 2),
            other => panic!("expected NoSubmissions, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = df![
            "Year" => &[2023i64],
            "Form" => &["Grasses"],
            "Submitted At" => &["2023-10-01"],
        ].unwrap();

        let err = FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap_err();
        match err.downcast_ref::<StarError>() {
            Some(StarError::MissingColumn { column, .. }) => assert_eq!(column, "Form Name"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rows_without_year_are_skipped() {
        let df = df![
            "Year" => &[Some(2023i64), None, Some(2023)],
            "Form Name" => &["Grasses", "Grasses", "Legumes"],
            "Submitted At" => &["a", "b", "c"],
        ].unwrap();

        let sample = sampled(FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap());
        assert_eq!(sample.rows_without_year, 1);
        assert_eq!(sample.sample.height(), 2);
    }

    #[test]
    fn test_text_years_are_accepted() {
        let df = df![
            "Year" => &["2022", "2022", "2023"],
            "Form Name" => &["Grasses", "Legumes", "Grasses"],
            "Submitted At" => &["a", "b", "c"],
        ].unwrap();

        let sample = sampled(FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap());
        let years: Vec<i64> = sample.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2022, 2023]);
    }

    #[test]
    fn test_unparseable_text_year_is_an_error() {
        let df = df![
            "Year" => &["FY2023", "FY2023", "FY2024"],
            "Form Name" => &["Grasses", "Legumes", "Grasses"],
            "Submitted At" => &["a", "b", "c"],
        ].unwrap();

        let err = FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap_err();
        match err.downcast_ref::<StarError>() {
            Some(StarError::InvalidYear { column, value }) => {
                assert_eq!(column, "Year");
                assert_eq!(value, "FY2023");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fractional_year_is_an_error() {
        let df = df![
            "Year" => &[2023.0f64, 2023.7, 2024.2],
            "Form Name" => &["Grasses", "Legumes", "Grasses"],
            "Submitted At" => &["a", "b", "c"],
        ].unwrap();

        let err = FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StarError>(),
            Some(StarError::InvalidYear { value, .. }) if value == "2023.7"
        ));
    }

    #[test]
    fn test_whole_float_years_are_accepted() {
        let df = df![
            "Year" => &[Some(2023.0f64), None, Some(2024.0)],
            "Form Name" => &["Grasses", "Legumes", "Grasses"],
            "Submitted At" => &["a", "b", "c"],
        ].unwrap();

        let sample = sampled(FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap());
        let years: Vec<i64> = sample.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2023, 2024]);
        assert_eq!(sample.rows_without_year, 1);
    }

    #[test]
    fn test_submissions_without_any_year() {
        let df = df![
            "Year" => &[None::<i64>, None],
            "Form Name" => &["Grasses", "Legumes"],
            "Submitted At" => &["a", "b"],
        ].unwrap();

        match FormSampler::new(FormSamplingConfig::default()).run(&df).unwrap() {
            FormSampleOutcome::NoDatedSubmissions { submitted_rows, rows_without_year } => {
                assert_eq!(submitted_rows, 2);
                assert_eq!(rows_without_year, 2);
            }
            other => panic!("expected NoDatedSubmissions, got {:?}", other),
        }
    }

    #[test]
    fn test_join_producer_details() {
        let sample = df![
            "Producer ID" => &["p1", "p2", "p3"],
            "Form Name" => &["Grasses", "Legumes", "Grains"],
        ].unwrap();
        let details = df![
            "Producer ID" => &["p1", "p3"],
            "County" => &["McLean", "Peoria"],
        ].unwrap();

        let joined = join_producer_details(&sample, &details, "Producer ID").unwrap();
        assert_eq!(joined.height(), 3);
        assert_eq!(joined.column("County").unwrap().null_count(), 1);

        assert!(join_producer_details(&sample, &details, "Farm ID").is_err());
    }
}
