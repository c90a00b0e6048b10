//! Soil-Survey Subsample
//!
//! Uniform random subsample of a STAR soil survey export. The export repeats
//! its header as the first data row, so that row is skipped before drawing.
//! Practice columns (tillage timing, cover-crop species mix) are addressed by
//! name and checked before sampling.

use crate::config::SoilConfig;
use crate::utils::{materialize_with_columns, require_columns};
use anyhow::{Context, Result};
use polars::prelude::*;
use rand::seq::index;
use rand::Rng;

pub struct SoilSubsample {
    config: SoilConfig,
}

impl SoilSubsample {
    pub fn new(config: SoilConfig) -> Self {
        Self { config }
    }

    /// Draw `min(sample_size, rows)` distinct rows
    pub fn run<R: Rng + ?Sized>(&self, survey: &DataFrame, rng: &mut R) -> Result<DataFrame> {
        require_columns(survey, &self.config.columns, "soil survey")?;

        let skip = self.config.skip_leading_rows.min(survey.height());
        let body = survey.slice(skip as i64, survey.height() - skip);

        let take = self.config.sample_size.min(body.height());
        if take < self.config.sample_size {
            tracing::warn!(
                "Survey has {} rows after skipping {}; sampling all of them instead of {}",
                body.height(),
                skip,
                self.config.sample_size
            );
        }

        let picks: Vec<IdxSize> = index::sample(rng, body.height(), take)
            .into_vec()
            .into_iter()
            .map(|i| i as IdxSize)
            .collect();
        let sample = body
            .take(&IdxCa::from_vec("row".into(), picks))
            .with_context(|| "Failed to gather subsampled rows")?;

        tracing::info!("Soil subsample: {} of {} rows", sample.height(), body.height());

        if self.config.project_columns {
            return materialize_with_columns(&sample.lazy(), &self.config.columns, "soil subsample");
        }

        Ok(sample)
    }
}
