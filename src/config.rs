//! Run configuration
//!
//! Column names are configuration, not protocol: every script reads the
//! columns it needs from these structs. Defaults reproduce the producer
//! field export and the STAR outcomes table the team works with, so an
//! empty JSON object (`{}`) is a valid configuration file.

use crate::errors::StarError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::sampler::DEFAULT_EXTRA_COUNT;

pub const DEFAULT_SEED: u64 = 42;

/// Load any configuration struct from a JSON file
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {:?}", path))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse configuration JSON: {:?}", path))
}

fn require_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StarError::Configuration(format!("'{}' must not be empty", field)).into());
    }
    Ok(())
}

/// Column names in the field-forms sheet
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FormColumns {
    pub year: String,
    pub form_category: String,
    /// Null means the form is still in progress
    pub submitted_at: String,
}

impl Default for FormColumns {
    fn default() -> Self {
        Self {
            year: "Year".to_string(),
            form_category: "Form Name".to_string(),
            submitted_at: "Submitted At".to_string(),
        }
    }
}

/// Field-form sampling settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FormSamplingConfig {
    pub columns: FormColumns,
    pub extra_count: usize,
    pub seed: u64,
    /// Shared identifier for the producer-details join (join skipped if unset)
    pub producer_id_column: Option<String>,
}

impl Default for FormSamplingConfig {
    fn default() -> Self {
        Self {
            columns: FormColumns::default(),
            extra_count: DEFAULT_EXTRA_COUNT,
            seed: DEFAULT_SEED,
            producer_id_column: None,
        }
    }
}

impl FormSamplingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("columns.year", &self.columns.year)?;
        require_name("columns.form_category", &self.columns.form_category)?;
        require_name("columns.submitted_at", &self.columns.submitted_at)?;
        if let Some(id) = &self.producer_id_column {
            require_name("producer_id_column", id)?;
        }
        Ok(())
    }
}

/// Named row filter over the outcomes table
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Breakdown {
    pub name: String,
    /// Crop-type code to keep; `None` keeps every field
    #[serde(default)]
    pub crop_code: Option<String>,
}

impl Breakdown {
    pub fn all(name: &str) -> Self {
        Self { name: name.to_string(), crop_code: None }
    }

    pub fn crop(name: &str, code: &str) -> Self {
        Self { name: name.to_string(), crop_code: Some(code.to_string()) }
    }
}

/// STAR summary / correlation / plot settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SummaryConfig {
    pub score_column: String,
    pub crop_column: String,
    /// Outcome columns summarised and correlated against the score
    pub value_columns: Vec<String>,
    pub breakdowns: Vec<Breakdown>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            score_column: "star_score".to_string(),
            crop_column: "crop_type".to_string(),
            value_columns: [
                "CC_nlrs3_nitrate_EQ5",
                "CC_nlrs3_phosphorus_EQ6",
                "CC_nlrs4_sediment_EQ9",
                "CC_nrls4_CO2e",
                "RT_nrls5_phosphorus_EQ6",
                "RT_nrls5_sediment_EQ10",
                "RT_nrls5_CO2e",
                "MRTN_nlrs1_nitrate_EQ8",
                "PRATE_nlrs07_phosphorus_EQ7",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            breakdowns: vec![
                Breakdown::all("all_fields"),
                Breakdown::crop("corn_fields", "C"),
                Breakdown::crop("soybean_fields", "SB"),
            ],
        }
    }
}

impl SummaryConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        require_name("score_column", &self.score_column)?;
        require_name("crop_column", &self.crop_column)?;
        if self.value_columns.is_empty() {
            return Err(StarError::Configuration("value_columns must not be empty".into()).into());
        }
        for column in &self.value_columns {
            require_name("value_columns[]", column)?;
        }
        if self.breakdowns.is_empty() {
            return Err(StarError::Configuration("breakdowns must not be empty".into()).into());
        }
        for breakdown in &self.breakdowns {
            require_name("breakdowns[].name", &breakdown.name)?;
        }
        Ok(())
    }
}

/// Soil-survey subsample settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SoilConfig {
    pub sample_size: usize,
    /// Data rows dropped before sampling (the survey export repeats its header)
    pub skip_leading_rows: usize,
    /// Named columns the survey must carry (tillage / cover-crop practice fields)
    pub columns: Vec<String>,
    /// Keep only `columns` in the output instead of the full row
    pub project_columns: bool,
    pub seed: u64,
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            sample_size: 50,
            skip_leading_rows: 1,
            columns: Vec::new(),
            project_columns: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl SoilConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for column in &self.columns {
            require_name("columns[]", column)?;
        }
        if self.project_columns && self.columns.is_empty() {
            return Err(StarError::Configuration(
                "project_columns requires a non-empty columns list".into(),
            )
            .into());
        }
        Ok(())
    }
}
