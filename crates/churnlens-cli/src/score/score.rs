//! Batch scoring of a customer table.
use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use churnlens_classifiers::config::{ModelConfig, ModelType};
use churnlens_classifiers::io::{predict_customers, read_customers_csv, write_predictions_csv};
use churnlens_classifiers::ChurnPredictor;

use crate::util::validate_csv_file;

/// Parameters for scoring a customer table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    pub version: String,
    pub model: ModelConfig,
    pub customers_file: String,
    /// Destination CSV. Written to stdout when unset.
    pub output_file: Option<String>,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            version: clap::crate_version!().to_string(),
            model: ModelConfig::default(),
            customers_file: String::new(),
            output_file: None,
        }
    }
}

/// Counts of scored and rejected customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub scored: usize,
    pub failed: usize,
}

impl ScoreConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let config_json = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        let mut config = ScoreConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field), config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field), config.$field
                    );
                }
            };
        }

        load_or_default!(model);
        load_or_default!(customers_file);
        load_or_default!(output_file);

        // Apply CLI overrides
        if let Some(customers_file) = matches.get_one::<String>("customers") {
            config.customers_file = customers_file.clone();
        }
        validate_csv_file(&config.customers_file)?;
        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = Some(output_file.clone());
        }
        if let Some(model_path) = matches.get_one::<PathBuf>("model_path") {
            config.model.artifact_path = model_path.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.model.model_type =
                model_type.parse::<ModelType>().map_err(anyhow::Error::msg)?;
        }

        Ok(config)
    }
}

/// Score every customer in `config.customers_file`.
///
/// Rows that fail to parse, encode or predict are kept in the output with their
/// error message; they do not abort the run.
pub fn run_scoring(config: &ScoreConfig) -> Result<ScoreSummary> {
    let predictor = ChurnPredictor::from_config(&config.model).with_context(|| {
        format!(
            "Failed to load model from {}",
            config.model.artifact_path.display()
        )
    })?;
    let customers = read_customers_csv(&config.customers_file)?;
    let results = predict_customers(&predictor, &customers);

    match &config.output_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            write_predictions_csv(file, &customers, &results)?;
            log::info!("Predictions written to {}", path);
        }
        None => write_predictions_csv(io::stdout().lock(), &customers, &results)?,
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("{} of {} customers could not be scored", failed, results.len());
    }
    Ok(ScoreSummary {
        scored: results.len() - failed,
        failed,
    })
}
