use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use churnlens_classifiers::config::{ModelConfig, ModelType};
use churnlens_classifiers::features::{CategoricalField, RawInput};

use crate::util::{validate_csv_file, validate_json_file};

/// Command line flag for every categorical attribute of a customer.
pub const CATEGORICAL_FLAGS: [(CategoricalField, &str); 8] = [
    (CategoricalField::Gender, "gender"),
    (CategoricalField::SeniorCitizen, "senior-citizen"),
    (CategoricalField::Partner, "partner"),
    (CategoricalField::Dependents, "dependents"),
    (CategoricalField::PaperlessBilling, "paperless-billing"),
    (CategoricalField::InternetService, "internet-service"),
    (CategoricalField::Contract, "contract"),
    (CategoricalField::PaymentMethod, "payment-method"),
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PredictConfig {
    pub version: String,
    pub model: ModelConfig,
    /// Historical customers with known outcomes, used only for the report charts.
    pub reference_data: Option<String>,
    pub report_file: String,
    pub generate_report: bool,
    /// Upper bound on samples per group fed to the density plot.
    pub max_density_points: usize,
    pub customer: RawInput,
}

impl Default for PredictConfig {
    fn default() -> Self {
        PredictConfig {
            version: clap::crate_version!().to_string(),
            model: ModelConfig::default(),
            reference_data: None,
            report_file: String::from("churnlens_report.html"),
            generate_report: true,
            max_density_points: 5000,
            customer: RawInput::default(),
        }
    }
}

impl PredictConfig {
    pub fn from_arguments(config_path: &PathBuf, matches: &ArgMatches) -> Result<Self> {
        let config_json = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let partial: serde_json::Value = serde_json::from_str(&config_json)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        let mut config = PredictConfig::default();

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
        load_or_default!(reference_data);
        load_or_default!(report_file);
        load_or_default!(generate_report);
        load_or_default!(max_density_points);

        // A customer given in the file must be complete.
        match partial.get("customer") {
            Some(val) => {
                config.customer = serde_json::from_value(val.clone()).with_context(|| {
                    format!("Invalid 'customer' in config file: {:?}", config_path)
                })?;
            }
            None => log::warn!(
                "Config Missing field 'customer', using default: {:?}",
                config.customer
            ),
        }

        // Apply CLI overrides
        if let Some(model_path) = matches.get_one::<PathBuf>("model_path") {
            config.model.artifact_path = model_path.clone();
        }
        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.model.model_type = ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
        }
        if let Some(reference_data) = matches.get_one::<String>("reference_data") {
            config.reference_data = Some(reference_data.clone());
        }
        if let Some(reference_data) = &config.reference_data {
            validate_csv_file(reference_data)?;
        }
        if let Some(report_file) = matches.get_one::<String>("report_file") {
            config.report_file = report_file.clone();
        }
        if matches.get_flag("no_report") {
            config.generate_report = false;
        }

        config.customer = customer_from_arguments(config.customer, matches)?;

        Ok(config)
    }
}

/// Layer the customer given on the command line over `base`: a `--customer`
/// file replaces it entirely, individual attribute flags then override single
/// fields.
pub fn customer_from_arguments(base: RawInput, matches: &ArgMatches) -> Result<RawInput> {
    let mut customer = match matches.get_one::<String>("customer") {
        Some(path) => {
            validate_json_file(path)?;
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read customer file: {}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse customer file: {}", path))?
        }
        None => base,
    };

    for (field, flag) in CATEGORICAL_FLAGS {
        if let Some(value) = matches.get_one::<String>(flag) {
            customer.set_categorical(field, value.clone());
        }
    }
    if let Some(tenure) = matches.get_one::<u32>("tenure") {
        customer.tenure = *tenure;
    }
    if let Some(monthly_charges) = matches.get_one::<f32>("monthly_charges") {
        customer.monthly_charges = *monthly_charges;
    }

    Ok(customer)
}
