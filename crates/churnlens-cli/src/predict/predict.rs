use anyhow::{Context, Result};
use serde::Serialize;

use churnlens_classifiers::features::{EncodedFeatureVector, RawInput};
use churnlens_classifiers::io::read_reference_csv;
use churnlens_classifiers::{ChurnLabel, ChurnPredictor};

use crate::predict::input::PredictConfig;
use crate::predict::output::write_predict_report;

/// Everything produced for a single customer.
#[derive(Debug, Clone, Serialize)]
pub struct PredictOutcome {
    pub label: ChurnLabel,
    pub message: &'static str,
    pub churn_probability: Option<f32>,
    pub customer: RawInput,
    pub features: EncodedFeatureVector,
}

pub fn predict_customer(predictor: &ChurnPredictor, customer: &RawInput) -> Result<PredictOutcome> {
    let features = predictor
        .encode(customer)
        .context("Failed to encode customer attributes")?;
    let result = predictor
        .predict_record(&features)
        .context("Model inference failed")?;

    Ok(PredictOutcome {
        label: result.label,
        message: result.label.message(),
        churn_probability: result.churn_probability,
        customer: customer.clone(),
        features,
    })
}

pub fn run_prediction(params: &PredictConfig) -> Result<PredictOutcome> {
    let predictor = ChurnPredictor::from_config(&params.model).with_context(|| {
        format!(
            "Failed to load model from {}",
            params.model.artifact_path.display()
        )
    })?;

    let outcome = predict_customer(&predictor, &params.customer)?;
    log::info!("{}", outcome.message);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if params.generate_report {
        let reference = match &params.reference_data {
            Some(path) => Some(read_reference_csv(path)?),
            None => None,
        };
        write_predict_report(params, &predictor, &outcome, reference.as_ref())?;
    }

    Ok(outcome)
}
