use ndarray::Array2;

use crate::error::ChurnError;
use crate::predictor::ChurnLabel;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Reject feature matrices whose width differs from what the model expects.
pub fn check_width(x: &Array2<f32>, expected: usize) -> Result<(), ChurnError> {
    if x.ncols() != expected {
        return Err(ChurnError::inference(format!(
            "model expects {} features per row, got {}",
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

/// Ensure the model produced one probability in [0, 1] per row.
pub fn check_probabilities(probs: &[f32], rows: usize) -> Result<(), ChurnError> {
    if probs.len() != rows {
        return Err(ChurnError::inference(format!(
            "model returned {} outputs for {} rows",
            probs.len(),
            rows
        )));
    }
    if let Some(bad) = probs.iter().find(|p| !(0.0..=1.0).contains(*p)) {
        return Err(ChurnError::inference(format!(
            "model output {} is not a probability",
            bad
        )));
    }
    Ok(())
}

pub fn labels_from_probabilities(probs: &[f32], threshold: f32) -> Vec<ChurnLabel> {
    probs
        .iter()
        .map(|&p| {
            if p >= threshold {
                ChurnLabel::Churn
            } else {
                ChurnLabel::NoChurn
            }
        })
        .collect()
}
