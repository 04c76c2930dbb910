//! Logistic-regression artifacts exported as plain JSON coefficients.
use std::fs;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::ChurnError;
use crate::models::classifier_trait::ChurnClassifier;
use crate::models::utils::{check_probabilities, check_width, labels_from_probabilities, sigmoid};
use crate::predictor::ChurnLabel;

/// On-disk layout of a logistic model.
///
/// ```json
/// {"feature_names": ["tenure", ...], "coefficients": [-0.03, ...], "intercept": 0.4}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticArtifact {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f32>,
    pub intercept: f32,
}

pub struct LogisticClassifier {
    artifact: LogisticArtifact,
    threshold: f32,
}

impl LogisticClassifier {
    pub fn new(artifact: LogisticArtifact, threshold: f32) -> Result<Self, String> {
        if artifact.feature_names.len() != artifact.coefficients.len() {
            return Err(format!(
                "{} feature names but {} coefficients",
                artifact.feature_names.len(),
                artifact.coefficients.len()
            ));
        }
        if artifact.coefficients.iter().any(|c| !c.is_finite()) || !artifact.intercept.is_finite() {
            return Err("coefficients must be finite".to_string());
        }
        Ok(Self {
            artifact,
            threshold,
        })
    }

    pub fn load(params: &ModelConfig) -> Result<Self, ChurnError> {
        let path = &params.artifact_path;
        let content = fs::read_to_string(path)
            .map_err(|e| ChurnError::model_unavailable(path.display(), e))?;
        let artifact: LogisticArtifact = serde_json::from_str(&content)
            .map_err(|e| ChurnError::model_unavailable(path.display(), e))?;
        Self::new(artifact, params.decision_threshold)
            .map_err(|e| ChurnError::model_unavailable(path.display(), e))
    }

    pub fn artifact(&self) -> &LogisticArtifact {
        &self.artifact
    }

    fn probabilities(&self, x: &Array2<f32>) -> Result<Vec<f32>, ChurnError> {
        check_width(x, self.artifact.coefficients.len())?;
        let probs: Vec<f32> = x
            .rows()
            .into_iter()
            .map(|row| {
                let margin = row
                    .iter()
                    .zip(self.artifact.coefficients.iter())
                    .map(|(v, w)| v * w)
                    .sum::<f32>()
                    + self.artifact.intercept;
                sigmoid(margin)
            })
            .collect();
        check_probabilities(&probs, x.nrows())?;
        Ok(probs)
    }
}

impl ChurnClassifier for LogisticClassifier {
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<ChurnLabel>, ChurnError> {
        let probs = self.probabilities(x)?;
        Ok(labels_from_probabilities(&probs, self.threshold))
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Option<Vec<f32>>, ChurnError> {
        self.probabilities(x).map(Some)
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.artifact.feature_names)
    }

    fn feature_importances(&self) -> Option<Vec<f32>> {
        Some(self.artifact.coefficients.iter().map(|c| c.abs()).collect())
    }

    fn name(&self) -> &str {
        "logistic"
    }
}
