//! Single-request prediction pipeline: encode, assemble, infer.
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::ChurnError;
use crate::features::{EncodedFeatureVector, FeatureSchema, RawInput};
use crate::models::{load_model, ChurnClassifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnLabel {
    NoChurn,
    Churn,
}

impl ChurnLabel {
    pub fn is_churn(&self) -> bool {
        matches!(self, ChurnLabel::Churn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnLabel::NoChurn => "no_churn",
            ChurnLabel::Churn => "churn",
        }
    }

    /// Sentence shown to the user for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            ChurnLabel::NoChurn => "Customer is not likely to churn",
            ChurnLabel::Churn => "Customer is likely to churn",
        }
    }
}

impl fmt::Display for ChurnLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: ChurnLabel,
    /// Probability of the churn class, when the model provides one.
    pub churn_probability: Option<f32>,
}

/// A loaded model together with the schema used to feed it.
///
/// The model is shared read-only; every call builds its own feature record
/// and result.
#[derive(Clone)]
pub struct ChurnPredictor {
    model: Arc<dyn ChurnClassifier>,
    schema: FeatureSchema,
}

impl ChurnPredictor {
    /// Pair a model with a schema.
    ///
    /// When the model declares its own column names those win over `schema`
    /// for ordering, but the column set must still match.
    pub fn new(model: Arc<dyn ChurnClassifier>, schema: FeatureSchema) -> Result<Self, ChurnError> {
        let schema = match model.feature_names() {
            Some(names) if names != schema.columns() => {
                log::debug!(
                    "Using the column order declared by the {} model",
                    model.name()
                );
                FeatureSchema::from_columns(names.to_vec())?
            }
            _ => schema,
        };
        Ok(Self { model, schema })
    }

    /// Load the configured artifact and build a predictor around it.
    pub fn from_config(params: &ModelConfig) -> Result<Self, ChurnError> {
        let schema = match &params.feature_columns {
            Some(columns) => FeatureSchema::from_columns(columns.clone())?,
            None => FeatureSchema::canonical(),
        };
        let model = load_model(params)?;
        Self::new(Arc::from(model), schema)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &dyn ChurnClassifier {
        self.model.as_ref()
    }

    pub fn encode(&self, input: &RawInput) -> Result<EncodedFeatureVector, ChurnError> {
        self.schema.assemble(input)
    }

    pub fn predict(&self, input: &RawInput) -> Result<PredictionResult, ChurnError> {
        let record = self.encode(input)?;
        self.predict_record(&record)
    }

    /// Run inference on an already assembled record.
    pub fn predict_record(
        &self,
        record: &EncodedFeatureVector,
    ) -> Result<PredictionResult, ChurnError> {
        let x = if record.columns() == self.schema.columns() {
            record.to_array()
        } else {
            self.reorder(record)?
        };
        let labels = self.model.predict(&x).map_err(as_inference_error)?;
        let label = match labels.as_slice() {
            [label] => *label,
            other => {
                return Err(ChurnError::inference(format!(
                    "{} returned {} labels for one record",
                    self.model.name(),
                    other.len()
                )))
            }
        };

        let churn_probability = match self.model.predict_proba(&x).map_err(as_inference_error)? {
            None => None,
            Some(probs) => match probs.as_slice() {
                [p] if (0.0..=1.0).contains(p) => Some(*p),
                other => {
                    return Err(ChurnError::inference(format!(
                        "{} returned an invalid probability output {:?}",
                        self.model.name(),
                        other
                    )))
                }
            },
        };

        log::debug!(
            "Predicted {} (p={:?}) with {}",
            label,
            churn_probability,
            self.model.name()
        );

        Ok(PredictionResult {
            label,
            churn_probability,
        })
    }

    /// Lay out a record built for another column order in this schema's order.
    fn reorder(&self, record: &EncodedFeatureVector) -> Result<Array2<f32>, ChurnError> {
        let mut values = Vec::with_capacity(self.schema.len());
        let mut missing = Vec::new();
        for column in self.schema.columns() {
            match record.get(column) {
                Some(value) => values.push(value),
                None => missing.push(column.clone()),
            }
        }
        let unexpected: Vec<String> = record
            .columns()
            .iter()
            .filter(|c| self.schema.index_of(c).is_none())
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ChurnError::SchemaMismatch {
                missing,
                unexpected,
            });
        }
        Ok(Array2::from_shape_fn((1, values.len()), |(_, col)| values[col]))
    }

    /// Predict many independent requests. A failure only affects its own
    /// entry.
    pub fn predict_batch(&self, inputs: &[RawInput]) -> Vec<Result<PredictionResult, ChurnError>> {
        inputs.par_iter().map(|input| self.predict(input)).collect()
    }
}

/// Anything a model reports while running counts as an inference failure.
fn as_inference_error(err: ChurnError) -> ChurnError {
    match err {
        ChurnError::InferenceError(_) => err,
        other => ChurnError::inference(other.to_string()),
    }
}
