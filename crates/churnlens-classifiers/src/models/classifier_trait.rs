use ndarray::Array2;

use crate::error::ChurnError;
use crate::predictor::ChurnLabel;

/// Inference contract shared by every loaded churn model.
///
/// Implementations are immutable after loading, so one instance can serve
/// concurrent requests through an `Arc`.
pub trait ChurnClassifier: Send + Sync {
    /// Predict one label per row of `x`.
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<ChurnLabel>, ChurnError>;

    /// Probability of the churn class per row, for models that provide one.
    fn predict_proba(&self, _x: &Array2<f32>) -> Result<Option<Vec<f32>>, ChurnError> {
        Ok(None)
    }

    /// Column order the model was trained with, when the artifact records it.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Relative importance per input column, aligned with the schema order.
    fn feature_importances(&self) -> Option<Vec<f32>> {
        None
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
