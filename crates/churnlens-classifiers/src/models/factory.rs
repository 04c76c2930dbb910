use crate::config::{ModelConfig, ModelType};
use crate::error::ChurnError;
use crate::models::classifier_trait::ChurnClassifier;

/// Load a boxed classifier from a `ModelConfig`.
///
/// This runs once at process start; the returned model is read-only from
/// then on.
pub fn load_model(params: &ModelConfig) -> Result<Box<dyn ChurnClassifier>, ChurnError> {
    if !(params.decision_threshold > 0.0 && params.decision_threshold < 1.0) {
        return Err(ChurnError::InvalidNumeric {
            field: "decision_threshold".to_string(),
            reason: format!("{} is outside (0, 1)", params.decision_threshold),
        });
    }

    let model: Box<dyn ChurnClassifier> = match params.model_type {
        ModelType::Gbdt | ModelType::XgboostDump { .. } => {
            Box::new(crate::models::gbdt::GBDTClassifier::load(params)?)
        }
        ModelType::Logistic => Box::new(crate::models::logistic::LogisticClassifier::load(params)?),
    };

    log::info!(
        "Loaded {} model from {}",
        model.name(),
        params.artifact_path.display()
    );
    Ok(model)
}
