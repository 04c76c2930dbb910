use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};

use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use ndarray::Array2;
use serde_json::{Map, Value};

use crate::config::{ModelConfig, ModelType};
use crate::error::ChurnError;
use crate::features::schema::CANONICAL_COLUMNS;
use crate::models::classifier_trait::ChurnClassifier;
use crate::models::utils::{check_probabilities, check_width, labels_from_probabilities};
use crate::predictor::ChurnLabel;

/// Dump objectives whose output `gbdt` maps through a sigmoid.
const PROBABILITY_OBJECTIVES: [&str; 2] = ["binary:logistic", "reg:logistic"];

/// Gradient Boosting Decision Tree (GBDT) classifier loaded from a trained artifact
pub struct GBDTClassifier {
    model: GBDT,
    feature_names: Vec<String>,
    threshold: f32,
}

impl GBDTClassifier {
    pub fn new(model: GBDT, feature_names: Vec<String>, threshold: f32) -> Self {
        GBDTClassifier {
            model,
            feature_names,
            threshold,
        }
    }

    /// Load either a native `gbdt` model or an XGBoost JSON dump.
    ///
    /// Every split in the artifact must read a column the model is fed;
    /// otherwise loading fails with `ModelUnavailable`.
    pub fn load(params: &ModelConfig) -> Result<Self, ChurnError> {
        let path = &params.artifact_path;
        if !path.is_file() {
            return Err(ChurnError::model_unavailable(path.display(), "file not found"));
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| ChurnError::model_unavailable(path.display(), e))?;

        let (model, trees) = match &params.model_type {
            ModelType::Gbdt => {
                let model = serde_json::from_str::<GBDT>(&contents)
                    .map_err(|e| ChurnError::model_unavailable(path.display(), e))?;
                (model, serde_json::from_str::<Value>(&contents).ok())
            }
            ModelType::XgboostDump { objective } => {
                if !PROBABILITY_OBJECTIVES.contains(&objective.as_str()) {
                    return Err(ChurnError::model_unavailable(
                        path.display(),
                        format!("objective '{}' does not produce probabilities", objective),
                    ));
                }
                let model = GBDT::from_xgboost_reader(contents.as_bytes(), objective)
                    .map_err(|e| ChurnError::model_unavailable(path.display(), e))?;
                // First line is the base score, the trees follow.
                let body: String = contents.lines().skip(1).collect();
                (model, serde_json::from_str::<Value>(&body).ok())
            }
            other => {
                return Err(ChurnError::model_unavailable(
                    path.display(),
                    format!("{:?} is not a tree ensemble", other),
                ))
            }
        };

        let feature_names = params
            .feature_columns
            .clone()
            .unwrap_or_else(|| CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect());

        if let Some(max_index) = trees.as_ref().and_then(max_split_feature) {
            if max_index >= feature_names.len() {
                return Err(ChurnError::model_unavailable(
                    path.display(),
                    format!(
                        "a tree splits on feature {} but the model is fed {} columns",
                        max_index,
                        feature_names.len()
                    ),
                ));
            }
        }

        Ok(Self::new(model, feature_names, params.decision_threshold))
    }

    fn to_data(x: &Array2<f32>) -> DataVec {
        x.rows()
            .into_iter()
            .map(|row| Data::new_test_data(row.to_vec(), None))
            .collect()
    }

    fn probabilities(&self, x: &Array2<f32>) -> Result<Vec<f32>, ChurnError> {
        check_width(x, self.feature_names.len())?;
        let test_x = Self::to_data(x);
        // gbdt asserts on malformed trees instead of returning an error.
        let predictions = catch_unwind(AssertUnwindSafe(|| self.model.predict(&test_x)))
            .map_err(|_| ChurnError::inference("gbdt model panicked during prediction"))?;
        check_probabilities(&predictions, x.nrows())?;
        Ok(predictions)
    }
}

impl ChurnClassifier for GBDTClassifier {
    fn predict(&self, x: &Array2<f32>) -> Result<Vec<ChurnLabel>, ChurnError> {
        let probs = self.probabilities(x)?;
        Ok(labels_from_probabilities(&probs, self.threshold))
    }

    fn predict_proba(&self, x: &Array2<f32>) -> Result<Option<Vec<f32>>, ChurnError> {
        self.probabilities(x).map(Some)
    }

    fn feature_names(&self) -> Option<&[String]> {
        Some(&self.feature_names)
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}

/// Largest feature index read by any split node, for both the serialized
/// `gbdt` layout and XGBoost dumps.
fn max_split_feature(node: &Value) -> Option<usize> {
    match node {
        Value::Array(items) => items.iter().filter_map(max_split_feature).max(),
        Value::Object(map) => map
            .values()
            .filter_map(max_split_feature)
            .chain(split_feature(map))
            .max(),
        _ => None,
    }
}

fn split_feature(map: &Map<String, Value>) -> Option<usize> {
    if let (Some(Value::Bool(false)), Some(index)) = (
        map.get("is_leaf"),
        map.get("feature_index").and_then(Value::as_u64),
    ) {
        return Some(index as usize);
    }
    if map.contains_key("leaf") {
        return None;
    }
    match map.get("split")? {
        Value::Number(n) => n.as_u64().map(|v| v as usize),
        // Named features such as `f12`.
        Value::String(name) => {
            let digits = name.trim_start_matches(|c: char| !c.is_ascii_digit());
            digits.parse().ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbdt::config::Config;

    fn train_toy_model() -> GBDT {
        let mut config = Config::new();
        config.set_feature_size(2);
        config.set_shrinkage(0.1);
        config.set_max_depth(3);
        config.set_iterations(20);
        config.set_debug(false);
        config.set_loss("LogLikelyhood");

        let mut train_x = DataVec::new();
        for i in 0..20 {
            let churned = i % 2 == 0;
            let feature = if churned { vec![1.0, 0.0] } else { vec![0.0, 1.0] };
            let label = if churned { 1.0 } else { -1.0 };
            train_x.push(Data::new_training_data(feature, 1.0, label, None));
        }

        let mut gbdt = GBDT::new(&config);
        gbdt.fit(&mut train_x);
        gbdt
    }

    #[test]
    fn test_gbdt_classifier() {
        let names = vec!["a".to_string(), "b".to_string()];
        let classifier = GBDTClassifier::new(train_toy_model(), names, 0.5);

        let x = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let probs = classifier.predict_proba(&x).unwrap().unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs[0] > probs[1]);

        let labels = classifier.predict(&x).unwrap();
        assert_eq!(labels, vec![ChurnLabel::Churn, ChurnLabel::NoChurn]);
    }

    #[test]
    fn wrong_width_is_rejected_before_inference() {
        let names = vec!["a".to_string(), "b".to_string()];
        let classifier = GBDTClassifier::new(train_toy_model(), names, 0.5);
        let x = Array2::<f32>::zeros((1, 3));
        assert!(matches!(
            classifier.predict(&x),
            Err(ChurnError::InferenceError(_))
        ));
    }

    #[test]
    fn split_features_are_found_in_both_layouts() {
        let dump: Value = serde_json::from_str(
            r#"[{"nodeid":0,"split":"f3","split_condition":0.5,"yes":1,"no":2,"missing":1,
                "children":[{"nodeid":1,"leaf":0.1},
                            {"nodeid":2,"split":7,"split_condition":1.0,"yes":3,"no":4,"missing":3,
                             "children":[{"nodeid":3,"leaf":0.2},{"nodeid":4,"leaf":0.3}]}]}]"#,
        )
        .unwrap();
        assert_eq!(max_split_feature(&dump), Some(7));

        let native: Value = serde_json::from_str(
            r#"{"trees":[{"tree":{"tree":[
                {"value":{"feature_index":0,"is_leaf":true}},
                {"value":{"feature_index":21,"is_leaf":false}}]}}]}"#,
        )
        .unwrap();
        assert_eq!(max_split_feature(&native), Some(21));

        let leaves: Value = serde_json::from_str(r#"[{"nodeid":0,"leaf":0.4}]"#).unwrap();
        assert_eq!(max_split_feature(&leaves), None);
    }

    #[test]
    fn saved_model_splitting_past_the_schema_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.gbdt");
        train_toy_model().save_model(path.to_str().unwrap()).unwrap();

        let mut params = ModelConfig::new(&path, ModelType::Gbdt);
        params.feature_columns = Some(vec!["a".to_string(), "b".to_string()]);
        assert!(GBDTClassifier::load(&params).is_ok());

        params.feature_columns = Some(Vec::new());
        assert!(matches!(
            GBDTClassifier::load(&params),
            Err(ChurnError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn missing_artifact_is_unavailable() {
        let params = ModelConfig::new("/nonexistent/churn_model.json", ModelType::Gbdt);
        assert!(matches!(
            GBDTClassifier::load(&params),
            Err(ChurnError::ModelUnavailable { .. })
        ));
    }
}
