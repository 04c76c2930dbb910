use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Central configuration for loading a pre-trained churn model.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the serialized model artifact.
    pub artifact_path: PathBuf,

    /// Probability at or above which a customer is labelled as churning.
    pub decision_threshold: f32,

    /// Column order the artifact was trained with. Defaults to the canonical
    /// schema when omitted. Logistic artifacts carry their own names.
    pub feature_columns: Option<Vec<String>>,

    pub model_type: ModelType,
}

/// Supported artifact formats.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// A `gbdt` model written with `GBDT::save_model`.
    #[default]
    Gbdt,
    /// An XGBoost model in the layout `gbdt`'s `convert_xgboost.py` produces:
    /// the base score on the first line, then the JSON tree array taken from
    /// `Booster.dump_model(..., dump_format="json")`. A raw `dump_model`
    /// output has no base score line and does not load.
    ///
    /// `objective` picks the output transform and must yield probabilities
    /// (`binary:logistic` or `reg:logistic`). `binary:logitraw` returns raw
    /// margins and is rejected when the model is loaded.
    XgboostDump { objective: String },
    /// Logistic-regression coefficients stored as JSON.
    Logistic,
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::Gbdt),
            "xgboost" | "xgboost_dump" | "xgboost-dump" => Ok(ModelType::XgboostDump {
                objective: "binary:logistic".to_string(),
            }),
            "logistic" => Ok(ModelType::Logistic),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of gbdt, xgboost, logistic",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new<P: Into<PathBuf>>(artifact_path: P, model_type: ModelType) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            model_type,
            ..Default::default()
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("churn_model.json"),
            decision_threshold: 0.5,
            feature_columns: None,
            model_type: ModelType::Gbdt,
        }
    }
}
