use std::sync::Arc;

use churnlens_classifiers::config::{ModelConfig, ModelType};
use churnlens_classifiers::features::schema::CANONICAL_COLUMNS;
use churnlens_classifiers::features::{FeatureSchema, RawInput};
use churnlens_classifiers::models::load_model;
use churnlens_classifiers::models::logistic::LogisticArtifact;
use churnlens_classifiers::{ChurnError, ChurnLabel, ChurnPredictor};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;

fn canonical_names() -> Vec<String> {
    CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Churn odds fall with tenure and nothing else matters.
fn write_logistic_artifact(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let mut coefficients = vec![0.0f32; CANONICAL_COLUMNS.len()];
    coefficients[0] = -0.1;
    let artifact = LogisticArtifact {
        feature_names: canonical_names(),
        coefficients,
        intercept: 0.5,
    };
    let path = dir.path().join("churn_model.json");
    std::fs::write(&path, serde_json::to_string(&artifact).unwrap()).unwrap();
    path
}

fn worked_example() -> RawInput {
    RawInput {
        customer_id: None,
        gender: "Male".to_string(),
        senior_citizen: "No".to_string(),
        partner: "No".to_string(),
        dependents: "No".to_string(),
        paperless_billing: "No".to_string(),
        internet_service: "DSL".to_string(),
        contract: "Month-to-month".to_string(),
        payment_method: "Mailed check".to_string(),
        tenure: 12,
        monthly_charges: 70.0,
    }
}

#[test]
fn logistic_artifact_through_factory() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_logistic_artifact(&dir);
    let params = ModelConfig::new(&path, ModelType::Logistic);

    let predictor = ChurnPredictor::from_config(&params).unwrap();
    assert_eq!(predictor.model().name(), "logistic");

    let record = predictor.encode(&worked_example()).unwrap();
    assert_eq!(
        record.values(),
        &[12.0, 70.0, 840.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    );

    // margin = -1.2 + 0.5
    let result = predictor.predict(&worked_example()).unwrap();
    assert_eq!(result.label, ChurnLabel::NoChurn);
    let p = result.churn_probability.unwrap();
    assert!((p - 0.3318).abs() < 1e-3, "p = {}", p);

    let mut newcomer = worked_example();
    newcomer.tenure = 1;
    let result = predictor.predict(&newcomer).unwrap();
    assert_eq!(result.label, ChurnLabel::Churn);
}

#[test]
fn identical_inputs_give_identical_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_logistic_artifact(&dir);
    let predictor = ChurnPredictor::from_config(&ModelConfig::new(&path, ModelType::Logistic)).unwrap();

    let first = predictor.predict(&worked_example()).unwrap();
    for _ in 0..5 {
        assert_eq!(predictor.predict(&worked_example()).unwrap(), first);
    }

    let batch = predictor.predict_batch(&vec![worked_example(); 16]);
    assert!(batch.into_iter().all(|r| r.unwrap() == first));
}

#[test]
fn out_of_domain_value_is_rejected_before_inference() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_logistic_artifact(&dir);
    let predictor = ChurnPredictor::from_config(&ModelConfig::new(&path, ModelType::Logistic)).unwrap();

    let mut input = worked_example();
    input.internet_service = "Satellite".to_string();
    match predictor.predict(&input) {
        Err(ChurnError::InvalidCategory { field, value }) => {
            assert_eq!(field, "InternetService");
            assert_eq!(value, "Satellite");
        }
        other => panic!("expected InvalidCategory, got {:?}", other),
    }
}

fn train_tenure_model() -> GBDT {
    let mut config = Config::new();
    config.set_feature_size(CANONICAL_COLUMNS.len());
    config.set_shrinkage(0.1);
    config.set_max_depth(3);
    config.set_iterations(30);
    config.set_debug(false);
    config.set_loss("LogLikelyhood");

    let schema = FeatureSchema::canonical();
    let mut train_x = DataVec::new();
    for tenure in [1u32, 2, 3, 4, 40, 50, 60, 70] {
        for _ in 0..5 {
            let mut input = RawInput::default();
            input.tenure = tenure;
            let record = schema.assemble(&input).unwrap();
            let label = if tenure < 10 { 1.0 } else { -1.0 };
            train_x.push(Data::new_training_data(record.values().to_vec(), 1.0, label, None));
        }
    }

    let mut gbdt = GBDT::new(&config);
    gbdt.fit(&mut train_x);
    gbdt
}

#[test]
fn saved_gbdt_model_loads_and_predicts() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("churn_model.gbdt");
    train_tenure_model()
        .save_model(path.to_str().unwrap())
        .unwrap();

    let model = load_model(&ModelConfig::new(&path, ModelType::Gbdt)).unwrap();
    let predictor = ChurnPredictor::new(Arc::from(model), FeatureSchema::canonical()).unwrap();

    let mut short = RawInput::default();
    short.tenure = 2;
    let mut long = RawInput::default();
    long.tenure = 60;

    let p_short = predictor.predict(&short).unwrap().churn_probability.unwrap();
    let p_long = predictor.predict(&long).unwrap().churn_probability.unwrap();
    assert!(p_short > p_long, "{} <= {}", p_short, p_long);
    assert!((0.0..=1.0).contains(&p_short));
}

#[test]
fn missing_artifact_is_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    for model_type in [ModelType::Gbdt, ModelType::Logistic] {
        let params = ModelConfig::new(dir.path().join("absent.json"), model_type);
        assert!(matches!(
            load_model(&params),
            Err(ChurnError::ModelUnavailable { .. })
        ));
    }
}

#[test]
fn corrupt_artifact_is_model_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("churn_model.json");
    std::fs::write(&path, "{ not a model").unwrap();
    for model_type in [ModelType::Gbdt, ModelType::Logistic] {
        let params = ModelConfig::new(&path, model_type);
        assert!(matches!(
            load_model(&params),
            Err(ChurnError::ModelUnavailable { .. })
        ));
    }
}

#[test]
fn threshold_outside_unit_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut params = ModelConfig::new(write_logistic_artifact(&dir), ModelType::Logistic);
    params.decision_threshold = 1.5;
    assert!(matches!(
        load_model(&params),
        Err(ChurnError::InvalidNumeric { .. })
    ));
}

#[test]
fn drifted_feature_columns_are_a_schema_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let mut params = ModelConfig::new(write_logistic_artifact(&dir), ModelType::Logistic);
    let mut columns = canonical_names();
    columns.retain(|c| c != "PhoneService");
    columns.push("OnlineSecurity_Yes".to_string());
    params.feature_columns = Some(columns);

    match ChurnPredictor::from_config(&params) {
        Err(ChurnError::SchemaMismatch {
            missing,
            unexpected,
        }) => {
            assert!(missing.contains(&"PhoneService".to_string()));
            assert!(unexpected.contains(&"OnlineSecurity_Yes".to_string()));
        }
        Err(other) => panic!("expected SchemaMismatch, got {:?}", other),
        Ok(_) => panic!("expected SchemaMismatch"),
    }
}

/// One tree on tenure: short tenures land on the +1.5 leaf.
fn write_xgboost_dump(dir: &tempfile::TempDir, split: &str) -> std::path::PathBuf {
    let dump = format!(
        "0.0\n[{{\"nodeid\":0,\"depth\":0,\"split\":{},\"split_condition\":6.0,\
         \"yes\":1,\"no\":2,\"missing\":1,\"children\":[\
         {{\"nodeid\":1,\"leaf\":1.5}},{{\"nodeid\":2,\"leaf\":-1.5}}]}}]\n",
        split
    );
    let path = dir.path().join("churn_model.dump");
    std::fs::write(&path, dump).unwrap();
    path
}

fn xgboost_params(path: &std::path::Path, objective: &str) -> ModelConfig {
    ModelConfig::new(
        path,
        ModelType::XgboostDump {
            objective: objective.to_string(),
        },
    )
}

#[test]
fn xgboost_dump_loads_and_predicts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_xgboost_dump(&dir, "\"f0\"");
    let predictor = ChurnPredictor::from_config(&xgboost_params(&path, "binary:logistic")).unwrap();
    assert_eq!(predictor.model().name(), "gbdt");

    let mut newcomer = worked_example();
    newcomer.tenure = 2;
    let result = predictor.predict(&newcomer).unwrap();
    assert_eq!(result.label, ChurnLabel::Churn);
    let p = result.churn_probability.unwrap();
    assert!((p - 0.8176).abs() < 1e-3, "p = {}", p);

    let mut loyal = worked_example();
    loyal.tenure = 40;
    let result = predictor.predict(&loyal).unwrap();
    assert_eq!(result.label, ChurnLabel::NoChurn);
    let p = result.churn_probability.unwrap();
    assert!((p - 0.1824).abs() < 1e-3, "p = {}", p);
}

#[test]
fn xgboost_dump_splitting_past_the_schema_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_xgboost_dump(&dir, "20");
    let err = load_model(&xgboost_params(&path, "binary:logistic")).err().unwrap();
    match err {
        ChurnError::ModelUnavailable { reason, .. } => {
            assert!(reason.contains("feature 20"), "reason = {}", reason)
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn margin_objective_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_xgboost_dump(&dir, "0");
    assert!(matches!(
        load_model(&xgboost_params(&path, "binary:logitraw")),
        Err(ChurnError::ModelUnavailable { .. })
    ));
}
