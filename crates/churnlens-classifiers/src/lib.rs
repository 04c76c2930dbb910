//! churnlens-classifiers: churn prediction from raw customer attributes.
//!
//! This crate encodes raw customer attributes into the fixed feature schema a
//! pre-trained classifier was fitted on, loads that classifier (GBDT, XGBoost
//! tree dumps or logistic coefficients) and runs inference. Reference data
//! loading, density estimation and HTML reporting support the descriptive
//! side of the dashboard.
//!
//! The pipeline is stateless per request: a [`predictor::ChurnPredictor`]
//! holds the loaded model read-only and builds a fresh feature record for
//! every call.
pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod models;
pub mod predictor;
pub mod report;
pub mod stats;

pub use error::ChurnError;
pub use predictor::{ChurnLabel, ChurnPredictor, PredictionResult};
