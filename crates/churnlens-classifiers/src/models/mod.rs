pub mod gbdt;
pub mod logistic;
pub mod utils;

pub mod classifier_trait;
pub mod factory;

pub use classifier_trait::ChurnClassifier;
pub use factory::load_model;
