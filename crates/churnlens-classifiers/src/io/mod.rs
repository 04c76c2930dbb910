//! IO utilities for customer tables and the reference dataset.

pub mod customers;
pub mod reference_data;

pub use customers::{predict_customers, read_customers_csv, write_predictions_csv, CustomerRow};
pub use reference_data::{
    read_reference_csv, read_reference_csv_with_config, ChurnCounts, ReferenceDataset,
    ReferenceReaderConfig,
};
