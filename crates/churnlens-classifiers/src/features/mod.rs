//! Turning raw customer attributes into the classifier's feature record.
//!
//! `schema` holds the declarative tables, `encoder` and `derived` compute
//! individual fields and `assembler` merges everything in schema order.
pub mod assembler;
pub mod derived;
pub mod encoder;
pub mod raw_input;
pub mod schema;

pub use assembler::EncodedFeatureVector;
pub use encoder::encode_categorical;
pub use raw_input::RawInput;
pub use schema::{CategoricalField, FeatureSchema};
