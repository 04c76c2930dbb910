use std::error::Error;
use std::fmt;

/// Failures of the encode -> assemble -> infer pipeline.
///
/// None of these are transient; callers surface them to the user instead of
/// retrying.
#[derive(Debug, Clone, PartialEq)]
pub enum ChurnError {
    /// A categorical value outside the field's declared domain.
    InvalidCategory { field: String, value: String },
    /// A numeric input outside its allowed range.
    InvalidNumeric { field: String, reason: String },
    /// The assembled record does not match the classifier's input schema.
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// The model artifact could not be loaded.
    ModelUnavailable { path: String, reason: String },
    /// Inference failed on a well-formed record.
    InferenceError(String),
    /// A row of a customer table could not be read into a customer.
    MalformedRow(String),
}

impl ChurnError {
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        ChurnError::InferenceError(msg.into())
    }

    pub fn model_unavailable<P: fmt::Display, R: fmt::Display>(path: P, reason: R) -> Self {
        ChurnError::ModelUnavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ChurnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChurnError::InvalidCategory { field, value } => {
                write!(f, "Invalid value '{}' for categorical field '{}'", value, field)
            }
            ChurnError::InvalidNumeric { field, reason } => {
                write!(f, "Invalid numeric field '{}': {}", field, reason)
            }
            ChurnError::SchemaMismatch { missing, unexpected } => {
                write!(f, "Feature record does not match the model schema")?;
                if !missing.is_empty() {
                    write!(f, "; missing: [{}]", missing.join(", "))?;
                }
                if !unexpected.is_empty() {
                    write!(f, "; unexpected: [{}]", unexpected.join(", "))?;
                }
                Ok(())
            }
            ChurnError::ModelUnavailable { path, reason } => {
                write!(f, "Model artifact '{}' could not be loaded: {}", path, reason)
            }
            ChurnError::InferenceError(msg) => write!(f, "Inference failed: {}", msg),
            ChurnError::MalformedRow(msg) => write!(f, "Malformed customer row: {}", msg),
        }
    }
}

impl Error for ChurnError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_lists_both_sides() {
        let err = ChurnError::SchemaMismatch {
            missing: vec!["PhoneService".to_string()],
            unexpected: vec!["StreamingTV".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing: [PhoneService]"));
        assert!(msg.contains("unexpected: [StreamingTV]"));
    }

    #[test]
    fn converts_into_anyhow() {
        let err: anyhow::Error = ChurnError::inference("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
