//! Assembly of encoded, numeric, derived and defaulted fields into the
//! record the classifier consumes.
use std::collections::HashMap;

use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::ChurnError;
use crate::features::derived::total_charges;
use crate::features::encoder::encode_categorical;
use crate::features::raw_input::RawInput;
use crate::features::schema::{
    CategoricalField, FeatureSchema, HARD_DEFAULTS, MONTHLY_CHARGES, TENURE, TOTAL_CHARGES,
};

/// A single assembled record, ordered like the schema it was built for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedFeatureVector {
    columns: Vec<String>,
    values: Vec<f32>,
}

impl EncodedFeatureVector {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f32> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .zip(self.values.iter().copied())
    }

    /// The record as a one-row feature matrix.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((1, self.values.len()), |(_, col)| self.values[col])
    }
}

impl FeatureSchema {
    /// Turn one raw input into a record with exactly this schema's columns.
    pub fn assemble(&self, input: &RawInput) -> Result<EncodedFeatureVector, ChurnError> {
        input.validate_numeric()?;

        let mut produced: HashMap<&str, f32> = HashMap::with_capacity(self.len());
        produced.insert(TENURE, input.tenure as f32);
        produced.insert(MONTHLY_CHARGES, input.monthly_charges);
        produced.insert(
            TOTAL_CHARGES,
            total_charges(input.tenure, input.monthly_charges),
        );

        for field in CategoricalField::ALL {
            for (column, value) in encode_categorical(field, input.categorical(field))? {
                produced.insert(column, value);
            }
        }

        for (column, value) in HARD_DEFAULTS {
            produced.insert(*column, *value);
        }

        let missing: Vec<String> = self
            .columns()
            .iter()
            .filter(|c| !produced.contains_key(c.as_str()))
            .cloned()
            .collect();
        let mut unexpected: Vec<String> = produced
            .keys()
            .filter(|name| self.index_of(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            unexpected.sort_unstable();
            return Err(ChurnError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        let values = self.columns().iter().map(|c| produced[c.as_str()]).collect();

        Ok(EncodedFeatureVector {
            columns: self.columns().to_vec(),
            values,
        })
    }

    /// Assemble many independent inputs into a feature matrix, one row each.
    pub fn assemble_matrix(&self, inputs: &[RawInput]) -> Result<Array2<f32>, ChurnError> {
        let rows: Vec<EncodedFeatureVector> = inputs
            .par_iter()
            .map(|input| self.assemble(input))
            .collect::<Result<_, _>>()?;

        let data: Vec<f32> = rows.into_iter().flat_map(|row| row.values).collect();
        Array2::from_shape_vec((inputs.len(), self.len()), data)
            .map_err(|e| ChurnError::inference(format!("Failed to build feature matrix: {}", e)))
    }
}
