//! Batch customer tables: reading raw inputs and writing scored rows.
use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use csv::StringRecord;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::ChurnError;
use crate::features::schema::{CategoricalField, MONTHLY_CHARGES, TENURE};
use crate::features::RawInput;
use crate::predictor::{ChurnPredictor, PredictionResult};

const CUSTOMER_ID: &str = "customerID";

/// One row of a customer table. A row that could not be parsed keeps its
/// error so it is reported in place instead of dropping the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRow {
    pub customer_id: Option<String>,
    pub input: Result<RawInput, ChurnError>,
}

/// Read a CSV of customers, one `CustomerRow` per data row.
///
/// Columns are matched by the Telco names; extra columns are ignored. A
/// missing required column fails the whole file, a bad value fails only its
/// row.
pub fn read_customers_csv<P: AsRef<Path>>(path: P) -> Result<Vec<CustomerRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .with_context(|| format!("Failed to open customer file: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.as_ref().display()))?
        .clone();
    let missing: Vec<&str> = CategoricalField::ALL
        .iter()
        .map(|field| field.name())
        .chain([TENURE, MONTHLY_CHARGES])
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "Customer file {} is missing columns: {}",
            path.as_ref().display(),
            missing.join(", ")
        );
    }
    let id_column = headers.iter().position(|h| h == CUSTOMER_ID);

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to read customer at row {}", row_idx + 1))?;
        let customer_id = id_column
            .and_then(|i| record.get(i))
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let input = record
            .deserialize::<RawInput>(Some(&headers))
            .map_err(|e| row_error(&headers, &record, &e));
        if let Err(e) = &input {
            log::warn!("Customer at row {} not parsed: {}", row_idx + 1, e);
        }
        rows.push(CustomerRow { customer_id, input });
    }
    log::info!(
        "Loaded {} customers from {}",
        rows.len(),
        path.as_ref().display()
    );
    Ok(rows)
}

fn row_error(headers: &StringRecord, record: &StringRecord, err: &csv::Error) -> ChurnError {
    let de = match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err,
        _ => return ChurnError::MalformedRow(err.to_string()),
    };
    let field = match de.field() {
        Some(idx) => idx as usize,
        None => return ChurnError::MalformedRow(de.kind().to_string()),
    };
    let name = headers.get(field).unwrap_or_default().to_string();
    if name == TENURE || name == MONTHLY_CHARGES {
        ChurnError::InvalidNumeric {
            field: name,
            reason: de.kind().to_string(),
        }
    } else {
        ChurnError::InvalidCategory {
            field: name,
            value: record.get(field).unwrap_or_default().to_string(),
        }
    }
}

/// Predict every parsed row in parallel; unparsed rows keep their error.
pub fn predict_customers(
    predictor: &ChurnPredictor,
    rows: &[CustomerRow],
) -> Vec<Result<PredictionResult, ChurnError>> {
    rows.par_iter()
        .map(|row| match &row.input {
            Ok(input) => predictor.predict(input),
            Err(e) => Err(e.clone()),
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct ScoredRow<'a> {
    row: usize,
    customer_id: &'a str,
    prediction: &'a str,
    churn_probability: Option<f32>,
    error: &'a str,
}

/// Write one output row per customer. Failed predictions keep their row and
/// carry the error message instead of a label.
pub fn write_predictions_csv<W: Write>(
    writer: W,
    rows: &[CustomerRow],
    results: &[Result<PredictionResult, ChurnError>],
) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (idx, (customer, result)) in rows.iter().zip(results.iter()).enumerate() {
        let customer_id = customer.customer_id.as_deref().unwrap_or("");
        let message;
        let row = match result {
            Ok(prediction) => ScoredRow {
                row: idx + 1,
                customer_id,
                prediction: prediction.label.as_str(),
                churn_probability: prediction.churn_probability,
                error: "",
            },
            Err(e) => {
                message = e.to_string();
                ScoredRow {
                    row: idx + 1,
                    customer_id,
                    prediction: "",
                    churn_probability: None,
                    error: &message,
                }
            }
        };
        wtr.serialize(row).context("Failed to write prediction row")?;
    }
    wtr.flush().context("Failed to flush predictions")?;
    Ok(())
}
