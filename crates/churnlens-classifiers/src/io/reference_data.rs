//! Reference customer table reader used for descriptive charts.
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Historical customers with known outcomes.
///
/// Loaded once per session and only read afterwards. It never feeds the
/// prediction path.
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    churn: Vec<bool>,
    monthly_charges: Option<Vec<Option<f32>>>,
    tenure: Option<Vec<Option<f32>>>,
}

/// Column layout of the reference table.
#[derive(Debug, Clone)]
pub struct ReferenceReaderConfig {
    /// Column holding the outcome (`1`/`0`, `Yes`/`No` or `true`/`false`).
    pub churn_column: String,
    pub monthly_charges_column: String,
    pub tenure_column: String,
    pub delimiter: u8,
}

impl Default for ReferenceReaderConfig {
    fn default() -> Self {
        Self {
            churn_column: "Churn".to_string(),
            monthly_charges_column: "MonthlyCharges".to_string(),
            tenure_column: "tenure".to_string(),
            delimiter: b',',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChurnCounts {
    pub retained: usize,
    pub churned: usize,
}

impl ChurnCounts {
    pub fn total(&self) -> usize {
        self.retained + self.churned
    }
}

/// Read a reference CSV with the default column names.
pub fn read_reference_csv<P: AsRef<Path>>(path: P) -> Result<ReferenceDataset> {
    read_reference_csv_with_config(path, &ReferenceReaderConfig::default())
}

/// Read a reference table using a custom configuration.
pub fn read_reference_csv_with_config<P: AsRef<Path>>(
    path: P,
    config: &ReferenceReaderConfig,
) -> Result<ReferenceDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(config.delimiter)
        .has_headers(true)
        .from_path(&path)
        .with_context(|| format!("Failed to open reference data: {}", path.as_ref().display()))?;

    let headers = reader
        .headers()
        .context("Failed to read reference data header row")?
        .clone();

    let churn_idx = find_column(&headers, &config.churn_column)
        .ok_or_else(|| anyhow!("Missing outcome column '{}'", config.churn_column))?;
    let charges_idx = find_column(&headers, &config.monthly_charges_column);
    let tenure_idx = find_column(&headers, &config.tenure_column);

    let mut churn = Vec::new();
    let mut monthly_charges = charges_idx.map(|_| Vec::new());
    let mut tenure = tenure_idx.map(|_| Vec::new());

    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;

        let raw = record
            .get(churn_idx)
            .ok_or_else(|| anyhow!("Missing outcome value at row {}", row_idx + 1))?;
        let outcome = parse_outcome(raw)
            .ok_or_else(|| anyhow!("Invalid outcome '{}' at row {}", raw, row_idx + 1))?;
        churn.push(outcome);

        if let (Some(idx), Some(values)) = (charges_idx, monthly_charges.as_mut()) {
            values.push(parse_optional(record.get(idx)));
        }
        if let (Some(idx), Some(values)) = (tenure_idx, tenure.as_mut()) {
            values.push(parse_optional(record.get(idx)));
        }
    }

    if churn.is_empty() {
        return Err(anyhow!(
            "Reference data {} contains no rows",
            path.as_ref().display()
        ));
    }

    let dataset = ReferenceDataset {
        churn,
        monthly_charges,
        tenure,
    };
    dataset.log_summary();
    Ok(dataset)
}

impl ReferenceDataset {
    pub fn len(&self) -> usize {
        self.churn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.churn.is_empty()
    }

    pub fn churn_counts(&self) -> ChurnCounts {
        let churned = self.churn.iter().filter(|&&c| c).count();
        ChurnCounts {
            retained: self.churn.len() - churned,
            churned,
        }
    }

    /// Fraction of customers that churned.
    pub fn churn_rate(&self) -> f64 {
        let counts = self.churn_counts();
        if counts.total() == 0 {
            return 0.0;
        }
        counts.churned as f64 / counts.total() as f64
    }

    /// Monthly charges split into `(retained, churned)`, skipping blanks.
    pub fn monthly_charges_by_outcome(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        self.monthly_charges.as_ref().map(|v| self.split_by_outcome(v))
    }

    /// Tenure split into `(retained, churned)`, skipping blanks.
    pub fn tenure_by_outcome(&self) -> Option<(Vec<f32>, Vec<f32>)> {
        self.tenure.as_ref().map(|v| self.split_by_outcome(v))
    }

    fn split_by_outcome(&self, values: &[Option<f32>]) -> (Vec<f32>, Vec<f32>) {
        let mut retained = Vec::new();
        let mut churned = Vec::new();
        for (value, &outcome) in values.iter().zip(self.churn.iter()) {
            if let Some(v) = value {
                if outcome {
                    churned.push(*v);
                } else {
                    retained.push(*v);
                }
            }
        }
        (retained, churned)
    }

    pub fn log_summary(&self) {
        let counts = self.churn_counts();
        log::info!(
            "Reference data: {} customers, {} retained, {} churned ({:.1}% churn)",
            self.len(),
            counts.retained,
            counts.churned,
            self.churn_rate() * 100.0
        );
        if self.monthly_charges.is_none() {
            log::warn!("Reference data has no MonthlyCharges column; density plot disabled");
        }
    }
}

/// Randomly keep at most `max` values, reproducibly for a given `seed`.
pub fn downsample(values: &[f32], max: usize, seed: u64) -> Vec<f32> {
    if values.len() <= max {
        return values.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    values.choose_multiple(&mut rng, max).copied().collect()
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn parse_outcome(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" => Some(true),
        "0" | "no" | "false" => Some(false),
        _ => None,
    }
}

fn parse_optional(value: Option<&str>) -> Option<f32> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned_data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_numeric_outcomes() {
        let (_dir, path) = write_csv(
            "tenure,MonthlyCharges,Churn\n1,29.85,0\n34,56.95,0\n2,53.85,1\n45,42.30,0\n",
        );
        let data = read_reference_csv(&path).unwrap();
        assert_eq!(data.len(), 4);
        assert_eq!(
            data.churn_counts(),
            ChurnCounts {
                retained: 3,
                churned: 1
            }
        );
        assert!((data.churn_rate() - 0.25).abs() < 1e-12);

        let (retained, churned) = data.monthly_charges_by_outcome().unwrap();
        assert_eq!(churned, vec![53.85]);
        assert_eq!(retained.len(), 3);
    }

    #[test]
    fn reads_text_outcomes_and_skips_blank_charges() {
        let (_dir, path) = write_csv("customerID,churn,MonthlyCharges\na,Yes, \nb,No,20.5\n");
        let data = read_reference_csv(&path).unwrap();
        let (retained, churned) = data.monthly_charges_by_outcome().unwrap();
        assert_eq!(retained, vec![20.5]);
        assert!(churned.is_empty());
        assert!(data.tenure_by_outcome().is_none());
    }

    #[test]
    fn missing_outcome_column_is_an_error() {
        let (_dir, path) = write_csv("tenure,MonthlyCharges\n1,20.0\n");
        let err = read_reference_csv(&path).unwrap_err();
        assert!(err.to_string().contains("Churn"));
    }

    #[test]
    fn invalid_outcome_is_an_error() {
        let (_dir, path) = write_csv("Churn\nmaybe\n");
        assert!(read_reference_csv(&path).is_err());
    }

    #[test]
    fn empty_table_is_an_error() {
        let (_dir, path) = write_csv("Churn,MonthlyCharges\n");
        assert!(read_reference_csv(&path).is_err());
    }

    #[test]
    fn downsample_is_reproducible() {
        let values: Vec<f32> = (0..1000).map(|v| v as f32).collect();
        let a = downsample(&values, 100, 7);
        let b = downsample(&values, 100, 7);
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);
        assert_eq!(downsample(&values[..10], 100, 7).len(), 10);
    }
}
