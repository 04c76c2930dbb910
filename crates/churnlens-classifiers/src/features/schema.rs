//! Declarative description of the training-time feature schema.
//!
//! Every categorical attribute is described once in [`CATEGORICAL_FIELDS`]:
//! its allowed levels, the level that is dropped from the one-hot expansion
//! (the baseline) and the ordered indicator columns of the remaining levels.
//! The encoder and the assembler are driven entirely by these tables.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChurnError;

pub const TENURE: &str = "tenure";
pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const TOTAL_CHARGES: &str = "TotalCharges";

/// Largest tenure (in months) the model was trained on.
pub const MAX_TENURE: u32 = 72;

/// Columns the model requires but the user never sets.
pub const HARD_DEFAULTS: &[(&str, f32)] = &[("PhoneService", 1.0)];

/// Column order the bundled schema was trained with.
pub const CANONICAL_COLUMNS: [&str; 16] = [
    TENURE,
    MONTHLY_CHARGES,
    TOTAL_CHARGES,
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "PhoneService",
    "PaperlessBilling",
    "InternetService_Fiber optic",
    "InternetService_No",
    "Contract_One year",
    "Contract_Two year",
    "PaymentMethod_Credit card (automatic)",
    "PaymentMethod_Electronic check",
    "PaymentMethod_Mailed check",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    Gender,
    SeniorCitizen,
    Partner,
    Dependents,
    PaperlessBilling,
    InternetService,
    Contract,
    PaymentMethod,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 8] = [
        CategoricalField::Gender,
        CategoricalField::SeniorCitizen,
        CategoricalField::Partner,
        CategoricalField::Dependents,
        CategoricalField::PaperlessBilling,
        CategoricalField::InternetService,
        CategoricalField::Contract,
        CategoricalField::PaymentMethod,
    ];

    /// Column name of the field in raw customer tables.
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Gender => "gender",
            CategoricalField::SeniorCitizen => "SeniorCitizen",
            CategoricalField::Partner => "Partner",
            CategoricalField::Dependents => "Dependents",
            CategoricalField::PaperlessBilling => "PaperlessBilling",
            CategoricalField::InternetService => "InternetService",
            CategoricalField::Contract => "Contract",
            CategoricalField::PaymentMethod => "PaymentMethod",
        }
    }

    pub fn spec(&self) -> &'static CategoricalSpec {
        // CATEGORICAL_FIELDS is laid out in the same order as `ALL`.
        &CATEGORICAL_FIELDS[*self as usize]
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CategoricalField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CategoricalField::ALL
            .iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown categorical field: {}", s))
    }
}

/// One categorical attribute and its one-hot expansion.
#[derive(Debug)]
pub struct CategoricalSpec {
    pub field: CategoricalField,
    /// Level represented by all indicators being zero.
    pub baseline: &'static str,
    /// `(level, column)` pairs for every non-baseline level, in column order.
    pub indicators: &'static [(&'static str, &'static str)],
}

impl CategoricalSpec {
    /// All allowed levels, baseline first.
    pub fn domain(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.baseline).chain(self.indicators.iter().map(|(level, _)| *level))
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.indicators.iter().map(|(_, column)| *column)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.domain().any(|level| level == value)
    }
}

const NO: &str = "No";

pub static CATEGORICAL_FIELDS: [CategoricalSpec; 8] = [
    CategoricalSpec {
        field: CategoricalField::Gender,
        baseline: "Female",
        indicators: &[("Male", "gender")],
    },
    CategoricalSpec {
        field: CategoricalField::SeniorCitizen,
        baseline: NO,
        indicators: &[("Yes", "SeniorCitizen")],
    },
    CategoricalSpec {
        field: CategoricalField::Partner,
        baseline: NO,
        indicators: &[("Yes", "Partner")],
    },
    CategoricalSpec {
        field: CategoricalField::Dependents,
        baseline: NO,
        indicators: &[("Yes", "Dependents")],
    },
    CategoricalSpec {
        field: CategoricalField::PaperlessBilling,
        baseline: NO,
        indicators: &[("Yes", "PaperlessBilling")],
    },
    CategoricalSpec {
        field: CategoricalField::InternetService,
        baseline: "DSL",
        indicators: &[
            ("Fiber optic", "InternetService_Fiber optic"),
            ("No", "InternetService_No"),
        ],
    },
    CategoricalSpec {
        field: CategoricalField::Contract,
        baseline: "Month-to-month",
        indicators: &[
            ("One year", "Contract_One year"),
            ("Two year", "Contract_Two year"),
        ],
    },
    CategoricalSpec {
        field: CategoricalField::PaymentMethod,
        baseline: "Bank transfer (automatic)",
        indicators: &[
            ("Credit card (automatic)", "PaymentMethod_Credit card (automatic)"),
            ("Electronic check", "PaymentMethod_Electronic check"),
            ("Mailed check", "PaymentMethod_Mailed check"),
        ],
    },
];

/// Ordered list of the columns a classifier consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn canonical() -> Self {
        Self {
            columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Build a schema with a caller-provided column order.
    ///
    /// The set of columns must be exactly the canonical set; only the order
    /// may differ.
    pub fn from_columns(columns: Vec<String>) -> Result<Self, ChurnError> {
        let schema = Self { columns };
        schema.check_columns(CANONICAL_COLUMNS.iter().copied())?;
        Ok(schema)
    }

    #[cfg(test)]
    pub(crate) fn unchecked(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Compare the schema against another set of column names.
    pub fn check_columns<'a, I>(&self, other: I) -> Result<(), ChurnError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let other: Vec<&str> = other.into_iter().collect();
        let missing: Vec<String> = other
            .iter()
            .filter(|name| self.index_of(name).is_none())
            .map(|name| name.to_string())
            .collect();
        let unexpected: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !other.contains(&c.as_str()))
            .cloned()
            .collect();
        let mut duplicated: Vec<String> = Vec::new();
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].contains(column) && !duplicated.contains(column) {
                duplicated.push(column.clone());
            }
        }

        if missing.is_empty() && unexpected.is_empty() && duplicated.is_empty() {
            return Ok(());
        }
        Err(ChurnError::SchemaMismatch {
            missing,
            unexpected: unexpected.into_iter().chain(duplicated).collect(),
        })
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::canonical()
    }
}
