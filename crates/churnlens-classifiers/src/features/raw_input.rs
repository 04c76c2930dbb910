//! Raw customer attributes as collected from the user.
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ChurnError;
use crate::features::schema::{CategoricalField, MAX_TENURE, MONTHLY_CHARGES, TENURE};

/// One customer's attributes before encoding.
///
/// Field names follow the Telco customer table so rows of that table (or
/// JSON objects with the same keys) deserialize directly. Extra columns such
/// as `TotalCharges` or `Churn` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInput {
    #[serde(rename = "customerID", default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub gender: String,
    #[serde(rename = "SeniorCitizen", deserialize_with = "yes_no_flag")]
    pub senior_citizen: String,
    #[serde(rename = "Partner")]
    pub partner: String,
    #[serde(rename = "Dependents")]
    pub dependents: String,
    #[serde(rename = "PaperlessBilling")]
    pub paperless_billing: String,
    #[serde(rename = "InternetService")]
    pub internet_service: String,
    #[serde(rename = "Contract")]
    pub contract: String,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: String,
    pub tenure: u32,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f32,
}

impl RawInput {
    pub fn categorical(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Gender => &self.gender,
            CategoricalField::SeniorCitizen => &self.senior_citizen,
            CategoricalField::Partner => &self.partner,
            CategoricalField::Dependents => &self.dependents,
            CategoricalField::PaperlessBilling => &self.paperless_billing,
            CategoricalField::InternetService => &self.internet_service,
            CategoricalField::Contract => &self.contract,
            CategoricalField::PaymentMethod => &self.payment_method,
        }
    }

    pub fn set_categorical(&mut self, field: CategoricalField, value: String) {
        let slot = match field {
            CategoricalField::Gender => &mut self.gender,
            CategoricalField::SeniorCitizen => &mut self.senior_citizen,
            CategoricalField::Partner => &mut self.partner,
            CategoricalField::Dependents => &mut self.dependents,
            CategoricalField::PaperlessBilling => &mut self.paperless_billing,
            CategoricalField::InternetService => &mut self.internet_service,
            CategoricalField::Contract => &mut self.contract,
            CategoricalField::PaymentMethod => &mut self.payment_method,
        };
        *slot = value;
    }

    /// Check the numeric fields against the ranges the model was trained on.
    pub fn validate_numeric(&self) -> Result<(), ChurnError> {
        if self.tenure > MAX_TENURE {
            return Err(ChurnError::InvalidNumeric {
                field: TENURE.to_string(),
                reason: format!("{} is outside [0, {}]", self.tenure, MAX_TENURE),
            });
        }
        if !self.monthly_charges.is_finite() || self.monthly_charges < 0.0 {
            return Err(ChurnError::InvalidNumeric {
                field: MONTHLY_CHARGES.to_string(),
                reason: format!("{} is not a non-negative amount", self.monthly_charges),
            });
        }
        Ok(())
    }
}

impl Default for RawInput {
    /// Form defaults: tenure 12, a 70.0 monthly charge and the first option of
    /// every selection.
    fn default() -> Self {
        let mut input = RawInput {
            customer_id: None,
            gender: String::new(),
            senior_citizen: String::new(),
            partner: String::new(),
            dependents: String::new(),
            paperless_billing: String::new(),
            internet_service: String::new(),
            contract: String::new(),
            payment_method: String::new(),
            tenure: 12,
            monthly_charges: 70.0,
        };
        for field in CategoricalField::ALL {
            input.set_categorical(field, field.spec().baseline.to_string());
        }
        input
    }
}

/// Accept `Yes`/`No` as well as the `1`/`0` (or boolean) encoding used by the
/// public Telco table for `SeniorCitizen`.
fn yes_no_flag<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(true) | Flag::Int(1) => "Yes".to_string(),
        Flag::Bool(false) | Flag::Int(0) => "No".to_string(),
        Flag::Int(other) => other.to_string(),
        Flag::Text(text) => match text.trim() {
            "1" => "Yes".to_string(),
            "0" => "No".to_string(),
            other => other.to_string(),
        },
    })
}
