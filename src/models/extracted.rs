use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Best-effort structured fields pulled from one repair-order segment.
///
/// Every field is independently optional; an all-`None` value is the
/// normal result for a page with no extractable text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Digits only, exactly 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Lower-cased.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    /// 17 characters, A-Z/0-9 without I, O or Q.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parts_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labor_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_writer: Option<String>,
}

impl ExtractedFields {
    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Number of populated fields.
    pub fn populated_count(&self) -> usize {
        [
            self.customer_name.is_some(),
            self.customer_phone.is_some(),
            self.customer_email.is_some(),
            self.vin.is_some(),
            self.vehicle_year.is_some(),
            self.vehicle_make.is_some(),
            self.vehicle_model.is_some(),
            self.license_plate.is_some(),
            self.service_date.is_some(),
            self.total_amount.is_some(),
            self.parts_cost.is_some(),
            self.labor_cost.is_some(),
            self.service_writer.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}
