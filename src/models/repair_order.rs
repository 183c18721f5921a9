use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extracted::ExtractedFields;

/// A persisted repair order.
///
/// Either resolved (`is_matched`, `customer_id` set) or an orphan carrying
/// the raw extracted values in `temp_*` for later reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairOrderRecord {
    pub id: Uuid,
    pub shop_id: String,
    pub customer_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub file_url: String,
    pub total_amount: Option<f64>,
    pub parts_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub service_writer: Option<String>,
    pub is_matched: bool,
    pub temp_customer_name: Option<String>,
    pub temp_customer_phone: Option<String>,
    pub temp_customer_email: Option<String>,
    pub temp_vin: Option<String>,
    pub temp_vehicle_year: Option<i32>,
    pub temp_vehicle_make: Option<String>,
    pub temp_vehicle_model: Option<String>,
    pub temp_license_plate: Option<String>,
    pub created_at: NaiveDateTime,
}

impl RepairOrderRecord {
    /// Build the record for one stored segment.
    ///
    /// With a customer the record is matched and `temp_*` stays empty.
    /// Without one it is an orphan and every extracted identity value is
    /// copied into `temp_*`; a vehicle id without a customer is dropped.
    pub fn from_extraction(
        shop_id: &str,
        file_url: &str,
        fields: &ExtractedFields,
        customer_id: Option<String>,
        vehicle_id: Option<String>,
    ) -> Self {
        let is_matched = customer_id.is_some();
        let orphan = |value: &Option<String>| if is_matched { None } else { value.clone() };

        Self {
            id: Uuid::new_v4(),
            shop_id: shop_id.to_string(),
            vehicle_id: if is_matched { vehicle_id } else { None },
            customer_id,
            service_date: fields.service_date,
            file_url: file_url.to_string(),
            total_amount: fields.total_amount,
            parts_cost: fields.parts_cost,
            labor_cost: fields.labor_cost,
            service_writer: fields.service_writer.clone(),
            is_matched,
            temp_customer_name: orphan(&fields.customer_name),
            temp_customer_phone: orphan(&fields.customer_phone),
            temp_customer_email: orphan(&fields.customer_email),
            temp_vin: orphan(&fields.vin),
            temp_vehicle_year: if is_matched { None } else { fields.vehicle_year },
            temp_vehicle_make: orphan(&fields.vehicle_make),
            temp_vehicle_model: orphan(&fields.vehicle_model),
            temp_license_plate: orphan(&fields.license_plate),
            created_at: chrono::Local::now().naive_local(),
        }
    }

    /// The identity fields an orphan carries, as `ExtractedFields`.
    /// Used to re-run resolution against a newer directory.
    pub fn temp_fields(&self) -> ExtractedFields {
        ExtractedFields {
            customer_name: self.temp_customer_name.clone(),
            customer_phone: self.temp_customer_phone.clone(),
            customer_email: self.temp_customer_email.clone(),
            vin: self.temp_vin.clone(),
            vehicle_year: self.temp_vehicle_year,
            vehicle_make: self.temp_vehicle_make.clone(),
            vehicle_model: self.temp_vehicle_model.clone(),
            license_plate: self.temp_license_plate.clone(),
            service_date: self.service_date,
            total_amount: self.total_amount,
            parts_cost: self.parts_cost,
            labor_cost: self.labor_cost,
            service_writer: self.service_writer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ExtractedFields {
        ExtractedFields {
            customer_name: Some("Dana Whitfield".into()),
            customer_phone: Some("5551234567".into()),
            vin: Some("1HGCM82633A004352".into()),
            vehicle_year: Some(2003),
            vehicle_make: Some("Honda".into()),
            vehicle_model: Some("Accord".into()),
            total_amount: Some(412.75),
            ..Default::default()
        }
    }

    #[test]
    fn orphan_keeps_every_extracted_identity_value() {
        let record = RepairOrderRecord::from_extraction(
            "shop-1",
            "http://files/shop-1/a.pdf",
            &fields(),
            None,
            Some("v1".into()),
        );
        assert!(!record.is_matched);
        assert!(record.customer_id.is_none());
        assert!(record.vehicle_id.is_none());
        assert_eq!(record.temp_customer_name.as_deref(), Some("Dana Whitfield"));
        assert_eq!(record.temp_customer_phone.as_deref(), Some("5551234567"));
        assert_eq!(record.temp_vin.as_deref(), Some("1HGCM82633A004352"));
        assert_eq!(record.temp_vehicle_year, Some(2003));
        assert_eq!(record.total_amount, Some(412.75));
    }

    #[test]
    fn matched_record_has_customer_and_no_temp_fields() {
        let record = RepairOrderRecord::from_extraction(
            "shop-1",
            "http://files/shop-1/a.pdf",
            &fields(),
            Some("c1".into()),
            Some("v1".into()),
        );
        assert!(record.is_matched);
        assert_eq!(record.customer_id.as_deref(), Some("c1"));
        assert_eq!(record.vehicle_id.as_deref(), Some("v1"));
        assert!(record.temp_customer_name.is_none());
        assert!(record.temp_vin.is_none());
    }

    #[test]
    fn temp_fields_round_trip_identity() {
        let record =
            RepairOrderRecord::from_extraction("shop-1", "u", &fields(), None, None);
        let restored = record.temp_fields();
        assert_eq!(restored.customer_name, fields().customer_name);
        assert_eq!(restored.vin, fields().vin);
        assert_eq!(restored.vehicle_model, fields().vehicle_model);
    }
}
