use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::RepairOrderRecord;

const SELECT_COLUMNS: &str = "id, shop_id, customer_id, vehicle_id, service_date, file_url,
    total_amount, parts_cost, labor_cost, service_writer, is_matched,
    temp_customer_name, temp_customer_phone, temp_customer_email, temp_vin,
    temp_vehicle_year, temp_vehicle_make, temp_vehicle_model, temp_license_plate,
    created_at";

pub fn insert_repair_order(
    conn: &Connection,
    record: &RepairOrderRecord,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO repair_orders (id, shop_id, customer_id, vehicle_id, service_date, file_url,
         total_amount, parts_cost, labor_cost, service_writer, is_matched,
         temp_customer_name, temp_customer_phone, temp_customer_email, temp_vin,
         temp_vehicle_year, temp_vehicle_make, temp_vehicle_model, temp_license_plate,
         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
         ?18, ?19, ?20)",
        params![
            record.id.to_string(),
            record.shop_id,
            record.customer_id,
            record.vehicle_id,
            record.service_date,
            record.file_url,
            record.total_amount,
            record.parts_cost,
            record.labor_cost,
            record.service_writer,
            record.is_matched as i32,
            record.temp_customer_name,
            record.temp_customer_phone,
            record.temp_customer_email,
            record.temp_vin,
            record.temp_vehicle_year,
            record.temp_vehicle_make,
            record.temp_vehicle_model,
            record.temp_license_plate,
            record.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_repair_order(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<RepairOrderRecord>, DatabaseError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM repair_orders WHERE id = ?1");
    let result = conn.query_row(&sql, params![id.to_string()], record_from_row);

    match result {
        Ok(record) => Ok(Some(record?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Unmatched repair orders of one shop, oldest first.
pub fn list_orphan_repair_orders(
    conn: &Connection,
    shop_id: &str,
) -> Result<Vec<RepairOrderRecord>, DatabaseError> {
    let sql = format!(
        "SELECT {SELECT_COLUMNS} FROM repair_orders
         WHERE shop_id = ?1 AND is_matched = 0 ORDER BY created_at, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![shop_id], record_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().collect()
}

pub fn count_repair_orders(conn: &Connection, shop_id: &str) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM repair_orders WHERE shop_id = ?1",
        params![shop_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Link an orphan to a customer (and optionally a vehicle).
///
/// Clears the `temp_*` columns, matching what a record resolved at intake
/// looks like. Only touches rows that are still unmatched.
pub fn attach_orphan(
    conn: &Connection,
    id: &Uuid,
    customer_id: &str,
    vehicle_id: Option<&str>,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE repair_orders SET customer_id = ?2, vehicle_id = ?3, is_matched = 1,
         temp_customer_name = NULL, temp_customer_phone = NULL, temp_customer_email = NULL,
         temp_vin = NULL, temp_vehicle_year = NULL, temp_vehicle_make = NULL,
         temp_vehicle_model = NULL, temp_license_plate = NULL
         WHERE id = ?1 AND is_matched = 0",
        params![id.to_string(), customer_id, vehicle_id],
    )?;

    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "orphan repair order".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

fn record_from_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<Result<RepairOrderRecord, DatabaseError>> {
    let id: String = row.get(0)?;
    let id = match Uuid::parse_str(&id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(Err(DatabaseError::InvalidValue {
                field: "repair_orders.id".into(),
                value: id,
            }))
        }
    };

    Ok(Ok(RepairOrderRecord {
        id,
        shop_id: row.get(1)?,
        customer_id: row.get(2)?,
        vehicle_id: row.get(3)?,
        service_date: row.get(4)?,
        file_url: row.get(5)?,
        total_amount: row.get(6)?,
        parts_cost: row.get(7)?,
        labor_cost: row.get(8)?,
        service_writer: row.get(9)?,
        is_matched: row.get::<_, i32>(10)? != 0,
        temp_customer_name: row.get(11)?,
        temp_customer_phone: row.get(12)?,
        temp_customer_email: row.get(13)?,
        temp_vin: row.get(14)?,
        temp_vehicle_year: row.get(15)?,
        temp_vehicle_make: row.get(16)?,
        temp_vehicle_model: row.get(17)?,
        temp_license_plate: row.get(18)?,
        created_at: row.get(19)?,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::db::repository::insert_customer;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{CustomerDirectoryEntry, ExtractedFields};

    fn orphan_fields() -> ExtractedFields {
        ExtractedFields {
            customer_name: Some("Tomas Reyes".into()),
            vin: Some("2T1BURHE0JC074321".into()),
            service_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            total_amount: Some(389.10),
            ..Default::default()
        }
    }

    fn seed_customer(conn: &Connection) {
        insert_customer(
            conn,
            &CustomerDirectoryEntry {
                id: "c1".into(),
                shop_id: "shop-1".into(),
                first_name: "Tomas".into(),
                last_name: "Reyes".into(),
                phone: None,
                email: None,
            },
        )
        .unwrap();
    }

    #[test]
    fn insert_and_get_orphan() {
        let conn = open_memory_database().unwrap();
        let record = RepairOrderRecord::from_extraction(
            "shop-1",
            "http://files/shop-1/x.pdf",
            &orphan_fields(),
            None,
            None,
        );
        insert_repair_order(&conn, &record).unwrap();

        let loaded = get_repair_order(&conn, &record.id).unwrap().unwrap();
        assert!(!loaded.is_matched);
        assert_eq!(loaded.temp_customer_name.as_deref(), Some("Tomas Reyes"));
        assert_eq!(loaded.temp_vin.as_deref(), Some("2T1BURHE0JC074321"));
        assert_eq!(loaded.service_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(loaded.total_amount, Some(389.10));
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_repair_order(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn matched_without_known_customer_is_rejected() {
        let conn = open_memory_database().unwrap();
        let record = RepairOrderRecord::from_extraction(
            "shop-1",
            "u",
            &orphan_fields(),
            Some("ghost".into()),
            None,
        );
        assert!(insert_repair_order(&conn, &record).is_err());
    }

    #[test]
    fn non_positive_cost_is_rejected_by_schema() {
        let conn = open_memory_database().unwrap();
        let mut record =
            RepairOrderRecord::from_extraction("shop-1", "u", &orphan_fields(), None, None);
        record.total_amount = Some(0.0);
        assert!(insert_repair_order(&conn, &record).is_err());
    }

    #[test]
    fn attach_orphan_links_and_leaves_orphan_list() {
        let conn = open_memory_database().unwrap();
        seed_customer(&conn);
        let record =
            RepairOrderRecord::from_extraction("shop-1", "u", &orphan_fields(), None, None);
        insert_repair_order(&conn, &record).unwrap();
        assert_eq!(list_orphan_repair_orders(&conn, "shop-1").unwrap().len(), 1);

        attach_orphan(&conn, &record.id, "c1", None).unwrap();

        let loaded = get_repair_order(&conn, &record.id).unwrap().unwrap();
        assert!(loaded.is_matched);
        assert_eq!(loaded.customer_id.as_deref(), Some("c1"));
        assert!(loaded.temp_customer_name.is_none());
        assert!(list_orphan_repair_orders(&conn, "shop-1").unwrap().is_empty());

        // Second attach finds no unmatched row.
        assert!(attach_orphan(&conn, &record.id, "c1", None).is_err());
    }

    #[test]
    fn count_is_per_shop() {
        let conn = open_memory_database().unwrap();
        for shop in ["shop-1", "shop-1", "shop-2"] {
            let record =
                RepairOrderRecord::from_extraction(shop, "u", &orphan_fields(), None, None);
            insert_repair_order(&conn, &record).unwrap();
        }
        assert_eq!(count_repair_orders(&conn, "shop-1").unwrap(), 2);
        assert_eq!(count_repair_orders(&conn, "shop-2").unwrap(), 1);
    }
}
