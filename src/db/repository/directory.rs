use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::{CustomerDirectoryEntry, DirectorySnapshot, VehicleDirectoryEntry};

/// Load one shop's customers and their vehicles in a single read.
pub fn load_directory_snapshot(
    conn: &Connection,
    shop_id: &str,
) -> Result<DirectorySnapshot, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, shop_id, first_name, last_name, phone, email
         FROM customers WHERE shop_id = ?1 ORDER BY created_at, id",
    )?;
    let customers = stmt
        .query_map(params![shop_id], |row| {
            Ok(CustomerDirectoryEntry {
                id: row.get(0)?,
                shop_id: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                email: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT v.id, v.customer_id, v.vin, v.year, v.make, v.model, v.license_plate
         FROM vehicles v JOIN customers c ON c.id = v.customer_id
         WHERE c.shop_id = ?1 ORDER BY v.rowid",
    )?;
    let vehicles = stmt
        .query_map(params![shop_id], vehicle_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        shop_id,
        customers = customers.len(),
        vehicles = vehicles.len(),
        "Loaded directory snapshot"
    );

    Ok(DirectorySnapshot::new(shop_id, customers, vehicles))
}

pub fn get_customer(
    conn: &Connection,
    id: &str,
) -> Result<Option<CustomerDirectoryEntry>, DatabaseError> {
    let result = conn.query_row(
        "SELECT id, shop_id, first_name, last_name, phone, email FROM customers WHERE id = ?1",
        params![id],
        |row| {
            Ok(CustomerDirectoryEntry {
                id: row.get(0)?,
                shop_id: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                email: row.get(5)?,
            })
        },
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Directory writes belong to the customer service; intake only uses this
/// for seeding and tests.
pub fn insert_customer(
    conn: &Connection,
    customer: &CustomerDirectoryEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO customers (id, shop_id, first_name, last_name, phone, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            customer.id,
            customer.shop_id,
            customer.first_name,
            customer.last_name,
            customer.phone,
            customer.email,
        ],
    )?;
    Ok(())
}

pub fn insert_vehicle(
    conn: &Connection,
    vehicle: &VehicleDirectoryEntry,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO vehicles (id, customer_id, vin, year, make, model, license_plate)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            vehicle.id,
            vehicle.customer_id,
            vehicle.vin,
            vehicle.year,
            vehicle.make,
            vehicle.model,
            vehicle.license_plate,
        ],
    )?;
    Ok(())
}

fn vehicle_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<VehicleDirectoryEntry> {
    Ok(VehicleDirectoryEntry {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        vin: row.get(2)?,
        year: row.get(3)?,
        make: row.get(4)?,
        model: row.get(5)?,
        license_plate: row.get(6)?,
    })
}
