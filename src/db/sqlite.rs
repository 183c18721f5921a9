use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;

/// Schema migrations in apply order. Each script records its own version.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/001_initial.sql"),
)];

/// Schema version a fully migrated database reports.
pub const LATEST_SCHEMA_VERSION: i64 = 1;

/// Open the shop database at `path`, creating its directory and bringing
/// the schema up to date.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        _ => {}
    }
    prepare(Connection::open(path)?)
}

/// Migrated in-memory database, used by tests.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    // Vehicles and repair orders reference customers; keep those links enforced.
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    migrate(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the recorded schema version.
pub fn migrate(conn: &Connection) -> Result<(), DatabaseError> {
    let applied = schema_version(conn)?;
    for &(version, script) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
        conn.execute_batch(script)
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        tracing::info!(version, "Applied schema migration");
    }
    Ok(())
}

/// Highest applied migration, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if table.is_none() {
        return Ok(0);
    }
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn fresh_database_reports_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn migrated_schema_has_directory_and_orders() {
        let conn = open_memory_database().unwrap();
        assert_eq!(
            table_names(&conn),
            vec!["customers", "repair_orders", "schema_version", "vehicles"]
        );
        assert_eq!(schema_version(&conn).unwrap(), LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn migrating_twice_changes_nothing() {
        let conn = open_memory_database().unwrap();
        migrate(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn vehicle_needs_an_existing_customer() {
        let conn = open_memory_database().unwrap();
        let orphan_vehicle = conn.execute(
            "INSERT INTO vehicles (id, customer_id) VALUES ('veh-1', 'nobody')",
            [],
        );
        assert!(orphan_vehicle.is_err());
    }

    #[test]
    fn matched_order_needs_a_customer() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO repair_orders (id, shop_id, file_url, is_matched, created_at)
             VALUES ('ro-1', 'shop-1', 'http://files.test/x.pdf', 1, '2026-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn file_database_creates_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shops").join("shopfloor.db");
        let conn = open_database(&path).unwrap();
        assert!(path.exists());
        assert_eq!(schema_version(&conn).unwrap(), LATEST_SCHEMA_VERSION);
    }
}
