use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use super::error::StoreError;
use super::traits::{DirectorySource, ObjectStore, RecordSink};
use crate::db::repository::{insert_repair_order, load_directory_snapshot};
use crate::models::{DirectorySnapshot, RepairOrderRecord};
use crate::pipeline::import::content_hash;

// ═══════════════════════════════════════════
// Filesystem object store
// ═══════════════════════════════════════════

/// Stores segment PDFs as `<root>/<shop_id>/<sha256>.pdf` and serves them
/// under `<base_url>/<shop_id>/<sha256>.pdf`.
///
/// Content addressing makes re-writing the same bytes a no-op.
pub struct FsObjectStore {
    root: PathBuf,
    base_url: String,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Map a URL produced by `write` back to its file path.
    pub fn path_for_url(&self, url: &str) -> Result<PathBuf, StoreError> {
        let key = url
            .strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StoreError::InvalidKey(url.to_string()))?;

        let (shop_id, object) = key
            .split_once('/')
            .ok_or_else(|| StoreError::InvalidKey(url.to_string()))?;
        check_segment(shop_id)?;
        check_segment(object)?;

        Ok(self.root.join(shop_id).join(object))
    }
}

/// One path component: no separators, no traversal.
fn check_segment(segment: &str) -> Result<(), StoreError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(StoreError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

impl ObjectStore for FsObjectStore {
    fn write(&self, shop_id: &str, file_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        check_segment(shop_id)?;

        let object = format!("{}.pdf", content_hash(bytes));
        let dir = self.root.join(shop_id);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(&object);
        if !path.exists() {
            // Rename publishes the object atomically.
            let tmp = dir.join(format!("{object}.part"));
            std::fs::write(&tmp, bytes)?;
            std::fs::rename(&tmp, &path)?;
        }

        tracing::debug!(shop_id, file_name, object = %object, size = bytes.len(), "Stored segment");
        Ok(format!("{}/{shop_id}/{object}", self.base_url))
    }

    fn read(&self, url: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for_url(url)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ═══════════════════════════════════════════
// SQLite directory + record sink
// ═══════════════════════════════════════════

/// Directory source and record sink over one shared SQLite connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Short-held access for callers outside the collaborator traits.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl DirectorySource for SqliteStore {
    fn snapshot(&self, shop_id: &str) -> Result<DirectorySnapshot, StoreError> {
        let conn = self.conn()?;
        Ok(load_directory_snapshot(&conn, shop_id)?)
    }
}

impl RecordSink for SqliteStore {
    fn insert(&self, record: &RepairOrderRecord) -> Result<(), StoreError> {
        let conn = self.conn()?;
        insert_repair_order(&conn, record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{get_repair_order, insert_customer};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{CustomerDirectoryEntry, ExtractedFields};

    fn fs_store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path(), "http://files.test/ro/");
        (dir, store)
    }

    #[test]
    fn write_then_read() {
        let (_dir, store) = fs_store();
        let url = store.write("shop-1", "march.pdf", b"%PDF-1.4 one").unwrap();
        assert!(url.starts_with("http://files.test/ro/shop-1/"));
        assert!(url.ends_with(".pdf"));
        assert_eq!(store.read(&url).unwrap(), b"%PDF-1.4 one");
    }

    #[test]
    fn same_bytes_same_url() {
        let (_dir, store) = fs_store();
        let a = store.write("shop-1", "a.pdf", b"same").unwrap();
        let b = store.write("shop-1", "b.pdf", b"same").unwrap();
        assert_eq!(a, b);
        let c = store.write("shop-2", "a.pdf", b"same").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_traversal() {
        let (_dir, store) = fs_store();
        assert!(matches!(
            store.write("../etc", "a.pdf", b"x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(store.read("http://files.test/ro/../secret.pdf").is_err());
        assert!(store.read("http://elsewhere/ro/shop-1/x.pdf").is_err());
    }

    #[test]
    fn missing_object_is_not_found() {
        let (_dir, store) = fs_store();
        assert!(matches!(
            store.read("http://files.test/ro/shop-1/nothing.pdf"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn sqlite_store_snapshot_and_insert() {
        let conn = open_memory_database().unwrap();
        insert_customer(
            &conn,
            &CustomerDirectoryEntry {
                id: "cust-1".into(),
                shop_id: "shop-1".into(),
                first_name: "Dana".into(),
                last_name: "Whitfield".into(),
                phone: Some("5551112222".into()),
                email: None,
            },
        )
        .unwrap();
        let store = SqliteStore::new(conn);

        let snapshot = store.snapshot("shop-1").unwrap();
        assert_eq!(snapshot.customers.len(), 1);

        let record = RepairOrderRecord::from_extraction(
            "shop-1",
            "http://files.test/ro/shop-1/x.pdf",
            &ExtractedFields::default(),
            Some("cust-1".into()),
            None,
        );
        store.insert(&record).unwrap();
        let stored = get_repair_order(&store.conn().unwrap(), &record.id).unwrap().unwrap();
        assert!(stored.is_matched);
    }
}
