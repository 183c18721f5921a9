//! Collaborators consumed by the batch orchestrator.
//!
//! - DirectorySource: read-once customer/vehicle snapshot per shop
//! - ObjectStore: durable storage for segment PDFs, addressed by URL
//! - RecordSink: persistence of repair-order records

use crate::models::{DirectorySnapshot, RepairOrderRecord};

use super::error::StoreError;

pub trait DirectorySource: Send + Sync {
    /// Load the shop's directory. Called once per batch.
    fn snapshot(&self, shop_id: &str) -> Result<DirectorySnapshot, StoreError>;
}

pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under the shop and return a URL that `read` accepts.
    fn write(&self, shop_id: &str, file_name: &str, bytes: &[u8]) -> Result<String, StoreError>;

    fn read(&self, url: &str) -> Result<Vec<u8>, StoreError>;
}

pub trait RecordSink: Send + Sync {
    fn insert(&self, record: &RepairOrderRecord) -> Result<(), StoreError>;
}

// ── Mocks for testing ─────────────────────────────────────

#[cfg(test)]
pub(crate) mod mocks {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory object store. Writes whose sequence number (1-based) is in
    /// `fail_on` return an error.
    #[derive(Default)]
    pub struct MemoryObjectStore {
        pub objects: Mutex<HashMap<String, Vec<u8>>>,
        pub writes: Mutex<usize>,
        pub fail_on: Vec<usize>,
    }

    impl MemoryObjectStore {
        pub fn failing_on(fail_on: &[usize]) -> Self {
            Self {
                fail_on: fail_on.to_vec(),
                ..Default::default()
            }
        }
    }

    impl ObjectStore for MemoryObjectStore {
        fn write(&self, shop_id: &str, file_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
            let n = {
                let mut writes = self.writes.lock().unwrap();
                *writes += 1;
                *writes
            };
            if self.fail_on.contains(&n) {
                return Err(StoreError::Unavailable(format!("write #{n} refused")));
            }
            let url = format!("mem://{shop_id}/{n}-{file_name}");
            self.objects.lock().unwrap().insert(url.clone(), bytes.to_vec());
            Ok(url)
        }

        fn read(&self, url: &str) -> Result<Vec<u8>, StoreError> {
            self.objects
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(url.to_string()))
        }
    }

    #[derive(Default)]
    pub struct MemoryRecordSink {
        pub records: Mutex<Vec<RepairOrderRecord>>,
        pub fail: bool,
    }

    impl RecordSink for MemoryRecordSink {
        fn insert(&self, record: &RepairOrderRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("sink down".into()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::*;
    use super::*;

    #[test]
    fn memory_store_round_trip_and_failure() {
        let store = MemoryObjectStore::failing_on(&[2]);
        let url = store.write("shop-1", "a.pdf", b"one").unwrap();
        assert_eq!(store.read(&url).unwrap(), b"one");
        assert!(store.write("shop-1", "b.pdf", b"two").is_err());
        assert!(store.write("shop-1", "c.pdf", b"three").is_ok());
        assert!(matches!(store.read("mem://nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn traits_are_object_safe() {
        let _store: Box<dyn ObjectStore> = Box::new(MemoryObjectStore::default());
        let _sink: Box<dyn RecordSink> = Box::new(MemoryRecordSink::default());
    }
}
