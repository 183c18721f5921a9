//! Shared types for the intake API layer.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::config::IntakeConfig;
use crate::pipeline::batch::{FsObjectStore, ObjectStore, SqliteStore, UploadBatch};
use crate::pipeline::extraction::{LopdfTextExtractor, TextExtractor};
use crate::pipeline::reconcile::ReconcilerHandle;

// ═══════════════════════════════════════════════════════════
// API context — shared state for the intake router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<IntakeConfig>,
    /// Directory source and record sink.
    pub db: SqliteStore,
    pub objects: Arc<dyn ObjectStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub batches: Arc<Mutex<BatchSessions>>,
    /// Background orphan reconciler; absent in tests that don't need it.
    pub reconciler: Option<Arc<ReconcilerHandle>>,
}

impl ApiContext {
    /// Production wiring: lopdf extraction and the filesystem object store
    /// rooted at `config.storage_dir`.
    pub fn new(config: IntakeConfig, db: SqliteStore) -> Self {
        let objects = FsObjectStore::new(&config.storage_dir, &config.public_base_url);
        Self::with_parts(config, db, Arc::new(objects), Arc::new(LopdfTextExtractor))
    }

    pub fn with_parts(
        config: IntakeConfig,
        db: SqliteStore,
        objects: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            objects,
            extractor,
            batches: Arc::new(Mutex::new(BatchSessions::new())),
            reconciler: None,
        }
    }

    pub fn with_reconciler(mut self, handle: ReconcilerHandle) -> Self {
        self.reconciler = Some(Arc::new(handle));
        self
    }

    /// Short-held lock on the session table. Never hold across an await.
    pub fn sessions(&self) -> Result<MutexGuard<'_, BatchSessions>, ApiError> {
        self.batches
            .lock()
            .map_err(|_| ApiError::Internal("batch session lock poisoned".into()))
    }

    /// Run a short synchronous operation on a batch in place.
    pub fn with_batch<R>(
        &self,
        batch_id: Uuid,
        f: impl FnOnce(&mut UploadBatch) -> R,
    ) -> Result<R, ApiError> {
        let mut sessions = self.sessions()?;
        let batch = sessions.get_mut(batch_id)?;
        Ok(f(batch))
    }

    /// Run a blocking operation on a batch without holding the session lock.
    ///
    /// The batch is checked out for the duration; concurrent requests for
    /// the same batch get 409 until it is checked back in.
    pub async fn run_on_batch<R, F>(&self, batch_id: Uuid, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut UploadBatch, &ApiContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut batch = self.sessions()?.checkout(batch_id)?;
        let ctx = self.clone();

        // Checked in from the blocking task, which outlives a dropped request.
        let result = tokio::task::spawn_blocking(move || {
            let out = f(&mut batch, &ctx);
            ctx.sessions().map(|mut sessions| sessions.checkin(batch))?;
            Ok::<R, ApiError>(out)
        })
        .await;

        match result {
            Ok(out) => out,
            Err(e) => {
                // The batch was lost with the panicked task.
                self.sessions()?.forget(batch_id);
                Err(e.into())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Batch sessions — in-memory operator upload sessions
// ═══════════════════════════════════════════════════════════

/// Live upload batches keyed by id.
///
/// A batch is checked out while a blocking step (commit, retry) runs on it.
#[derive(Default)]
pub struct BatchSessions {
    active: HashMap<Uuid, UploadBatch>,
    checked_out: HashSet<Uuid>,
}

impl BatchSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, batch: UploadBatch) -> Uuid {
        let id = batch.id();
        self.active.insert(id, batch);
        id
    }

    pub fn get(&self, batch_id: Uuid) -> Result<&UploadBatch, ApiError> {
        self.check_available(batch_id)?;
        self.active
            .get(&batch_id)
            .ok_or_else(|| not_found(batch_id))
    }

    pub fn get_mut(&mut self, batch_id: Uuid) -> Result<&mut UploadBatch, ApiError> {
        self.check_available(batch_id)?;
        self.active
            .get_mut(&batch_id)
            .ok_or_else(|| not_found(batch_id))
    }

    pub fn checkout(&mut self, batch_id: Uuid) -> Result<UploadBatch, ApiError> {
        self.check_available(batch_id)?;
        let batch = self
            .active
            .remove(&batch_id)
            .ok_or_else(|| not_found(batch_id))?;
        self.checked_out.insert(batch_id);
        Ok(batch)
    }

    pub fn checkin(&mut self, batch: UploadBatch) {
        self.checked_out.remove(&batch.id());
        self.active.insert(batch.id(), batch);
    }

    pub fn forget(&mut self, batch_id: Uuid) {
        self.checked_out.remove(&batch_id);
    }

    /// Remove a batch for good (cancel).
    pub fn remove(&mut self, batch_id: Uuid) -> Result<UploadBatch, ApiError> {
        self.check_available(batch_id)?;
        self.active
            .remove(&batch_id)
            .ok_or_else(|| not_found(batch_id))
    }

    /// Drop a batch whose items are all persisted. A busy batch stays.
    pub fn evict_if_done(&mut self, batch_id: Uuid) -> bool {
        let done = self.active.get(&batch_id).is_some_and(UploadBatch::is_done);
        if done {
            self.active.remove(&batch_id);
        }
        done
    }

    /// Drop idle batches opened before `cutoff`. Checked-out batches are
    /// left alone. Returns the number dropped.
    pub fn evict_older_than(&mut self, cutoff: NaiveDateTime) -> usize {
        let before = self.active.len();
        self.active.retain(|_, batch| batch.created_at() >= cutoff);
        before - self.active.len()
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.checked_out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self, batch_id: Uuid) -> Result<(), ApiError> {
        if self.checked_out.contains(&batch_id) {
            return Err(ApiError::Conflict(format!(
                "batch {batch_id} is busy, try again"
            )));
        }
        Ok(())
    }
}

fn not_found(batch_id: Uuid) -> ApiError {
    ApiError::NotFound(format!("batch {batch_id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DirectorySnapshot;

    fn batch() -> UploadBatch {
        UploadBatch::new("shop-1", Arc::new(DirectorySnapshot::default()))
    }

    #[test]
    fn checkout_blocks_access_until_checkin() {
        let mut sessions = BatchSessions::new();
        let id = sessions.insert(batch());

        let taken = sessions.checkout(id).unwrap();
        assert!(matches!(sessions.get(id), Err(ApiError::Conflict(_))));
        assert!(matches!(sessions.checkout(id), Err(ApiError::Conflict(_))));
        assert_eq!(sessions.len(), 1);

        sessions.checkin(taken);
        assert!(sessions.get(id).is_ok());
    }

    #[test]
    fn unknown_batch_is_not_found() {
        let mut sessions = BatchSessions::new();
        assert!(matches!(sessions.get(Uuid::new_v4()), Err(ApiError::NotFound(_))));
        assert!(matches!(sessions.remove(Uuid::new_v4()), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn forget_releases_checkout() {
        let mut sessions = BatchSessions::new();
        let id = sessions.insert(batch());
        let _lost = sessions.checkout(id).unwrap();
        sessions.forget(id);
        assert!(sessions.is_empty());
        assert!(matches!(sessions.get(id), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn done_batch_is_evicted() {
        let mut sessions = BatchSessions::new();
        let empty = sessions.insert(batch());
        assert!(sessions.evict_if_done(empty));
        assert!(matches!(sessions.get(empty), Err(ApiError::NotFound(_))));

        let mut open = batch();
        open.queue_raw("raw.pdf", b"%PDF-1.4".to_vec());
        let open = sessions.insert(open);
        assert!(!sessions.evict_if_done(open));
        assert!(sessions.get(open).is_ok());
    }

    #[test]
    fn expired_batches_are_swept() {
        let mut sessions = BatchSessions::new();
        let old = sessions.insert(batch());
        let busy = sessions.insert(batch());
        let taken = sessions.checkout(busy).unwrap();

        let cutoff = chrono::Local::now().naive_local() + chrono::Duration::seconds(1);
        assert_eq!(sessions.evict_older_than(cutoff), 1);
        assert!(matches!(sessions.get(old), Err(ApiError::NotFound(_))));

        sessions.checkin(taken);
        assert_eq!(sessions.len(), 1);

        let past = chrono::Local::now().naive_local() - chrono::Duration::hours(1);
        assert_eq!(sessions.evict_older_than(past), 0);
    }
}
