//! Orphan reconciliation.
//!
//! When a customer is created outside intake, the shop's orphan repair
//! orders are re-run through the resolver against a fresh directory
//! snapshot. Matches are attached in place. This runs off the batch path:
//! producers send a `ReconcileEvent` to a background thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::repository::{attach_orphan, list_orphan_repair_orders, load_directory_snapshot};
use crate::db::DatabaseError;
use crate::pipeline::batch::SqliteStore;
use crate::pipeline::resolution::resolve;

/// Poll interval for shutdown checks while idle.
const RECV_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub shop_id: String,
    pub examined: usize,
    pub attached: Vec<Uuid>,
}

/// Re-resolve every orphan of `shop_id` and attach the ones that now match.
pub fn reconcile_orphans(conn: &Connection, shop_id: &str) -> Result<ReconcileSummary, DatabaseError> {
    let snapshot = load_directory_snapshot(conn, shop_id)?;
    let orphans = list_orphan_repair_orders(conn, shop_id)?;

    let mut summary = ReconcileSummary {
        shop_id: shop_id.to_string(),
        examined: orphans.len(),
        attached: Vec::new(),
    };

    for orphan in &orphans {
        let resolution = resolve(&orphan.temp_fields(), &snapshot);
        let Some(customer_id) = resolution.customer_id.as_deref() else {
            continue;
        };
        attach_orphan(conn, &orphan.id, customer_id, resolution.vehicle_id.as_deref())?;
        summary.attached.push(orphan.id);
    }

    tracing::info!(
        shop_id,
        examined = summary.examined,
        attached = summary.attached.len(),
        "Reconciled orphan repair orders"
    );
    Ok(summary)
}

// ═══════════════════════════════════════════
// Background reconciler
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    CustomerCreated { shop_id: String },
}

/// Handle for the background reconciler thread.
///
/// Shuts down on `shutdown()` or on `Drop`; queued events that have not
/// been picked up are discarded.
pub struct ReconcilerHandle {
    sender: Sender<ReconcileEvent>,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ReconcilerHandle {
    /// Queue a reconciliation. Returns false if the thread is gone.
    pub fn notify(&self, event: ReconcileEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn customer_created(&self, shop_id: &str) -> bool {
        self.notify(ReconcileEvent::CustomerCreated {
            shop_id: shop_id.to_string(),
        })
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for ReconcilerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the reconciler on its own thread, sharing the SQLite store.
pub fn start_reconciler(store: SqliteStore) -> ReconcilerHandle {
    let (sender, receiver) = mpsc::channel::<ReconcileEvent>();
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!("Orphan reconciler started");
        while !flag.load(Ordering::Relaxed) {
            match receiver.recv_timeout(RECV_TIMEOUT) {
                Ok(event) => handle_event(&store, &event),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::info!("Orphan reconciler stopped");
    });

    ReconcilerHandle {
        sender,
        shutdown,
        handle: Some(handle),
    }
}

fn handle_event(store: &SqliteStore, event: &ReconcileEvent) {
    let ReconcileEvent::CustomerCreated { shop_id } = event;
    let result = store
        .conn()
        .map_err(|e| e.to_string())
        .and_then(|conn| reconcile_orphans(&conn, shop_id).map_err(|e| e.to_string()));

    if let Err(e) = result {
        tracing::warn!(shop_id = %shop_id, error = %e, "Orphan reconciliation failed");
    }
}
