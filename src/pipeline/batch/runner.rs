//! UploadBatch: drives items from upload to persisted repair orders.
//!
//! Analysis: segment → extract fields → resolve against the directory
//! snapshot. Persistence: object store write, then record insert. Each
//! item's failure stays on that item.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

use super::error::BatchError;
use super::traits::{ObjectStore, RecordSink};
use super::types::*;
use crate::models::{DirectorySnapshot, RepairOrderRecord};
use crate::pipeline::extraction::TextExtractor;
use crate::pipeline::fields::{extract_fields_with, ExtractContext};
use crate::pipeline::resolution::resolve;
use crate::pipeline::segmentation::segment_document;

// ═══════════════════════════════════════════
// Analysis (pure, shareable across threads)
// ═══════════════════════════════════════════

/// Analyze one uploaded document into reviewable items.
///
/// Never fails: a document that cannot be split yields a single `Error`
/// item that keeps the original bytes for retry.
pub fn analyze_document(
    file_name: &str,
    bytes: &[u8],
    extractor: &dyn TextExtractor,
    snapshot: &DirectorySnapshot,
    ctx: &ExtractContext,
) -> Vec<UploadItem> {
    let segments = match segment_document(bytes, extractor) {
        Ok(segments) => segments,
        Err(e) => {
            tracing::warn!(file = %file_name, error = %e, "Segmentation failed");
            let mut item = UploadItem::pending(file_name, bytes.to_vec());
            item.fail(format!("Segmentation failed: {e}"));
            return vec![item];
        }
    };

    segments
        .into_iter()
        .map(|segment| {
            let mut item = UploadItem::pending(file_name, segment.pdf_bytes);
            item.page_range = Some(segment.range);
            analyze_item(&mut item, &segment.text, snapshot, ctx);
            item
        })
        .collect()
}

/// Pending → Analyzing → Matched | Manual for one segmented item.
fn analyze_item(
    item: &mut UploadItem,
    text: &str,
    snapshot: &DirectorySnapshot,
    ctx: &ExtractContext,
) {
    if let Err(e) = item.transition(UploadStatus::Analyzing) {
        item.fail(e.to_string());
        return;
    }

    let fields = extract_fields_with(text, ctx);
    let resolution = resolve(&fields, snapshot);
    let next = if resolution.is_matched() {
        UploadStatus::Matched
    } else {
        UploadStatus::Manual
    };

    item.fields = Some(fields);
    item.resolution = Some(resolution);
    if let Err(e) = item.transition(next) {
        item.fail(e.to_string());
    }
}

/// Analyze independent documents in parallel, one blocking task each.
///
/// Documents share only the extractor and the immutable snapshot. Results
/// keep input order.
pub async fn analyze_documents(
    documents: Vec<(String, Vec<u8>)>,
    extractor: Arc<dyn TextExtractor>,
    snapshot: Arc<DirectorySnapshot>,
    ctx: ExtractContext,
) -> Vec<UploadItem> {
    let tasks = documents.into_iter().map(|(file_name, bytes)| {
        let extractor = extractor.clone();
        let snapshot = snapshot.clone();
        async move {
            let name = file_name.clone();
            let retained = bytes.clone();
            tokio::task::spawn_blocking(move || {
                analyze_document(&file_name, &bytes, extractor.as_ref(), &snapshot, &ctx)
            })
            .await
            .unwrap_or_else(|e| {
                tracing::error!(file = %name, error = %e, "Analysis task panicked");
                let mut item = UploadItem::pending(&name, retained);
                item.fail(BatchError::TaskFailed(e.to_string()).to_string());
                vec![item]
            })
        }
    });

    futures_util::future::join_all(tasks)
        .await
        .into_iter()
        .flatten()
        .collect()
}

// ═══════════════════════════════════════════
// Upload Batch
// ═══════════════════════════════════════════

/// One operator upload session.
pub struct UploadBatch {
    id: Uuid,
    shop_id: String,
    snapshot: Arc<DirectorySnapshot>,
    items: Vec<UploadItem>,
    created_at: NaiveDateTime,
    ctx: ExtractContext,
}

impl UploadBatch {
    /// Start a batch against a directory snapshot loaded once up front.
    pub fn new(shop_id: &str, snapshot: Arc<DirectorySnapshot>) -> Self {
        Self::with_context(shop_id, snapshot, ExtractContext::today())
    }

    pub fn with_context(shop_id: &str, snapshot: Arc<DirectorySnapshot>, ctx: ExtractContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            shop_id: shop_id.to_string(),
            snapshot,
            items: Vec::new(),
            created_at: Local::now().naive_local(),
            ctx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn shop_id(&self) -> &str {
        &self.shop_id
    }

    pub fn snapshot(&self) -> Arc<DirectorySnapshot> {
        self.snapshot.clone()
    }

    pub fn context(&self) -> ExtractContext {
        self.ctx
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub fn item(&self, item_id: Uuid) -> Option<&UploadItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    fn position(&self, item_id: Uuid) -> Result<usize, BatchError> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or(BatchError::ItemNotFound(item_id))
    }

    // ── Intake ──────────────────────────────────────────────

    /// Auto-segmentation intake: analyze now, items enter reviewable.
    pub fn add_document(&mut self, file_name: &str, bytes: &[u8], extractor: &dyn TextExtractor) -> Vec<Uuid> {
        let items = analyze_document(file_name, bytes, extractor, &self.snapshot, &self.ctx);
        self.add_analyzed(items)
    }

    /// Append items analyzed elsewhere (e.g. by `analyze_documents`).
    pub fn add_analyzed(&mut self, items: Vec<UploadItem>) -> Vec<Uuid> {
        let ids = items.iter().map(|i| i.id).collect();
        self.items.extend(items);
        ids
    }

    /// Queue a raw file without analysis (segmentation disabled).
    pub fn queue_raw(&mut self, file_name: &str, bytes: Vec<u8>) -> Uuid {
        let item = UploadItem::pending(file_name, bytes);
        let id = item.id;
        self.items.push(item);
        id
    }

    /// Remove every pending item and hand back its (file name, bytes).
    pub fn take_pending(&mut self) -> Vec<(String, Vec<u8>)> {
        let (pending, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|i| i.status == UploadStatus::Pending);
        self.items = rest;
        pending.into_iter().map(|i| (i.file_name, i.bytes)).collect()
    }

    /// Segment and analyze every pending item. Each pending item is
    /// replaced by the items of its segments.
    pub fn analyze_pending(&mut self, extractor: &dyn TextExtractor) -> usize {
        let pending = self.take_pending();
        let count = pending.len();
        for (file_name, bytes) in pending {
            self.add_document(&file_name, &bytes, extractor);
        }
        tracing::info!(batch_id = %self.id, documents = count, "Analyzed pending documents");
        count
    }

    // ── Review ──────────────────────────────────────────────

    /// Operator override for a reviewable item.
    ///
    /// The customer must exist in the batch snapshot, and a chosen vehicle
    /// must belong to that customer.
    pub fn select(&mut self, item_id: Uuid, selection: ManualSelection) -> Result<(), BatchError> {
        if let ManualSelection::Assign {
            customer_id,
            vehicle_id,
        } = &selection
        {
            if self.snapshot.customer(customer_id).is_none() {
                return Err(BatchError::InvalidInput(format!("unknown customer {customer_id}")));
            }
            if let Some(vehicle_id) = vehicle_id {
                let owned = self
                    .snapshot
                    .vehicle(vehicle_id)
                    .is_some_and(|v| &v.customer_id == customer_id);
                if !owned {
                    return Err(BatchError::InvalidInput(format!(
                        "vehicle {vehicle_id} does not belong to customer {customer_id}"
                    )));
                }
            }
        }

        let index = self.position(item_id)?;
        let item = &mut self.items[index];
        if !item.status.is_reviewable() {
            return Err(BatchError::InvalidTransition {
                from: item.status.as_str(),
                to: "selection",
            });
        }
        item.selection = Some(selection);
        tracing::info!(batch_id = %self.id, item_id = %item_id, "Operator selection recorded");
        Ok(())
    }

    // ── Persistence ─────────────────────────────────────────

    /// Persist every reviewable item. Failures are recorded per item and
    /// never stop the remaining items.
    pub fn commit(&mut self, store: &dyn ObjectStore, sink: &dyn RecordSink) -> BatchReport {
        let mut completed = 0usize;
        let mut failed = 0usize;

        for item in self.items.iter_mut().filter(|i| i.status.is_reviewable()) {
            match persist_item(&self.shop_id, item, store, sink) {
                Ok(()) => completed += 1,
                Err(e) => {
                    tracing::warn!(
                        batch_id = %self.id,
                        item_id = %item.id,
                        error = %e,
                        "Failed to persist item"
                    );
                    item.fail(e.to_string());
                    failed += 1;
                }
            }
        }

        tracing::info!(batch_id = %self.id, completed, failed, "Batch commit finished");
        self.report()
    }

    // ── Recovery ────────────────────────────────────────────

    /// Re-queue an errored item as fresh items analyzed from its retained
    /// bytes. The errored item is dropped. An operator selection carries
    /// over when the bytes re-analyze to a single reviewable item.
    pub fn retry(&mut self, item_id: Uuid, extractor: &dyn TextExtractor) -> Result<Vec<Uuid>, BatchError> {
        let index = self.position(item_id)?;
        if self.items[index].status != UploadStatus::Error {
            return Err(BatchError::InvalidTransition {
                from: self.items[index].status.as_str(),
                to: "retry",
            });
        }

        let failed = self.items.remove(index);
        let mut fresh = analyze_document(
            &failed.file_name,
            &failed.bytes,
            extractor,
            &self.snapshot,
            &self.ctx,
        );
        if let ([item], Some(selection)) = (fresh.as_mut_slice(), failed.selection) {
            if item.status.is_reviewable() {
                item.selection = Some(selection);
            }
        }

        let ids: Vec<Uuid> = fresh.iter().map(|i| i.id).collect();
        for (offset, item) in fresh.into_iter().enumerate() {
            self.items.insert(index + offset, item);
        }
        tracing::info!(batch_id = %self.id, item_id = %item_id, requeued = ids.len(), "Retried item");
        Ok(ids)
    }

    /// Drop an item that has not been persisted.
    pub fn remove(&mut self, item_id: Uuid) -> Result<UploadItem, BatchError> {
        let index = self.position(item_id)?;
        if self.items[index].status == UploadStatus::Complete {
            return Err(BatchError::InvalidInput(format!(
                "item {item_id} is already persisted"
            )));
        }
        Ok(self.items.remove(index))
    }

    /// Drop every not-yet-persisted item. Completed items stay; nothing is
    /// rolled back. Returns the number of dropped items.
    pub fn cancel(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.status == UploadStatus::Complete);
        let dropped = before - self.items.len();
        tracing::info!(batch_id = %self.id, dropped, kept = self.items.len(), "Batch cancelled");
        dropped
    }

    // ── Reporting ───────────────────────────────────────────

    /// Done when every item is complete.
    pub fn is_done(&self) -> bool {
        self.items.iter().all(|i| i.status == UploadStatus::Complete)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for item in &self.items {
            match item.status {
                UploadStatus::Pending | UploadStatus::Analyzing => counts.pending += 1,
                UploadStatus::Matched => counts.matched += 1,
                UploadStatus::Manual => counts.manual += 1,
                UploadStatus::Uploading => counts.uploading += 1,
                UploadStatus::Complete => counts.complete += 1,
                UploadStatus::Error => counts.error += 1,
            }
        }
        counts
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            batch_id: self.id,
            shop_id: self.shop_id.clone(),
            created_at: self.created_at,
            total: self.items.len(),
            counts: self.counts(),
            done: self.is_done(),
            items: self.items.clone(),
        }
    }
}

/// Uploading → Complete: store the segment, then insert its record.
fn persist_item(
    shop_id: &str,
    item: &mut UploadItem,
    store: &dyn ObjectStore,
    sink: &dyn RecordSink,
) -> Result<(), BatchError> {
    item.transition(UploadStatus::Uploading)?;

    let url = store.write(shop_id, &item.file_name, &item.bytes)?;
    item.file_url = Some(url.clone());

    let (customer_id, vehicle_id) = item.effective_ids();
    let fields = item.fields.clone().unwrap_or_default();
    let record = RepairOrderRecord::from_extraction(shop_id, &url, &fields, customer_id, vehicle_id);
    sink.insert(&record)?;

    item.record_id = Some(record.id);
    item.transition(UploadStatus::Complete)?;

    tracing::debug!(
        item_id = %item.id,
        record_id = %record.id,
        matched = record.is_matched,
        "Persisted repair order"
    );
    Ok(())
}
