//! Repair-order ingestion pipeline.
//!
//! raw PDF → segmentation (page text + header markers) → field extraction
//! → entity resolution → batch persistence (matched or orphan).

pub mod import;
pub mod extraction;
pub mod segmentation;
pub mod fields;
pub mod resolution;
pub mod batch; // Operator upload sessions and persistence
pub mod reconcile;
