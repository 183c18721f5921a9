use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::import::ImportError;

/// Failures of the consumed collaborators (object store, record sink,
/// directory source).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("PDF error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Upload rejected: {0}")]
    Import(#[from] ImportError),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Upload item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}
