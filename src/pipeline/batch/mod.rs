//! Batch upload orchestration.
//!
//! An `UploadBatch` owns the in-memory state of one operator upload: every
//! segment cut from the uploaded files becomes an `UploadItem` that moves
//! through a closed status machine until it is persisted or fails. Failures
//! are recorded on the item and never block its siblings.
//!
//! The collaborators the batch consumes (directory, object store, record
//! sink) are traits; `store` holds the filesystem and SQLite
//! implementations.

pub mod error;
pub mod types;
pub mod traits;
pub mod store;
pub mod runner;

pub use error::*;
pub use types::*;
pub use traits::*;
pub use store::*;
pub use runner::*;
