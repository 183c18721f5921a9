//! API endpoint handlers.
//!
//! Handlers stay thin: parse, call the pipeline, map errors. Blocking work
//! (SQLite, PDF parsing, object writes) runs on `spawn_blocking`.

pub mod batches;
pub mod form;
pub mod health;
pub mod orphans;
pub mod repair_orders;

use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::DirectorySnapshot;
use crate::pipeline::batch::DirectorySource;

/// Load the shop's directory once for a new batch.
pub(crate) async fn load_snapshot(
    ctx: &ApiContext,
    shop_id: &str,
) -> Result<Arc<DirectorySnapshot>, ApiError> {
    let db = ctx.db.clone();
    let shop_id = shop_id.to_string();
    let snapshot = tokio::task::spawn_blocking(move || db.snapshot(&shop_id)).await??;
    Ok(Arc::new(snapshot))
}
