//! One-shot upload: segment, analyze and persist in a single request.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::form::read_upload_form;
use crate::api::endpoints::load_snapshot;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::batch::{analyze_documents, UploadBatch, UploadStatus};

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub file_url: String,
    /// At least one field was extracted from the segment.
    pub analyzed: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub count: usize,
    pub results: Vec<UploadResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<UploadFailure>,
}

/// `POST /api/repair-orders/upload` — auto-segmentation intake.
///
/// Every segment of every file is stored and recorded; matched or not.
/// Per-segment failures are reported in `errors` and do not fail the
/// request.
pub async fn upload(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload_form(multipart, &ctx.config).await?;
    let (shop_id, documents) = form.into_documents();
    let file_count = documents.len();

    let snapshot = load_snapshot(&ctx, &shop_id).await?;
    let mut batch = UploadBatch::new(&shop_id, snapshot.clone());
    let items = analyze_documents(documents, ctx.extractor.clone(), snapshot, batch.context()).await;
    batch.add_analyzed(items);

    let store = ctx.clone();
    let report =
        tokio::task::spawn_blocking(move || batch.commit(store.objects.as_ref(), &store.db)).await?;

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for item in &report.items {
        match (&item.status, &item.file_url) {
            (UploadStatus::Complete, Some(url)) => results.push(UploadResult {
                file_url: url.clone(),
                analyzed: item.analyzed(),
            }),
            _ => errors.push(UploadFailure {
                file_name: item.file_name.clone(),
                error: item
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("left in status {}", item.status)),
            }),
        }
    }

    tracing::info!(
        shop_id = %shop_id,
        files = file_count,
        stored = results.len(),
        failed = errors.len(),
        "Repair-order upload processed"
    );

    Ok(Json(UploadResponse {
        success: errors.is_empty(),
        count: results.len(),
        results,
        errors,
    }))
}
