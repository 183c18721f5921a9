//! Operator batch endpoints: upload, review, commit, recover.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::endpoints::form::read_upload_form;
use crate::api::endpoints::load_snapshot;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::pipeline::batch::{analyze_documents, BatchReport, ManualSelection, UploadBatch};

/// Operator override body.
///
/// Either `{"customer_id": "...", "vehicle_id": "..."}` or
/// `{"store_for_later": true}`.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionRequest {
    pub customer_id: Option<String>,
    pub vehicle_id: Option<String>,
    #[serde(default)]
    pub store_for_later: bool,
}

impl SelectionRequest {
    pub fn into_selection(self) -> Result<ManualSelection, ApiError> {
        let customer_id = self.customer_id.filter(|id| !id.trim().is_empty());
        let vehicle_id = self.vehicle_id.filter(|id| !id.trim().is_empty());

        match (self.store_for_later, customer_id) {
            (true, None) if vehicle_id.is_none() => Ok(ManualSelection::StoreForLater),
            (true, _) => Err(ApiError::BadRequest(
                "store_for_later cannot be combined with a customer or vehicle".into(),
            )),
            (false, Some(customer_id)) => Ok(ManualSelection::Assign {
                customer_id,
                vehicle_id,
            }),
            (false, None) => Err(ApiError::BadRequest(
                "customer_id or store_for_later is required".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub batch_id: Uuid,
    pub dropped: usize,
    pub kept: usize,
}

/// `POST /api/batches` — open a batch from uploaded files.
///
/// With segmentation on (the configured default, or `segment=true`) files
/// are analyzed immediately; otherwise they wait as `pending` until
/// `/analyze`.
pub async fn create(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), ApiError> {
    let form = read_upload_form(multipart, &ctx.config).await?;
    let segment = form.segment.unwrap_or(ctx.config.auto_segmentation);
    let (shop_id, documents) = form.into_documents();

    let snapshot = load_snapshot(&ctx, &shop_id).await?;
    let mut batch = UploadBatch::new(&shop_id, snapshot.clone());

    if segment {
        let items = analyze_documents(documents, ctx.extractor.clone(), snapshot, batch.context()).await;
        batch.add_analyzed(items);
    } else {
        for (file_name, bytes) in documents {
            batch.queue_raw(&file_name, bytes);
        }
    }

    let report = batch.report();
    {
        let mut sessions = ctx.sessions()?;
        let expired = sessions.evict_older_than(ctx.config.batch_cutoff());
        if expired > 0 {
            tracing::info!(expired, "Dropped expired batches");
        }
        sessions.insert(batch);
    }

    tracing::info!(
        batch_id = %report.batch_id,
        shop_id = %report.shop_id,
        items = report.total,
        segment,
        "Batch opened"
    );
    Ok((StatusCode::CREATED, Json(report)))
}

/// `GET /api/batches/:batch_id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchReport>, ApiError> {
    let report = ctx.sessions()?.get(batch_id)?.report();
    Ok(Json(report))
}

/// `POST /api/batches/:batch_id/analyze` — segment and analyze pending
/// files, one blocking task per file.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchReport>, ApiError> {
    // Spawned so a dropped request cannot strand the checked-out batch.
    let report = tokio::spawn(async move {
        let mut batch = ctx.sessions()?.checkout(batch_id)?;

        let pending = batch.take_pending();
        let items =
            analyze_documents(pending, ctx.extractor.clone(), batch.snapshot(), batch.context()).await;
        batch.add_analyzed(items);

        let report = batch.report();
        ctx.sessions()?.checkin(batch);
        Ok::<_, ApiError>(report)
    })
    .await??;
    Ok(Json(report))
}

/// `POST /api/batches/:batch_id/items/:item_id/selection`
pub async fn select(
    State(ctx): State<ApiContext>,
    Path((batch_id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SelectionRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let selection = request.into_selection()?;
    let report = ctx.with_batch(batch_id, |batch| {
        batch.select(item_id, selection).map(|_| batch.report())
    })??;
    Ok(Json(report))
}

/// `POST /api/batches/:batch_id/commit` — persist every reviewed item.
pub async fn commit(
    State(ctx): State<ApiContext>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<BatchReport>, ApiError> {
    let report = ctx
        .run_on_batch(batch_id, |batch, ctx| {
            batch.commit(ctx.objects.as_ref(), &ctx.db)
        })
        .await?;
    if report.done && ctx.sessions()?.evict_if_done(batch_id) {
        tracing::info!(batch_id = %batch_id, "Batch complete, session closed");
    }
    Ok(Json(report))
}

/// `POST /api/batches/:batch_id/items/:item_id/retry` — re-analyze an
/// errored item from its retained bytes.
pub async fn retry(
    State(ctx): State<ApiContext>,
    Path((batch_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BatchReport>, ApiError> {
    let report = ctx
        .run_on_batch(batch_id, move |batch, ctx| {
            batch
                .retry(item_id, ctx.extractor.as_ref())
                .map(|_| batch.report())
        })
        .await??;
    Ok(Json(report))
}

/// `DELETE /api/batches/:batch_id/items/:item_id`
pub async fn remove_item(
    State(ctx): State<ApiContext>,
    Path((batch_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<BatchReport>, ApiError> {
    let report = ctx.with_batch(batch_id, |batch| {
        batch.remove(item_id).map(|_| batch.report())
    })??;
    Ok(Json(report))
}

/// `DELETE /api/batches/:batch_id` — drop unpersisted items and close the
/// session. Completed items are not rolled back.
pub async fn cancel(
    State(ctx): State<ApiContext>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let mut batch = ctx.sessions()?.remove(batch_id)?;
    let dropped = batch.cancel();
    Ok(Json(CancelResponse {
        batch_id,
        dropped,
        kept: batch.items().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_request_variants() {
        let assign = SelectionRequest {
            customer_id: Some("c1".into()),
            vehicle_id: Some("v1".into()),
            store_for_later: false,
        };
        assert_eq!(
            assign.into_selection().unwrap(),
            ManualSelection::Assign {
                customer_id: "c1".into(),
                vehicle_id: Some("v1".into()),
            }
        );

        let later = SelectionRequest {
            store_for_later: true,
            ..Default::default()
        };
        assert_eq!(later.into_selection().unwrap(), ManualSelection::StoreForLater);
    }

    #[test]
    fn selection_request_rejects_ambiguity() {
        let both = SelectionRequest {
            customer_id: Some("c1".into()),
            store_for_later: true,
            ..Default::default()
        };
        assert!(both.into_selection().is_err());

        let blank = SelectionRequest {
            customer_id: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.into_selection().is_err());
        assert!(SelectionRequest::default().into_selection().is_err());
    }
}
