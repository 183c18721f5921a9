//! Orphan repair orders: listing and reconciliation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::api::endpoints::form::valid_shop_id;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::list_orphan_repair_orders;
use crate::models::RepairOrderRecord;
use crate::pipeline::reconcile::{reconcile_orphans, ReconcileSummary};

#[derive(Debug, Serialize)]
pub struct EventAccepted {
    pub shop_id: String,
    pub queued: bool,
}

fn checked_shop_id(shop_id: String) -> Result<String, ApiError> {
    if valid_shop_id(&shop_id) {
        Ok(shop_id)
    } else {
        Err(ApiError::BadRequest(format!("Invalid shop_id: {shop_id}")))
    }
}

/// `GET /api/shops/:shop_id/orphans`
pub async fn list(
    State(ctx): State<ApiContext>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<RepairOrderRecord>>, ApiError> {
    let shop_id = checked_shop_id(shop_id)?;
    let db = ctx.db.clone();
    let orphans = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = db.conn()?;
        Ok(list_orphan_repair_orders(&conn, &shop_id)?)
    })
    .await??;
    Ok(Json(orphans))
}

/// `POST /api/shops/:shop_id/orphans/reconcile` — synchronous pass.
pub async fn reconcile(
    State(ctx): State<ApiContext>,
    Path(shop_id): Path<String>,
) -> Result<Json<ReconcileSummary>, ApiError> {
    let shop_id = checked_shop_id(shop_id)?;
    let db = ctx.db.clone();
    let summary = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = db.conn()?;
        Ok(reconcile_orphans(&conn, &shop_id)?)
    })
    .await??;
    Ok(Json(summary))
}

/// `POST /api/shops/:shop_id/events/customer-created` — queue a background
/// reconciliation for the shop.
pub async fn customer_created(
    State(ctx): State<ApiContext>,
    Path(shop_id): Path<String>,
) -> Result<(StatusCode, Json<EventAccepted>), ApiError> {
    let shop_id = checked_shop_id(shop_id)?;
    let queued = ctx
        .reconciler
        .as_ref()
        .is_some_and(|reconciler| reconciler.customer_created(&shop_id));

    if !queued {
        tracing::warn!(shop_id = %shop_id, "Reconciler unavailable, event dropped");
    }
    Ok((StatusCode::ACCEPTED, Json(EventAccepted { shop_id, queued })))
}
