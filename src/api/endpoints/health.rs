//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::sqlite::{schema_version, LATEST_SCHEMA_VERSION};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub open_batches: usize,
    pub version: &'static str,
}

/// `GET /api/health` — liveness plus a database round-trip that checks
/// the schema is fully migrated.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let db = ctx.db.clone();
    let database = tokio::task::spawn_blocking(move || {
        db.conn()
            .ok()
            .and_then(|conn| schema_version(&conn).ok())
            .is_some_and(|version| version == LATEST_SCHEMA_VERSION)
    })
    .await?;

    let open_batches = ctx.sessions()?.len();

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        open_batches,
        version: crate::config::APP_VERSION,
    }))
}
