//! Intake API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the intake router over a pre-constructed context.
///
/// Stored segments are served read-only under the path of the public
/// base URL so every handed-out `file_url` resolves.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn intake_router(ctx: ApiContext) -> Router {
    let body_limit = ctx.config.max_request_bytes();
    let files_route = ctx.config.files_route();
    let files = ServeDir::new(&ctx.config.storage_dir);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/repair-orders/upload", post(endpoints::repair_orders::upload))
        .route("/batches", post(endpoints::batches::create))
        .route(
            "/batches/:batch_id",
            get(endpoints::batches::detail).delete(endpoints::batches::cancel),
        )
        .route("/batches/:batch_id/analyze", post(endpoints::batches::analyze))
        .route("/batches/:batch_id/commit", post(endpoints::batches::commit))
        .route(
            "/batches/:batch_id/items/:item_id",
            delete(endpoints::batches::remove_item),
        )
        .route(
            "/batches/:batch_id/items/:item_id/selection",
            post(endpoints::batches::select),
        )
        .route(
            "/batches/:batch_id/items/:item_id/retry",
            post(endpoints::batches::retry),
        )
        .route("/shops/:shop_id/orphans", get(endpoints::orphans::list))
        .route(
            "/shops/:shop_id/orphans/reconcile",
            post(endpoints::orphans::reconcile),
        )
        .route(
            "/shops/:shop_id/events/customer-created",
            post(endpoints::orphans::customer_created),
        )
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api", api)
        .nest_service(&files_route, files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
