pub mod api; // Intake HTTP API
pub mod config;
pub mod models;
pub mod db;
pub mod pipeline; // Extraction → segmentation → fields → resolution → batch

use tracing_subscriber::EnvFilter;

use crate::api::{start_intake_server, ApiContext};
use crate::config::IntakeConfig;
use crate::pipeline::batch::SqliteStore;
use crate::pipeline::reconcile::start_reconciler;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Process entry point: logging, runtime, server until Ctrl-C.
pub fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = IntakeConfig::from_env();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

/// Open storage, start the orphan reconciler and serve the API until
/// Ctrl-C.
pub async fn serve(config: IntakeConfig) -> Result<(), StartupError> {
    std::fs::create_dir_all(&config.storage_dir)?;
    let conn = db::sqlite::open_database(&config.database_path)?;
    tracing::info!(
        database = %config.database_path.display(),
        storage = %config.storage_dir.display(),
        "Storage ready"
    );

    let store = SqliteStore::new(conn);
    let reconciler = start_reconciler(store.clone());
    let addr = config.bind_addr;
    let ctx = ApiContext::new(config, store).with_reconciler(reconciler);

    let server = start_intake_server(ctx, addr)
        .await
        .map_err(StartupError::Server)?;
    tracing::info!(addr = %server.session.server_addr, "Accepting uploads");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    server.stop().await;
    Ok(())
}
