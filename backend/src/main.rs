//! Alley - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use alley_backend::{
    api,
    config::Config,
    db,
    error::Result,
    services::metrics_service,
    storage::{filesystem::FilesystemStorage, StorageBackend},
    store::PgCatalogStore,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _otel_guard = telemetry::init_tracing(
        &config.log_level,
        config.otel_endpoint.as_deref(),
        &config.otel_service_name,
    )?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Alley");

    let db_pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Connected to database");

    db::run_migrations(&db_pool).await?;
    tracing::info!("Database migrations complete");

    let storage = FilesystemStorage::new(&config.storage_path);
    tokio::fs::create_dir_all(storage.base_path()).await?;
    storage.health_check().await?;
    tracing::info!(path = %config.storage_path, "Box storage ready");

    let metrics_handle = metrics_service::init_metrics()?;
    metrics_service::spawn_db_pool_gauge_refresh(db_pool.clone(), Duration::from_secs(15));
    tracing::info!("Prometheus metrics recorder initialized");

    let store = Arc::new(PgCatalogStore::new(db_pool));
    let mut app_state = api::AppState::new(config.clone(), store, Arc::new(storage));
    app_state.set_metrics_handle(metrics_handle);
    let state = Arc::new(app_state);

    let app = api::routes::build_app(state);

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
