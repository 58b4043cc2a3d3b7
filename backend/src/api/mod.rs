//! API module - HTTP handlers and middleware.

pub mod download_response;
pub mod handlers;
pub mod middleware;
pub mod routes;

use crate::config::Config;
use crate::services::catalog_service::CatalogService;
use crate::storage::StorageBackend;
use crate::store::CatalogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn CatalogStore>,
    pub storage: Arc<dyn StorageBackend>,
    pub catalog: CatalogService,
    pub metrics_handle: Option<Arc<PrometheusHandle>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        let catalog = CatalogService::new(store.clone(), storage.clone(), config.public_url.clone());
        Self {
            config,
            store,
            storage,
            catalog,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle for rendering /metrics output.
    pub fn set_metrics_handle(&mut self, handle: PrometheusHandle) {
        self.metrics_handle = Some(Arc::new(handle));
    }
}

pub type SharedState = Arc<AppState>;
