//! Common test utilities for catalog API tests
//!
//! Builds the full router over an in-memory catalog store and a temporary
//! box directory, so tests run without PostgreSQL.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use alley_backend::api::{self, AppState};
use alley_backend::config::Config;
use alley_backend::services::admin_service::AdminService;
use alley_backend::storage::filesystem::FilesystemStorage;
use alley_backend::store::MemoryCatalogStore;

/// Router plus handles on its backing stores
pub struct TestApp {
    pub router: Router,
    pub admin: AdminService,
    pub store: Arc<MemoryCatalogStore>,
    pub dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = Arc::new(MemoryCatalogStore::new());
        let storage = Arc::new(FilesystemStorage::new(dir.path()));

        let mut config = Config::for_local(dir.path().to_string_lossy());
        config.public_url = fixtures::PUBLIC_URL.to_string();

        let state = Arc::new(AppState::new(config, store.clone(), storage.clone()));
        Self {
            router: api::routes::create_router(state),
            admin: AdminService::new(store.clone(), storage),
            store,
            dir,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = self.get(uri).await;
        let status = response.status();
        let bytes = body_bytes(response).await;
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|e| panic!("{} returned non-JSON body: {}", uri, e));
        (status, value)
    }
}

pub async fn body_bytes(response: Response<Body>) -> bytes::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}
