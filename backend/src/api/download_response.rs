//! Box file download responses.

use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::error::AppError;
use crate::services::catalog_service::ResolvedArtifact;
use crate::services::metrics_service;
use crate::storage::StorageBackend;

/// Content type of `.box` files
pub const BOX_CONTENT_TYPE: &str = "application/octet-stream";

/// Box file content served as an attachment
pub struct DownloadResponse {
    data: Bytes,
    filename: String,
}

impl DownloadResponse {
    pub fn new(data: Bytes, filename: impl Into<String>) -> Self {
        Self {
            data,
            filename: filename.into(),
        }
    }
}

impl IntoResponse for DownloadResponse {
    fn into_response(self) -> Response {
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, BOX_CONTENT_TYPE)
            .header(CONTENT_LENGTH, self.data.len())
            .header(
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .body(Body::from(self.data))
            .unwrap_or_else(|e| {
                AppError::Internal(format!("failed to build download response: {}", e))
                    .into_response()
            })
    }
}

/// Read a resolved box file out of storage.
pub async fn serve_artifact<S: StorageBackend + ?Sized>(
    storage: &S,
    artifact: &ResolvedArtifact,
) -> Result<DownloadResponse, AppError> {
    let data = storage.get(&artifact.storage_key).await?;
    tracing::debug!(
        key = %artifact.storage_key,
        size = data.len(),
        "Serving box file"
    );
    metrics_service::record_artifact_download(&artifact.provider, data.len() as u64);

    Ok(DownloadResponse::new(data, artifact.file_name.as_str()))
}
