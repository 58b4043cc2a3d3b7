//! Vagrant catalog endpoints.
//!
//! Every catalog route is served by one wildcard: the path is handed to the
//! grammar parser, the parsed query to the resolver, and the resolution is
//! rendered as JSON or streamed as a box file.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::api::download_response::serve_artifact;
use crate::api::SharedState;
use crate::error::Result;
use crate::formats::catalog_document::{render, render_json};
use crate::formats::vagrant::parse_path;
use crate::services::catalog_service::Resolution;

const JSON_CONTENT_TYPE: &str = "application/json";

/// GET / - no owner named
pub async fn catalog_root(State(state): State<SharedState>) -> Result<Response> {
    respond(&state, "").await
}

/// GET /*path
///
/// Takes the raw URI path: the parser splits on literal `/` before any
/// percent-decoding.
pub async fn catalog_path(State(state): State<SharedState>, uri: Uri) -> Result<Response> {
    respond(&state, uri.path()).await
}

async fn respond(state: &SharedState, path: &str) -> Result<Response> {
    let query = parse_path(path)?;
    tracing::debug!(path, owner = %query.owner, "Resolving catalog path");

    let body = match state.catalog.resolve(&query).await? {
        Resolution::Artifact(artifact) => {
            return Ok(serve_artifact(state.storage.as_ref(), &artifact)
                .await?
                .into_response())
        }
        Resolution::Catalog(doc) => render(&doc)?,
        Resolution::BoxNames(names) => render_json(&names)?,
        Resolution::Versions(entries) => render_json(&entries)?,
        Resolution::Version(doc) => render_json(&doc)?,
        Resolution::Providers(entries) => render_json(&entries)?,
        Resolution::Provider(entry) => render_json(&entry)?,
    };

    Ok(json_response(body))
}

fn json_response(body: Bytes) -> Response {
    ([(CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
}
