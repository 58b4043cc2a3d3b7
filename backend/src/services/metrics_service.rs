//! Prometheus metrics collection and HTTP request instrumentation.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Request, Response},
    middleware::Next,
};

use crate::error::{AppError, Result};

/// Initialize the Prometheus metrics recorder and return the handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Internal(format!("failed to install Prometheus recorder: {}", e)))
}

/// Axum middleware that records HTTP request metrics.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let route = route_label(request.uri().path());

    let start = Instant::now();
    counter!("alley_http_requests_total", "method" => method.clone(), "route" => route)
        .increment(1);
    gauge!("alley_http_requests_in_flight", "method" => method.clone(), "route" => route)
        .increment(1.0);

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    histogram!("alley_http_request_duration_seconds", "method" => method.clone(), "route" => route, "status" => status.clone()).record(duration);
    counter!("alley_http_responses_total", "method" => method.clone(), "route" => route, "status" => status).increment(1);
    gauge!("alley_http_requests_in_flight", "method" => method, "route" => route).decrement(1.0);

    response
}

/// Collapse a request path to its catalog route shape.
///
/// Owner, box, version and provider names are unbounded, so only the depth
/// and the artifact suffix survive as labels.
fn route_label(path: &str) -> &'static str {
    match path {
        "/health" | "/healthz" => "/health",
        "/ready" | "/readyz" => "/ready",
        "/metrics" => "/metrics",
        _ => {
            let trimmed = path.trim_matches('/');
            let depth = if trimmed.is_empty() {
                0
            } else {
                trimmed.split('/').count()
            };
            match depth {
                0 => "/",
                1 => "/:owner",
                2 if trimmed.ends_with(".json") => "/:owner/:box.json",
                2 => "/:owner/:box",
                3 => "/:owner/:box/version",
                4 => "/:owner/:box/version/:version",
                5 => "/:owner/:box/version/:version/provider",
                6 if trimmed.ends_with(".box") => "/:owner/:box/version/:version/provider/:provider.box",
                6 => "/:owner/:box/version/:version/provider/:provider",
                _ => "other",
            }
        }
    }
}

/// Record the outcome of one catalog resolution.
pub fn record_resolution<T>(target: &'static str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    };
    counter!("alley_catalog_resolutions_total", "target" => target, "outcome" => outcome)
        .increment(1);
}

/// Record a box file download.
pub fn record_artifact_download(provider: &str, size_bytes: u64) {
    counter!("alley_artifact_downloads_total", "provider" => provider.to_string()).increment(1);
    histogram!("alley_artifact_download_size_bytes", "provider" => provider.to_string())
        .record(size_bytes as f64);
}

/// Update database connection pool gauge metrics.
pub fn set_db_pool_gauges(pool: &sqlx::PgPool) {
    let size = pool.size() as f64;
    let idle = pool.num_idle() as f64;
    gauge!("alley_db_pool_connections_active").set(size - idle);
    gauge!("alley_db_pool_connections_idle").set(idle);
    gauge!("alley_db_pool_connections_max").set(pool.options().get_max_connections() as f64);
}

/// Spawn a task that refreshes the pool gauges every `period`.
pub fn spawn_db_pool_gauge_refresh(
    pool: sqlx::PgPool,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            set_db_pool_gauges(&pool);
        }
    })
}
