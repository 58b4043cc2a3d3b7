//! Telemetry initialization: tracing subscriber with optional OpenTelemetry export.
//!
//! When an OTLP endpoint is configured, a span exporter is added alongside
//! the stdout fmt layer. Otherwise only the fmt layer is installed.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, Result};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over `log_level`. Returns an optional guard that must be
/// held for the lifetime of the application so spans are flushed on shutdown.
pub fn init_tracing(
    log_level: &str,
    otel_endpoint: Option<&str>,
    service_name: &str,
) -> Result<Option<OtelGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(log_level).into());

    match otel_endpoint {
        Some(endpoint) => {
            let guard = init_with_otel(endpoint, service_name, env_filter)?;
            tracing::info!(
                otel_endpoint = endpoint,
                service_name,
                "OpenTelemetry tracing enabled"
            );
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()
                .map_err(|e| AppError::Internal(format!("tracing already initialized: {}", e)))?;
            Ok(None)
        }
    }
}

fn default_filter(log_level: &str) -> String {
    format!(
        "alley_backend={},alley={},tower_http=debug,sqlx::query=info",
        log_level, log_level
    )
}

/// Guard that shuts down the OTel tracer provider on drop,
/// flushing any pending spans.
pub struct OtelGuard {
    provider: opentelemetry_sdk::trace::SdkTracerProvider,
}

impl Drop for OtelGuard {
    fn drop(&mut self) {
        if let Err(e) = self.provider.shutdown() {
            eprintln!("Failed to shutdown OTel tracer provider: {e:?}");
        }
    }
}

fn init_with_otel(endpoint: &str, service_name: &str, env_filter: EnvFilter) -> Result<OtelGuard> {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::{SpanExporter, WithExportConfig};
    use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
    use opentelemetry_sdk::Resource;

    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to create OTLP span exporter: {}", e)))?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", service_name.to_owned()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION").to_owned()),
        ])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .build();

    let tracer = provider.tracer("alley");
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()
        .map_err(|e| AppError::Internal(format!("tracing already initialized: {}", e)))?;

    Ok(OtelGuard { provider })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_uses_log_level() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("alley_backend=warn,alley=warn"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }
}
