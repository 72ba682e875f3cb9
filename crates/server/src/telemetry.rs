use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::errors::ServerError;

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;

/// Environment variable holding the log filter directives
pub const LOG_FILTER_ENV: &str = "GITEA_SQ_BOT_LOG";

const DEFAULT_LOG_FILTER: &str = "info";
const SERVICE_NAME: &str = "gitea-sonarqube-bot";

/// Keeps the trace exporter alive. Pending spans are flushed when dropped.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = e.to_string(), "Failed to flush trace exporter");
            }
        }
    }
}

/// Builds the log filter, falling back to `info` when the directives are
/// missing or cannot be parsed.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Creates a tracer provider exporting spans over OTLP/HTTP in batches.
pub fn tracer_provider(endpoint: &str) -> Result<SdkTracerProvider, ServerError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| {
            ServerError::TelemetryError(format!("Unable to create the OTLP exporter: {}", e))
        })?;

    let resource = Resource::builder().with_service_name(SERVICE_NAME).build();
    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

/// Installs the global tracing subscriber.
///
/// Logs are always written to stdout. Spans are additionally exported when an
/// OTLP endpoint is given.
pub fn init_telemetry(otlp_endpoint: Option<&str>) -> Result<TelemetryGuard, ServerError> {
    let filter = log_filter(std::env::var(LOG_FILTER_ENV).ok().as_deref());

    let provider = otlp_endpoint.map(tracer_provider).transpose()?;
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()
        .map_err(|e| {
            ServerError::TelemetryError(format!("Unable to install the tracing subscriber: {}", e))
        })?;

    Ok(TelemetryGuard { provider })
}
