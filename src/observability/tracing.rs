use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{self, RandomIdGenerator, Sampler},
    Resource,
};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize OpenTelemetry: {0}")]
    OpenTelemetryInit(#[from] opentelemetry::trace::TraceError),
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Settings for the tracing subscriber and the optional OTLP exporter
#[derive(Debug, Clone)]
pub struct TracingSettings<'a> {
    pub service_name: &'a str,
    pub service_version: &'a str,
    /// Traces are only exported when an endpoint is set
    pub otlp_endpoint: Option<&'a str>,
    pub log_level: &'a str,
    pub enable_json_logging: bool,
}

/// Initialize structured logging and, when configured, OpenTelemetry export
pub fn init_observability(settings: &TracingSettings<'_>) -> Result<(), ObservabilityError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(settings.log_level).into());

    let otlp_endpoint = settings.otlp_endpoint.filter(|e| !e.trim().is_empty());
    let otel_layer = match otlp_endpoint {
        Some(endpoint) => {
            let tracer =
                init_opentelemetry_tracer(settings.service_name, settings.service_version, endpoint)?;
            Some(OpenTelemetryLayer::new(tracer))
        }
        None => None,
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer);

    let result = if settings.enable_json_logging {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_target(true)
                    .with_level(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init()
    };
    result.map_err(|e| ObservabilityError::TracingInit(e.to_string()))?;

    info!(
        "Observability initialized for service: {} v{} (otlp export: {})",
        settings.service_name,
        settings.service_version,
        otlp_endpoint.is_some()
    );
    Ok(())
}

fn default_filter(log_level: &str) -> String {
    format!(
        "shopcart_rs={level},shopcart={level},tower_http=info",
        level = log_level
    )
}

/// Extract the current trace ID from the active span context
pub fn get_current_trace_id() -> Option<String> {
    use opentelemetry::trace::TraceContextExt;
    use tracing_opentelemetry::OpenTelemetrySpanExt;

    let current_span = tracing::Span::current();
    let context = current_span.context();
    let span = context.span();
    let span_context = span.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

fn init_opentelemetry_tracer(
    service_name: &str,
    service_version: &str,
    otlp_endpoint: &str,
) -> Result<opentelemetry_sdk::trace::Tracer, ObservabilityError> {
    let resource = Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", service_version.to_string()),
        KeyValue::new("service.namespace", "shopcart"),
        KeyValue::new("telemetry.sdk.name", "opentelemetry"),
        KeyValue::new("telemetry.sdk.language", "rust"),
    ]);

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(otlp_endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::config()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_max_events_per_span(64)
                .with_max_attributes_per_span(16)
                .with_resource(resource),
        )
        .with_batch_config(
            trace::BatchConfig::default()
                .with_max_queue_size(2048)
                .with_max_export_batch_size(512)
                .with_max_export_timeout(Duration::from_secs(30))
                .with_scheduled_delay(Duration::from_millis(500)),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    Ok(tracer)
}

/// Flush pending spans, giving up after five seconds
pub async fn shutdown_observability() {
    info!("Shutting down observability");

    // shutdown_tracer_provider blocks while pending spans are exported
    let shutdown_task = tokio::task::spawn_blocking(global::shutdown_tracer_provider);

    match tokio::time::timeout(Duration::from_secs(5), shutdown_task).await {
        Ok(Ok(())) => info!("Observability shutdown completed successfully"),
        Ok(Err(e)) => warn!("Error during observability shutdown: {}", e),
        Err(_) => warn!("Observability shutdown timed out after 5 seconds"),
    }
}
