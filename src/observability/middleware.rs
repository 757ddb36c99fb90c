use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TraceContextExt;
use std::{sync::Arc, time::Instant};
use tracing::{error, info, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::Metrics;

/// Middleware for request tracing and metrics collection
pub async fn observability_middleware(
    metrics: Arc<Metrics>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let uri = request.uri().to_string();

    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Group by route template so product ids don't explode label cardinality
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_string())
        .unwrap_or_else(|| uri.clone());

    let span_name = format!("{} {}", method, endpoint);
    let span = tracing::info_span!(
        target: "shopcart_rs::http",
        "{}", span_name,
        otel.name = %span_name,
        otel.kind = "server",
        http.method = %method,
        http.route = %endpoint,
        http.url = %uri,
        http.user_agent = %user_agent,
        http.status_code = tracing::field::Empty,
        http.response_time_ms = tracing::field::Empty,
    );

    async {
        metrics.increment_in_flight(&method, &endpoint);

        let trace_id = tracing::Span::current()
            .context()
            .span()
            .span_context()
            .trace_id()
            .to_string();

        info!(trace_id = %trace_id, method = %method, path = %endpoint, "Processing request");

        let response = next.run(request).await;

        let duration = start_time.elapsed();
        let duration_ms = duration.as_millis();
        let status_code = response.status().as_u16();

        tracing::Span::current().record("http.status_code", status_code);
        tracing::Span::current().record("http.response_time_ms", duration_ms);

        let current_span = tracing::Span::current();
        let span_context = current_span.context();
        let otel_span = span_context.span();
        if status_code >= 500 {
            otel_span.set_status(opentelemetry::trace::Status::error("HTTP error"));
        } else {
            otel_span.set_status(opentelemetry::trace::Status::Ok);
        }

        metrics.record_http_request(&method, &endpoint, status_code, duration.as_secs_f64());
        metrics.decrement_in_flight(&method, &endpoint);

        if status_code >= 500 {
            error!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code = status_code,
                duration_ms = duration_ms,
                "Request completed with error"
            );
        } else {
            info!(
                trace_id = %trace_id,
                method = %method,
                path = %endpoint,
                status_code = status_code,
                duration_ms = duration_ms,
                "Request completed"
            );
        }

        response
    }
    .instrument(span)
    .await
}
