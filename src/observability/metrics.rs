use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics for the cart service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Collaborator metrics
    pub collaborator_requests_total: CounterVec,
    pub collaborator_request_duration_seconds: HistogramVec,
    pub persistence_writes_total: CounterVec,

    // Cart metrics
    pub cart_operations_total: CounterVec,
    pub cart_items: Gauge,
}

impl Metrics {
    /// Create a new metrics instance with all required metrics registered
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let collaborator_requests_total = CounterVec::new(
            Opts::new(
                "collaborator_requests_total",
                "Total number of stock and product lookups",
            ),
            &["service", "status"],
        )?;

        let collaborator_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "collaborator_request_duration_seconds",
                "Stock and product lookup duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["service"],
        )?;

        let persistence_writes_total = CounterVec::new(
            Opts::new(
                "persistence_writes_total",
                "Total number of cart snapshot writes",
            ),
            &["status"],
        )?;

        let cart_operations_total = CounterVec::new(
            Opts::new("cart_operations_total", "Total number of cart operations"),
            &["operation", "status"],
        )?;

        let cart_items = Gauge::new("cart_items", "Number of units currently in the cart")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(collaborator_requests_total.clone()))?;
        registry.register(Box::new(collaborator_request_duration_seconds.clone()))?;
        registry.register(Box::new(persistence_writes_total.clone()))?;
        registry.register(Box::new(cart_operations_total.clone()))?;
        registry.register(Box::new(cart_items.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            collaborator_requests_total,
            collaborator_request_duration_seconds,
            persistence_writes_total,
            cart_operations_total,
            cart_items,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    /// Record HTTP request metrics
    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    /// Record a stock or product lookup
    pub fn record_collaborator_request(&self, service: &str, success: bool, duration_seconds: f64) {
        let status = if success { "success" } else { "error" };

        self.collaborator_requests_total
            .with_label_values(&[service, status])
            .inc();

        self.collaborator_request_duration_seconds
            .with_label_values(&[service])
            .observe(duration_seconds);
    }

    pub fn record_persistence_write(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.persistence_writes_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record a cart mutation by its outcome (`success`, `skipped` or an error kind)
    pub fn record_cart_operation(&self, operation: &str, status: &str) {
        self.cart_operations_total
            .with_label_values(&[operation, status])
            .inc();
    }

    pub fn set_cart_items(&self, total_items: u64) {
        self.cart_items.set(total_items as f64);
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
