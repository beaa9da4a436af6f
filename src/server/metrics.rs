use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all gateway metrics
const PREFIX: &str = "teamcity_mcp";

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // MCP dispatcher metrics
    pub static ref MCP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_mcp_requests_total"), "Total number of MCP requests"),
        &["method", "status"]
    ).expect("Failed to create mcp_requests_total metric");

    pub static ref MCP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_mcp_request_duration_seconds"),
            "MCP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["method"]
    ).expect("Failed to create mcp_request_duration_seconds metric");

    // Upstream (TeamCity REST) metrics
    pub static ref UPSTREAM_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_requests_total"), "Total number of upstream operations"),
        &["operation", "status"]
    ).expect("Failed to create upstream_requests_total metric");

    pub static ref UPSTREAM_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_upstream_request_duration_seconds"),
            "Upstream operation duration in seconds"
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["operation"]
    ).expect("Failed to create upstream_request_duration_seconds metric");

    // Cache metrics
    pub static ref CACHE_HITS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_cache_hits_total"), "Total cache hits"),
        &["resource_type"]
    ).expect("Failed to create cache_hits_total metric");

    pub static ref CACHE_MISSES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_cache_misses_total"), "Total cache misses"),
        &["resource_type", "reason"]
    ).expect("Failed to create cache_misses_total metric");

    // Transport metrics
    pub static ref SERVER_CONNECTIONS_ACTIVE: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_server_connections_active"), "Active transport connections"),
        &["transport"]
    ).expect("Failed to create server_connections_active metric");

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(MCP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MCP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_HITS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CACHE_MISSES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(SERVER_CONNECTIONS_ACTIVE.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));

    tracing::debug!("Metrics system initialized");
}

fn status_label(success: bool) -> &'static str {
    if success {
        STATUS_SUCCESS
    } else {
        STATUS_ERROR
    }
}

/// Record one dispatched MCP request
pub fn record_mcp_request(method: &str, success: bool, duration: Duration) {
    MCP_REQUESTS_TOTAL
        .with_label_values(&[method, status_label(success)])
        .inc();

    MCP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration.as_secs_f64());
}

/// Record one upstream operation (possibly spanning several REST calls)
pub fn record_upstream_request(operation: &str, success: bool, duration: Duration) {
    UPSTREAM_REQUESTS_TOTAL
        .with_label_values(&[operation, status_label(success)])
        .inc();

    UPSTREAM_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

pub fn record_cache_hit(resource_type: &str) {
    CACHE_HITS_TOTAL.with_label_values(&[resource_type]).inc();
}

/// `reason` is either `absent` or `expired`
pub fn record_cache_miss(resource_type: &str, reason: &str) {
    CACHE_MISSES_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

pub fn connection_opened(transport: &str) {
    SERVER_CONNECTIONS_ACTIVE
        .with_label_values(&[transport])
        .inc();
}

pub fn connection_closed(transport: &str) {
    SERVER_CONNECTIONS_ACTIVE
        .with_label_values(&[transport])
        .dec();
}

/// Record an HTTP request. `path` is the matched route template, never the raw URI.
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
