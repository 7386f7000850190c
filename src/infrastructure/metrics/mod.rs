//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Active realtime gateway sessions
//! - Chat messages persisted, by kind
//! - Object store operations, by outcome

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "l2p";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Open realtime gateway sessions
pub static REALTIME_SESSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "realtime_sessions_active",
            "Number of open realtime gateway sessions",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create REALTIME_SESSIONS_ACTIVE metric")
});

/// Persisted chat messages
pub static CHAT_MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chat_messages_total", "Total number of chat messages stored")
            .namespace(NAMESPACE),
        &["kind"], // "text", "image", "mixed"
    )
    .expect("Failed to create CHAT_MESSAGES_TOTAL metric")
});

/// Object store calls
pub static OBJECT_STORE_OPERATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "object_store_operations_total",
            "Total number of object store operations",
        )
        .namespace(NAMESPACE),
        &["operation", "outcome"],
    )
    .expect("Failed to create OBJECT_STORE_OPERATIONS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(REALTIME_SESSIONS_ACTIVE.clone()))
        .expect("Failed to register REALTIME_SESSIONS_ACTIVE");
    registry
        .register(Box::new(CHAT_MESSAGES_TOTAL.clone()))
        .expect("Failed to register CHAT_MESSAGES_TOTAL");
    registry
        .register(Box::new(OBJECT_STORE_OPERATIONS_TOTAL.clone()))
        .expect("Failed to register OBJECT_STORE_OPERATIONS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Helper to update the realtime session gauge
pub fn set_realtime_sessions(count: usize) {
    REALTIME_SESSIONS_ACTIVE.set(count as i64);
}

/// Helper to count a stored chat message
pub fn record_chat_message(has_text: bool, has_image: bool) {
    let kind = match (has_text, has_image) {
        (true, true) => "mixed",
        (false, true) => "image",
        _ => "text",
    };
    CHAT_MESSAGES_TOTAL.with_label_values(&[kind]).inc();
}

/// Helper to count an object store call
pub fn record_object_store_op(operation: &str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    OBJECT_STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
}
