//! Prometheus metrics for monitoring the scoring service.
//!
//! Recording is always on; values are only exported when
//! [`init_metrics`] installed the Prometheus exporter. Without it the
//! `metrics` macros are no-ops.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and durations by route
//! - **Match Metrics**: Games created and finished, throws recorded and undone

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// `path` is the matched route template, not the raw URI, to keep label
/// cardinality bounded.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Match Metrics
// ============================================================================

/// Increment games created counter.
pub fn games_created_total(mode: &str) {
    metrics::counter!("games_created_total", "mode" => mode.to_string()).increment(1);
}

/// Increment games finished counter.
pub fn games_finished_total() {
    metrics::counter!("games_finished_total").increment(1);
}

/// Increment recorded throws counter.
pub fn throws_recorded_total() {
    metrics::counter!("throws_recorded_total").increment(1);
}

/// Increment undone throws counter.
pub fn throws_undone_total() {
    metrics::counter!("throws_undone_total").increment(1);
}
