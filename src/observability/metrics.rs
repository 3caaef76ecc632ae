//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_discovery_total` (counter): gateway routing outcome
//! - `gateway_builds_total` (counter): application builds by outcome
//! - `gateway_build_duration_seconds` (histogram): build latency
//! - `gateway_cache_hits_total` (counter): requests served by a built app
//! - `gateway_cached_applications` (gauge): built applications
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_discovery(outcome: &'static str) {
    counter!("gateway_discovery_total", "outcome" => outcome).increment(1);
}

pub fn record_build(success: bool, start: Instant) {
    let outcome = if success { "ok" } else { "error" };
    counter!("gateway_builds_total", "outcome" => outcome).increment(1);
    histogram!("gateway_build_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_cache_hit() {
    counter!("gateway_cache_hits_total").increment(1);
}

pub fn record_cached_applications(count: usize) {
    gauge!("gateway_cached_applications").set(count as f64);
}
