//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): caller responses by method, status
//! - `relay_upstream_first_byte_seconds` (histogram): dispatch to upstream headers
//! - `relay_errors_total` (counter): mapped failures by kind
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a response head sent to the caller.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    tracing::trace!(
        method,
        status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Response head sent"
    );
}

pub fn record_first_byte(elapsed: Duration) {
    histogram!("relay_upstream_first_byte_seconds").record(elapsed.as_secs_f64());
}

pub fn record_error(kind: &'static str) {
    counter!("relay_errors_total", "kind" => kind).increment(1);
}
