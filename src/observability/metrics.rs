//! Metrics collection and exposition.
//!
//! # Metrics
//! - `exerciser_http_requests_total` (counter): requests by method, status
//! - `exerciser_http_request_duration_seconds` (histogram): handler latency
//! - `exerciser_runs_total` (counter): runs by backend, outcome
//! - `exerciser_writes_total` (counter): writes issued per backend
//! - `exerciser_run_duration_seconds` (histogram): run wall-clock time
//! - `exerciser_busy_rejections_total` (counter): requests refused by the guard
//! - `exerciser_active_runs` (gauge): runs currently executing

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::config::BackendKind;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "exerciser_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("exerciser_http_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_run(kind: BackendKind, outcome: &'static str, elapsed: Duration, writes: u64) {
    counter!("exerciser_runs_total", "backend" => kind.as_str(), "outcome" => outcome).increment(1);
    counter!("exerciser_writes_total", "backend" => kind.as_str()).increment(writes);
    histogram!("exerciser_run_duration_seconds", "backend" => kind.as_str())
        .record(elapsed.as_secs_f64());
}

pub fn record_busy_rejection(kind: BackendKind) {
    counter!("exerciser_busy_rejections_total", "backend" => kind.as_str()).increment(1);
}

pub fn record_active_runs(active: u64) {
    gauge!("exerciser_active_runs").set(active as f64);
}
