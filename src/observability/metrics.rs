//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service and load generator metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `demo_requests_total` (counter): invocations by operation
//! - `demo_request_duration_seconds` (histogram): end-to-end invocation time by operation, outcome
//! - `demo_processing_duration_seconds` (histogram): simulated processing delay by operation
//! - `loadgen_calls_total` (counter): scheduler calls by job, outcome
//! - `loadgen_call_duration_seconds` (histogram): scheduler call latency by job
//! - `loadgen_firings_skipped_total` (counter): firings dropped by the in-flight cap
//!
//! # Design Decisions
//! - Labels are low-cardinality only: operation, job, outcome
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    describe_metrics();
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    describe_counter!("demo_requests_total", "Total simulated operation invocations");
    describe_histogram!(
        "demo_request_duration_seconds",
        Unit::Seconds,
        "End-to-end duration of simulated operations"
    );
    describe_histogram!(
        "demo_processing_duration_seconds",
        Unit::Seconds,
        "Injected processing delay of simulated operations"
    );
    describe_counter!("loadgen_calls_total", "Calls issued by the traffic scheduler");
    describe_histogram!(
        "loadgen_call_duration_seconds",
        Unit::Seconds,
        "Latency observed by the traffic scheduler"
    );
    describe_counter!(
        "loadgen_firings_skipped_total",
        "Firings skipped because the job was at its in-flight cap"
    );
}

/// Record one finished operation invocation.
pub fn record_operation(operation: &'static str, outcome: &'static str, duration: Duration) {
    counter!("demo_requests_total", "operation" => operation).increment(1);
    histogram!(
        "demo_request_duration_seconds",
        "operation" => operation,
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());
}

/// Record the simulated delay separately from the request timer.
pub fn record_processing(operation: &'static str, delay: Duration) {
    histogram!("demo_processing_duration_seconds", "operation" => operation).record(delay.as_secs_f64());
}

/// Record one scheduler call.
pub fn record_call(job: &str, success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!("loadgen_calls_total", "job" => job.to_owned(), "outcome" => outcome).increment(1);
    histogram!("loadgen_call_duration_seconds", "job" => job.to_owned()).record(duration.as_secs_f64());
}

/// Record a firing dropped by the per-job in-flight cap.
pub fn record_skipped(job: &str) {
    counter!("loadgen_firings_skipped_total", "job" => job.to_owned()).increment(1);
}
