//! Prometheus metrics for report submission and store access.
//!
//! This module provides metrics for:
//! - Report submissions and resulting status transitions
//! - Classification rejections
//! - Store call latency and failures

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

use crate::status::HealthStatus;
use crate::store::Operation;

// === Metric Name Constants ===

/// Reports accepted for processing.
pub const METRIC_REPORTS_SUBMITTED: &str = "reports_submitted_total";
/// Status updates written, labelled by resulting status.
pub const METRIC_STATUS_UPDATES: &str = "status_updates_total";
/// Reports rejected by the classifier.
pub const METRIC_CLASSIFICATION_ERRORS: &str = "classification_errors_total";
/// Reports whose audit insert failed after the status update landed.
pub const METRIC_REPORT_INSERT_FAILURES: &str = "report_insert_failures_total";
/// End-to-end submission latency.
pub const METRIC_REPORT_SUBMIT_LATENCY: &str = "report_submit_latency_ms";
/// Store call latency, labelled by operation.
pub const METRIC_STORE_LATENCY: &str = "store_request_latency_ms";
/// Store call failures, labelled by operation.
pub const METRIC_STORE_FAILURES: &str = "store_failures_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_REPORT_SUBMIT_LATENCY,
        "Report submission latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_LATENCY,
        "Persistence call latency in milliseconds"
    );

    describe_counter!(METRIC_REPORTS_SUBMITTED, "Total number of reports submitted");
    describe_counter!(
        METRIC_STATUS_UPDATES,
        "Total number of athlete status updates written"
    );
    describe_counter!(
        METRIC_CLASSIFICATION_ERRORS,
        "Total number of reports rejected as malformed"
    );
    describe_counter!(
        METRIC_REPORT_INSERT_FAILURES,
        "Reports lost after their status update was applied"
    );
    describe_counter!(METRIC_STORE_FAILURES, "Total number of failed store calls");

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record store call latency.
pub fn record_store_latency(start: Instant, operation: Operation) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_LATENCY, "operation" => operation.as_ref().to_string())
        .record(latency_ms);
}

/// Increment store failure counter.
pub fn inc_store_failures(operation: Operation) {
    counter!(METRIC_STORE_FAILURES, "operation" => operation.as_ref().to_string()).increment(1);
}

/// Increment reports submitted counter.
pub fn inc_reports_submitted() {
    counter!(METRIC_REPORTS_SUBMITTED).increment(1);
}

/// Increment status updates counter for the resulting status.
pub fn inc_status_updates(status: HealthStatus) {
    counter!(METRIC_STATUS_UPDATES, "status" => status.as_ref().to_string()).increment(1);
}

/// Increment classification errors counter.
pub fn inc_classification_errors() {
    counter!(METRIC_CLASSIFICATION_ERRORS).increment(1);
}

/// Increment report insert failures counter.
pub fn inc_report_insert_failures() {
    counter!(METRIC_REPORT_INSERT_FAILURES).increment(1);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for report submission.
pub fn timer_report_submit() -> LatencyTimer {
    LatencyTimer::new(METRIC_REPORT_SUBMIT_LATENCY)
}
