//! Metrics definitions for the projection layer.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`. Without an installed
//! recorder every call is a no-op.

use metrics::{counter, describe_counter};

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "rows_written_total",
        "Total number of rows submitted to storage, by entity"
    );
    describe_counter!(
        "stale_writes_suppressed_total",
        "Total number of singleton writes ignored by the height guard"
    );
    describe_counter!(
        "codec_errors_total",
        "Total number of proposal content encode/decode failures"
    );
}

/// Record rows submitted in a write call.
///
/// # Arguments
/// * `entity` - Table-level entity name ("proposal", "deposit", ...)
/// * `count` - Number of rows in the call
pub fn record_rows_written(entity: &'static str, count: usize) {
    counter!("rows_written_total", "entity" => entity).increment(count as u64);
}

/// Record a write that the height guard turned into a no-op.
pub fn record_stale_write(entity: &'static str) {
    counter!("stale_writes_suppressed_total", "entity" => entity).increment(1);
}

/// Record a content codec failure.
///
/// # Arguments
/// * `kind` - Failure class ("unsupported_content", "unknown_type", ...)
pub fn record_codec_error(kind: &'static str) {
    counter!("codec_errors_total", "kind" => kind).increment(1);
}
